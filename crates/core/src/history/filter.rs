//! History filtering and sorting.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::transfer::TransactionStatus;

/// Direction of a transaction relative to the requesting user's accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Value arriving at one of the requester's accounts (a credit).
    Incoming,
    /// Value leaving one of the requester's accounts (a debit).
    Outgoing,
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "incoming" | "credit" => Ok(Self::Incoming),
            "outgoing" | "debit" => Ok(Self::Outgoing),
            _ => Err(format!("unknown direction: {s}")),
        }
    }
}

/// Sortable fields, as a closed allow-list.
///
/// Anything outside this set is rejected at parse time so callers can
/// never sort by an unindexed or private column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Sort by creation timestamp (the default).
    #[default]
    CreatedAt,
    /// Sort by last update timestamp.
    UpdatedAt,
    /// Sort by amount.
    Amount,
    /// Sort by status.
    Status,
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" | "createdAt" => Ok(Self::CreatedAt),
            "updated_at" | "updatedAt" => Ok(Self::UpdatedAt),
            "amount" => Ok(Self::Amount),
            "status" => Ok(Self::Status),
            _ => Err(format!("field '{s}' is not sortable")),
        }
    }
}

/// Sort order, defaulting to newest-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending (the default).
    #[default]
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("unknown sort order: {s}")),
        }
    }
}

/// Filter over a user's transaction history.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// Include transactions created at or after this instant.
    pub date_from: Option<DateTime<Utc>>,
    /// Include transactions created at or before this instant.
    pub date_to: Option<DateTime<Utc>>,
    /// Minimum amount (inclusive).
    pub min_amount: Option<Decimal>,
    /// Maximum amount (inclusive).
    pub max_amount: Option<Decimal>,
    /// Direction relative to the requester's accounts.
    pub direction: Option<Direction>,
    /// Filter by transaction status.
    pub status: Option<TransactionStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case("created_at", SortField::CreatedAt)]
    #[case("createdAt", SortField::CreatedAt)]
    #[case("updated_at", SortField::UpdatedAt)]
    #[case("updatedAt", SortField::UpdatedAt)]
    #[case("amount", SortField::Amount)]
    #[case("status", SortField::Status)]
    fn test_sort_field_allow_list(#[case] input: &str, #[case] expected: SortField) {
        assert_eq!(SortField::from_str(input).unwrap(), expected);
    }

    #[rstest]
    #[case("idempotency_key")]
    #[case("id")]
    #[case("from_account")]
    #[case("")]
    fn test_sort_field_rejects_everything_else(#[case] input: &str) {
        assert!(SortField::from_str(input).is_err());
    }

    #[test]
    fn test_sort_defaults_newest_first() {
        assert_eq!(SortField::default(), SortField::CreatedAt);
        assert_eq!(SortOrder::default(), SortOrder::Desc);
    }

    #[rstest]
    #[case("incoming", Direction::Incoming)]
    #[case("credit", Direction::Incoming)]
    #[case("outgoing", Direction::Outgoing)]
    #[case("debit", Direction::Outgoing)]
    #[case("DEBIT", Direction::Outgoing)]
    fn test_direction_parsing(#[case] input: &str, #[case] expected: Direction) {
        assert_eq!(Direction::from_str(input).unwrap(), expected);
    }

    #[test]
    fn test_direction_rejects_unknown() {
        assert!(Direction::from_str("sideways").is_err());
    }

    #[test]
    fn test_empty_filter_is_default() {
        let filter = HistoryFilter::default();
        assert!(filter.date_from.is_none());
        assert!(filter.direction.is_none());
        assert!(filter.status.is_none());
    }
}
