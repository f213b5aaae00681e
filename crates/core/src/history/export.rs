//! Export row shaping.
//!
//! One `ExportRow` per transaction, mirroring the transaction's public
//! fields plus the direction relative to the requester. Rows are
//! serialized one at a time by the export stream; nothing here buffers
//! a result set.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tally_shared::types::{AccountId, TransactionId};

use super::filter::Direction;
use crate::transfer::TransactionStatus;

/// One row of a transaction history export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
    /// Transaction ID.
    pub id: TransactionId,
    /// Source account.
    pub from_account: AccountId,
    /// Destination account.
    pub to_account: AccountId,
    /// Transfer amount.
    pub amount: Decimal,
    /// Direction relative to the exporting user.
    pub direction: Direction,
    /// Transaction status.
    pub status: TransactionStatus,
    /// Creation timestamp (RFC 3339).
    pub created_at: DateTime<Utc>,
    /// Last update timestamp (RFC 3339).
    pub updated_at: DateTime<Utc>,
}

impl ExportRow {
    /// Determines the direction of a transaction relative to a set of
    /// owned accounts: transfers out of an owned account are outgoing,
    /// everything else the user can see is incoming.
    #[must_use]
    pub fn direction_for(from_account: AccountId, owned: &[AccountId]) -> Direction {
        if owned.contains(&from_account) {
            Direction::Outgoing
        } else {
            Direction::Incoming
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_direction_for_owned_source() {
        let mine = AccountId::new();
        let theirs = AccountId::new();
        assert_eq!(
            ExportRow::direction_for(mine, &[mine]),
            Direction::Outgoing
        );
        assert_eq!(
            ExportRow::direction_for(theirs, &[mine]),
            Direction::Incoming
        );
    }

    #[test]
    fn test_row_serializes_public_fields() {
        let row = ExportRow {
            id: TransactionId::new(),
            from_account: AccountId::new(),
            to_account: AccountId::new(),
            amount: dec!(500),
            direction: Direction::Outgoing,
            status: TransactionStatus::Completed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["amount"], "500");
        assert_eq!(json["direction"], "outgoing");
        assert_eq!(json["status"], "COMPLETED");
        assert!(json.get("idempotency_key").is_none());
    }
}
