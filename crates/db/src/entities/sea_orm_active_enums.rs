//! Database enum types.
//!
//! These mirror the Postgres enums created in the initial migration.
//! Conversions to and from the core domain enums live here so the
//! repositories can hand pure types to `tally-core`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account status (`account_status` Postgres enum).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_status")]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountStatus {
    /// Account can send and receive transfers.
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// Administratively frozen.
    #[sea_orm(string_value = "FROZEN")]
    Frozen,
    /// Closed permanently.
    #[sea_orm(string_value = "CLOSED")]
    Closed,
}

/// Transaction status (`transaction_status` Postgres enum).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_status")]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    /// Created inside the unit of work.
    #[sea_orm(string_value = "PENDING")]
    Pending,
    /// Both ledger entries durably written.
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    /// The unit of work could not commit.
    #[sea_orm(string_value = "FAILED")]
    Failed,
    /// Compensated after completion.
    #[sea_orm(string_value = "REVERSED")]
    Reversed,
}

/// Ledger entry type (`entry_type` Postgres enum).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_type")]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
    /// Value leaving the account.
    #[sea_orm(string_value = "DEBIT")]
    Debit,
    /// Value entering the account.
    #[sea_orm(string_value = "CREDIT")]
    Credit,
}

impl From<AccountStatus> for tally_core::account::AccountStatus {
    fn from(status: AccountStatus) -> Self {
        match status {
            AccountStatus::Active => Self::Active,
            AccountStatus::Frozen => Self::Frozen,
            AccountStatus::Closed => Self::Closed,
        }
    }
}

impl From<tally_core::account::AccountStatus> for AccountStatus {
    fn from(status: tally_core::account::AccountStatus) -> Self {
        match status {
            tally_core::account::AccountStatus::Active => Self::Active,
            tally_core::account::AccountStatus::Frozen => Self::Frozen,
            tally_core::account::AccountStatus::Closed => Self::Closed,
        }
    }
}

impl From<TransactionStatus> for tally_core::transfer::TransactionStatus {
    fn from(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Pending => Self::Pending,
            TransactionStatus::Completed => Self::Completed,
            TransactionStatus::Failed => Self::Failed,
            TransactionStatus::Reversed => Self::Reversed,
        }
    }
}

impl From<tally_core::transfer::TransactionStatus> for TransactionStatus {
    fn from(status: tally_core::transfer::TransactionStatus) -> Self {
        match status {
            tally_core::transfer::TransactionStatus::Pending => Self::Pending,
            tally_core::transfer::TransactionStatus::Completed => Self::Completed,
            tally_core::transfer::TransactionStatus::Failed => Self::Failed,
            tally_core::transfer::TransactionStatus::Reversed => Self::Reversed,
        }
    }
}

impl From<EntryType> for tally_core::ledger::EntryType {
    fn from(entry_type: EntryType) -> Self {
        match entry_type {
            EntryType::Debit => Self::Debit,
            EntryType::Credit => Self::Credit,
        }
    }
}

impl From<tally_core::ledger::EntryType> for EntryType {
    fn from(entry_type: tally_core::ledger::EntryType) -> Self {
        match entry_type {
            tally_core::ledger::EntryType::Debit => Self::Debit,
            tally_core::ledger::EntryType::Credit => Self::Credit,
        }
    }
}
