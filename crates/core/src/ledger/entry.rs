//! Ledger entry domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, LedgerEntryId, TransactionId};

/// Entry type: either Debit or Credit.
///
/// A debit moves value out of an account, a credit moves value in. Every
/// completed transfer produces exactly one of each, of equal amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
    /// Value leaving the account.
    Debit,
    /// Value entering the account.
    Credit,
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debit => write!(f, "DEBIT"),
            Self::Credit => write!(f, "CREDIT"),
        }
    }
}

/// An immutable record of one debit or credit movement against one account.
///
/// Entries are only ever created inside the transfer unit of work; there
/// is no update or delete operation anywhere in the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry ID.
    pub id: LedgerEntryId,
    /// The account this entry moves value against.
    pub account_id: AccountId,
    /// The transaction this entry belongs to.
    pub transaction_id: TransactionId,
    /// The amount moved (always positive; direction comes from `entry_type`).
    pub amount: Decimal,
    /// Debit or credit.
    pub entry_type: EntryType,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Builds the double-entry pair for a transfer: one DEBIT on the
    /// source account and one CREDIT on the destination, both of the
    /// same amount and referencing the same transaction.
    #[must_use]
    pub fn double_entry(
        transaction_id: TransactionId,
        from_account: AccountId,
        to_account: AccountId,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> (Self, Self) {
        let debit = Self {
            id: LedgerEntryId::new(),
            account_id: from_account,
            transaction_id,
            amount,
            entry_type: EntryType::Debit,
            created_at: at,
        };
        let credit = Self {
            id: LedgerEntryId::new(),
            account_id: to_account,
            transaction_id,
            amount,
            entry_type: EntryType::Credit,
            created_at: at,
        };
        (debit, credit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_double_entry_pairing() {
        let txn_id = TransactionId::new();
        let from = AccountId::new();
        let to = AccountId::new();
        let now = Utc::now();

        let (debit, credit) = LedgerEntry::double_entry(txn_id, from, to, dec!(500), now);

        assert_eq!(debit.entry_type, EntryType::Debit);
        assert_eq!(debit.account_id, from);
        assert_eq!(credit.entry_type, EntryType::Credit);
        assert_eq!(credit.account_id, to);

        // Both legs reference the same transaction with equal amounts.
        assert_eq!(debit.transaction_id, txn_id);
        assert_eq!(credit.transaction_id, txn_id);
        assert_eq!(debit.amount, credit.amount);
        assert_eq!(debit.amount, dec!(500));
    }

    #[test]
    fn test_double_entry_distinct_ids() {
        let (debit, credit) = LedgerEntry::double_entry(
            TransactionId::new(),
            AccountId::new(),
            AccountId::new(),
            dec!(1),
            Utc::now(),
        );
        assert_ne!(debit.id, credit.id);
    }

    #[test]
    fn test_entry_type_display() {
        assert_eq!(EntryType::Debit.to_string(), "DEBIT");
        assert_eq!(EntryType::Credit.to_string(), "CREDIT");
    }
}
