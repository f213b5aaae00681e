//! Derived account balances.
//!
//! No balance is ever stored on an account. The balance of an account is
//! the signed sum over its full ledger history: credits add, debits
//! subtract. All arithmetic is exact `Decimal`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;

use super::entry::{EntryType, LedgerEntry};

/// Returns the signed contribution of an entry to its account's balance.
#[must_use]
pub fn signed_amount(entry_type: EntryType, amount: Decimal) -> Decimal {
    match entry_type {
        EntryType::Credit => amount,
        EntryType::Debit => -amount,
    }
}

/// Folds an account's ledger entries into its balance.
///
/// `balance = Σ credits − Σ debits`. The fold is order-independent.
#[must_use]
pub fn balance<'a, I>(entries: I) -> Decimal
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    entries
        .into_iter()
        .map(|e| signed_amount(e.entry_type, e.amount))
        .sum()
}

/// Account balance summary with debit/credit totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: AccountId,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
    /// Net balance (credits minus debits).
    pub balance: Decimal,
}

impl AccountBalance {
    /// Creates an empty balance summary.
    #[must_use]
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            debit_total: Decimal::ZERO,
            credit_total: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }

    /// Folds one entry into the summary.
    pub fn apply(&mut self, entry_type: EntryType, amount: Decimal) {
        match entry_type {
            EntryType::Debit => self.debit_total += amount,
            EntryType::Credit => self.credit_total += amount,
        }
        self.balance = self.credit_total - self.debit_total;
    }

    /// Builds a summary from an account's entries.
    #[must_use]
    pub fn from_entries<'a, I>(account_id: AccountId, entries: I) -> Self
    where
        I: IntoIterator<Item = &'a LedgerEntry>,
    {
        let mut summary = Self::new(account_id);
        for entry in entries {
            summary.apply(entry.entry_type, entry.amount);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use tally_shared::types::TransactionId;

    fn entry(entry_type: EntryType, amount: Decimal) -> LedgerEntry {
        LedgerEntry {
            id: tally_shared::types::LedgerEntryId::new(),
            account_id: AccountId::new(),
            transaction_id: TransactionId::new(),
            amount,
            entry_type,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_signed_amount() {
        assert_eq!(signed_amount(EntryType::Credit, dec!(100)), dec!(100));
        assert_eq!(signed_amount(EntryType::Debit, dec!(100)), dec!(-100));
    }

    #[test]
    fn test_empty_history_is_zero() {
        let entries: Vec<LedgerEntry> = Vec::new();
        assert_eq!(balance(&entries), Decimal::ZERO);
    }

    #[test]
    fn test_balance_fold() {
        let entries = vec![
            entry(EntryType::Credit, dec!(100000)),
            entry(EntryType::Debit, dec!(500)),
        ];
        assert_eq!(balance(&entries), dec!(99500));
    }

    #[test]
    fn test_summary_totals() {
        let account_id = AccountId::new();
        let entries = vec![
            entry(EntryType::Credit, dec!(100)),
            entry(EntryType::Credit, dec!(50)),
            entry(EntryType::Debit, dec!(30)),
        ];
        let summary = AccountBalance::from_entries(account_id, &entries);
        assert_eq!(summary.credit_total, dec!(150));
        assert_eq!(summary.debit_total, dec!(30));
        assert_eq!(summary.balance, dec!(120));
    }

    /// Strategy for generating positive entry amounts
    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn entry_strategy() -> impl Strategy<Value = (EntryType, Decimal)> {
        (
            prop_oneof![Just(EntryType::Debit), Just(EntryType::Credit)],
            amount_strategy(),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The fold equals the signed sum computed independently.
        #[test]
        fn prop_balance_equals_signed_sum(
            specs in prop::collection::vec(entry_strategy(), 0..50),
        ) {
            let entries: Vec<LedgerEntry> =
                specs.iter().map(|&(t, a)| entry(t, a)).collect();

            let expected: Decimal = specs
                .iter()
                .map(|&(t, a)| signed_amount(t, a))
                .sum();

            prop_assert_eq!(balance(&entries), expected);
        }

        /// The fold is independent of entry order.
        #[test]
        fn prop_balance_order_independent(
            specs in prop::collection::vec(entry_strategy(), 0..30),
        ) {
            let entries: Vec<LedgerEntry> =
                specs.iter().map(|&(t, a)| entry(t, a)).collect();
            let mut reversed = entries.clone();
            reversed.reverse();

            prop_assert_eq!(balance(&entries), balance(&reversed));
        }

        /// A matched debit/credit pair nets to zero across the two accounts.
        #[test]
        fn prop_double_entry_nets_to_zero(amount in amount_strategy()) {
            let (debit, credit) = LedgerEntry::double_entry(
                TransactionId::new(),
                AccountId::new(),
                AccountId::new(),
                amount,
                Utc::now(),
            );
            let net = signed_amount(debit.entry_type, debit.amount)
                + signed_amount(credit.entry_type, credit.amount);
            prop_assert_eq!(net, Decimal::ZERO);
        }

        /// Summary invariant: balance == credit_total - debit_total.
        #[test]
        fn prop_summary_consistent(
            specs in prop::collection::vec(entry_strategy(), 0..50),
        ) {
            let entries: Vec<LedgerEntry> =
                specs.iter().map(|&(t, a)| entry(t, a)).collect();
            let summary = AccountBalance::from_entries(AccountId::new(), &entries);

            prop_assert_eq!(summary.balance, summary.credit_total - summary.debit_total);
            prop_assert_eq!(summary.balance, balance(&entries));
        }
    }
}
