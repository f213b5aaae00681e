//! Transfer validation pipeline.
//!
//! These checks run in the order given in the coordinator and each one
//! short-circuits with no persisted mutation:
//! structural validation, then (after storage lookups) account
//! eligibility, then balance sufficiency. All comparisons are exact
//! `Decimal` arithmetic.

use rust_decimal::Decimal;

use super::error::TransferError;
use super::types::TransferRequest;
use crate::account::AccountStatus;
use tally_shared::types::AccountId;

/// Structural validation of a transfer request.
///
/// # Errors
///
/// Returns `TransferError::Validation` if the idempotency key is empty,
/// the amount is not positive, or source and destination are the same
/// account.
pub fn validate_request(request: &TransferRequest) -> Result<(), TransferError> {
    if request.idempotency_key.trim().is_empty() {
        return Err(TransferError::Validation(
            "idempotency key must not be empty".to_string(),
        ));
    }
    if request.amount <= Decimal::ZERO {
        return Err(TransferError::Validation(
            "amount must be positive".to_string(),
        ));
    }
    if request.from_account == request.to_account {
        return Err(TransferError::Validation(
            "source and destination accounts must differ".to_string(),
        ));
    }
    Ok(())
}

/// Checks that both parties to a transfer are active.
///
/// # Errors
///
/// Returns `TransferError::InactiveAccount` naming the first ineligible
/// account and its current status.
pub fn validate_eligibility(
    from: (AccountId, AccountStatus),
    to: (AccountId, AccountStatus),
) -> Result<(), TransferError> {
    for (account, status) in [from, to] {
        if !status.is_transactable() {
            return Err(TransferError::InactiveAccount { account, status });
        }
    }
    Ok(())
}

/// Checks that the source balance covers the requested amount.
///
/// # Errors
///
/// Returns `TransferError::InsufficientFunds` carrying the current
/// balance and the requested amount.
pub fn validate_sufficiency(balance: Decimal, requested: Decimal) -> Result<(), TransferError> {
    if balance < requested {
        return Err(TransferError::InsufficientFunds { balance, requested });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn request(amount: Decimal, key: &str) -> TransferRequest {
        TransferRequest {
            from_account: AccountId::new(),
            to_account: AccountId::new(),
            amount,
            idempotency_key: key.to_string(),
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(validate_request(&request(dec!(500), "k1")).is_ok());
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-1))]
    #[case(dec!(-0.01))]
    fn test_non_positive_amount_rejected(#[case] amount: Decimal) {
        let result = validate_request(&request(amount, "k1"));
        assert!(matches!(result, Err(TransferError::Validation(_))));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_empty_key_rejected(#[case] key: &str) {
        let result = validate_request(&request(dec!(100), key));
        assert!(matches!(result, Err(TransferError::Validation(_))));
    }

    #[test]
    fn test_self_transfer_rejected() {
        let account = AccountId::new();
        let req = TransferRequest {
            from_account: account,
            to_account: account,
            amount: dec!(100),
            idempotency_key: "k1".to_string(),
        };
        assert!(matches!(
            validate_request(&req),
            Err(TransferError::Validation(_))
        ));
    }

    #[test]
    fn test_eligibility_both_active() {
        let from = (AccountId::new(), AccountStatus::Active);
        let to = (AccountId::new(), AccountStatus::Active);
        assert!(validate_eligibility(from, to).is_ok());
    }

    #[rstest]
    #[case(AccountStatus::Frozen)]
    #[case(AccountStatus::Closed)]
    fn test_inactive_source_rejected(#[case] status: AccountStatus) {
        let from_id = AccountId::new();
        let result = validate_eligibility(
            (from_id, status),
            (AccountId::new(), AccountStatus::Active),
        );
        assert_eq!(
            result,
            Err(TransferError::InactiveAccount {
                account: from_id,
                status
            })
        );
    }

    #[rstest]
    #[case(AccountStatus::Frozen)]
    #[case(AccountStatus::Closed)]
    fn test_inactive_destination_rejected(#[case] status: AccountStatus) {
        let to_id = AccountId::new();
        let result = validate_eligibility(
            (AccountId::new(), AccountStatus::Active),
            (to_id, status),
        );
        assert_eq!(
            result,
            Err(TransferError::InactiveAccount {
                account: to_id,
                status
            })
        );
    }

    #[test]
    fn test_sufficiency_exact_balance_allowed() {
        assert!(validate_sufficiency(dec!(100), dec!(100)).is_ok());
    }

    #[test]
    fn test_sufficiency_shortfall_rejected() {
        let result = validate_sufficiency(dec!(100), dec!(150));
        assert_eq!(
            result,
            Err(TransferError::InsufficientFunds {
                balance: dec!(100),
                requested: dec!(150),
            })
        );
    }

    #[test]
    fn test_sufficiency_is_decimal_exact() {
        // A float comparison would wobble here; Decimal must not.
        assert!(validate_sufficiency(dec!(0.30), dec!(0.10) + dec!(0.20)).is_ok());
        assert!(validate_sufficiency(dec!(0.29999), dec!(0.30)).is_err());
    }

    // Scenario-level checks mirroring the coordinator's decision sequence.
    mod scenarios {
        use super::*;
        use crate::ledger::{EntryType, LedgerEntry, balance};
        use crate::transfer::types::{
            IdempotencyDecision, TransactionStatus, resolve_idempotency,
        };
        use chrono::Utc;
        use tally_shared::types::TransactionId;

        fn entry(account: AccountId, entry_type: EntryType, amount: Decimal) -> LedgerEntry {
            LedgerEntry {
                id: tally_shared::types::LedgerEntryId::new(),
                account_id: account,
                transaction_id: TransactionId::new(),
                amount,
                entry_type,
                created_at: Utc::now(),
            }
        }

        /// Transfer 500 out of a 100000 balance: every gate passes and the
        /// double-entry pair leaves A=99500, B=500.
        #[test]
        fn happy_path_transfer() {
            let from = AccountId::new();
            let to = AccountId::new();
            let req = TransferRequest {
                from_account: from,
                to_account: to,
                amount: dec!(500),
                idempotency_key: "k1".to_string(),
            };

            let mut ledger = vec![entry(from, EntryType::Credit, dec!(100000))];

            validate_request(&req).unwrap();
            assert_eq!(resolve_idempotency(None), IdempotencyDecision::Proceed);
            validate_eligibility(
                (from, AccountStatus::Active),
                (to, AccountStatus::Active),
            )
            .unwrap();

            let from_balance = balance(ledger.iter().filter(|e| e.account_id == from));
            validate_sufficiency(from_balance, req.amount).unwrap();

            let (debit, credit) =
                LedgerEntry::double_entry(TransactionId::new(), from, to, req.amount, Utc::now());
            ledger.push(debit);
            ledger.push(credit);

            assert_eq!(
                balance(ledger.iter().filter(|e| e.account_id == from)),
                dec!(99500)
            );
            assert_eq!(
                balance(ledger.iter().filter(|e| e.account_id == to)),
                dec!(500)
            );
        }

        /// Replaying a completed key short-circuits before any write.
        #[test]
        fn replayed_key_short_circuits() {
            assert_eq!(
                resolve_idempotency(Some(TransactionStatus::Completed)),
                IdempotencyDecision::AlreadyCompleted
            );
        }

        /// Insufficient funds: the error carries the pre-check state and
        /// the ledger is untouched.
        #[test]
        fn insufficient_funds_reports_balance() {
            let from = AccountId::new();
            let ledger = vec![entry(from, EntryType::Credit, dec!(100))];
            let from_balance = balance(&ledger);

            let result = validate_sufficiency(from_balance, dec!(150));
            assert_eq!(
                result,
                Err(TransferError::InsufficientFunds {
                    balance: dec!(100),
                    requested: dec!(150),
                })
            );
            assert_eq!(balance(&ledger), dec!(100));
        }

        /// A frozen party on either side blocks the transfer.
        #[test]
        fn frozen_account_blocks_both_directions() {
            let frozen = AccountId::new();
            let active = AccountId::new();

            assert!(matches!(
                validate_eligibility(
                    (frozen, AccountStatus::Frozen),
                    (active, AccountStatus::Active)
                ),
                Err(TransferError::InactiveAccount { .. })
            ));
            assert!(matches!(
                validate_eligibility(
                    (active, AccountStatus::Active),
                    (frozen, AccountStatus::Frozen)
                ),
                Err(TransferError::InactiveAccount { .. })
            ));
        }

        /// Two serialized 60-unit transfers against a 100 balance: the
        /// first passes, the second fails its sufficiency check against
        /// the post-debit balance. This is the property the coordinator's
        /// row locks guarantee.
        #[test]
        fn serialized_overdraw_attempt_fails() {
            let from = AccountId::new();
            let mut ledger = vec![entry(from, EntryType::Credit, dec!(100))];

            let first = balance(ledger.iter().filter(|e| e.account_id == from));
            validate_sufficiency(first, dec!(60)).unwrap();
            let (debit, credit) = LedgerEntry::double_entry(
                TransactionId::new(),
                from,
                AccountId::new(),
                dec!(60),
                Utc::now(),
            );
            ledger.push(debit);
            ledger.push(credit);

            let second = balance(ledger.iter().filter(|e| e.account_id == from));
            assert_eq!(second, dec!(40));
            assert_eq!(
                validate_sufficiency(second, dec!(60)),
                Err(TransferError::InsufficientFunds {
                    balance: dec!(40),
                    requested: dec!(60),
                })
            );
        }
    }
}
