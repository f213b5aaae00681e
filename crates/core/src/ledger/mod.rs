//! Append-only ledger logic.
//!
//! The ledger is the sole source of truth for account balances:
//! - Ledger entries (debits and credits), write-once by construction
//! - Double-entry pairing for transfers
//! - Balance derivation by folding an account's entries

pub mod balance;
pub mod entry;

pub use balance::{AccountBalance, balance, signed_amount};
pub use entry::{EntryType, LedgerEntry};
