//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. Write access is deliberately narrow: only
//! `TransferCoordinator` writes ledger entries and transaction status,
//! and only `AccountRepository` writes account status.

pub mod account;
pub mod audit;
pub mod ledger;
pub mod transaction;
pub mod transfer;
pub mod user;

pub use account::{AccountError, AccountRepository};
pub use audit::{AuditEvent, AuditLogRepository};
pub use ledger::{LedgerError, LedgerRepository};
pub use transaction::{HistoryPage, TransactionRepository};
pub use transfer::{TransactionWithEntries, TransferCoordinator, TransferOutcome};
pub use user::{CreateUserInput, UserError, UserRepository};
