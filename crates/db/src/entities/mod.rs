//! `SeaORM` entity definitions.

pub mod accounts;
pub mod audit_logs;
pub mod ledger_entries;
pub mod sea_orm_active_enums;
pub mod transactions;
pub mod users;
