//! Transaction history read paths.
//!
//! Filter, sort, and export-row types for the read-only projection over
//! the transaction log. These types never touch the atomic core; they
//! only describe how committed transactions are queried and rendered.

pub mod export;
pub mod filter;

pub use export::ExportRow;
pub use filter::{Direction, HistoryFilter, SortField, SortOrder};
