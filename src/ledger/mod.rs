//! Ledger module: chart of accounts, fiscal years, journals, and the
//! journal entry engine

pub mod account;
pub mod core;
pub mod entry;
pub mod fiscal_year;
pub mod journal;
pub mod opening;

pub use account::*;
pub use entry::*;
pub use fiscal_year::*;
pub use journal::*;
pub use opening::*;
pub use self::core::*;
