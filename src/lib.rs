//! # Ledger Core
//!
//! A double-entry ledger engine: chart of accounts, fiscal years,
//! journals, balanced journal entries with a draft/posted lifecycle,
//! gapless-enough document numbering, and reporting projections.
//!
//! ## Features
//!
//! - **Double-entry bookkeeping**: every entry validated balanced before it is stored
//! - **Draft/posted lifecycle**: posted entries are immutable; corrections go through reversals
//! - **Document numbering**: pattern-driven serials with per-year or per-month resets
//! - **Fiscal years**: date-to-year resolution and a close that blocks further booking
//! - **Reporting**: trial balance and per-account ledgers recomputed from posted lines
//! - **Storage abstraction**: database-agnostic design with trait-based storage
//!
//! ## Quick Start
//!
//! ```rust
//! use ledger_core::{Ledger, EntryBuilder, Journal, JournalType, MemoryStorage};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ledger_core::LedgerError> {
//! let mut ledger = Ledger::new(MemoryStorage::new());
//! ledger.seed_default_chart().await?;
//! ledger
//!     .create_fiscal_year(
//!         2025,
//!         NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
//!         NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
//!     )
//!     .await?;
//! ledger
//!     .create_journal(Journal::new("GEN", "General", JournalType::General).as_default())
//!     .await?;
//!
//! let input = EntryBuilder::new("GEN", NaiveDate::from_ymd_opt(2025, 2, 1).unwrap())
//!     .description("Cash sale")
//!     .debit("1000", BigDecimal::from(500))
//!     .credit("4000", BigDecimal::from(500))
//!     .build()?;
//! let entry = ledger.create_entry(input).await?;
//! ledger.post_entry(entry.id, None).await?;
//! # Ok(())
//! # }
//! ```

pub mod ledger;
pub mod numbering;
pub mod reports;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use ledger::*;
pub use numbering::{NumberContext, NumberingScheme, NumberingService, ResetPolicy};
pub use reports::{AccountLedger, ReportScope, Reports, TrialBalance};
pub use traits::*;
pub use types::*;
pub use utils::memory_storage::MemoryStorage;

// Re-export entry line patterns for convenience
pub use ledger::entry::patterns;
