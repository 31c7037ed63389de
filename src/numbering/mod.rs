//! Document numbering: pattern-driven, sequence-backed serial generation
//!
//! Any entity needing a human-readable serial (journal entries, invoices,
//! payments) resolves a [`NumberingScheme`] for its entity label, draws the
//! next integer from the persistent sequence allocator, and renders the
//! scheme pattern. Uniqueness under concurrent callers rests on the
//! allocator contract in [`crate::traits::LedgerStorage::next_sequence`].

pub mod pattern;
pub mod scheme;
pub mod service;

pub use pattern::*;
pub use scheme::*;
pub use service::*;
