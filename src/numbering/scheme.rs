//! Numbering scheme configuration per entity type

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::{LedgerError, LedgerResult};

/// When the sequence counter starts over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetPolicy {
    /// One global sequence for the lifetime of the scheme
    Never,
    /// A fresh sequence per calendar year
    Year,
    /// A fresh sequence per calendar month
    Month,
}

impl ResetPolicy {
    /// Period string grouping the allocator counters: empty for `Never`,
    /// `"2025"` for `Year`, `"2025-03"` for `Month`.
    pub fn period_for(&self, date: NaiveDate) -> String {
        match self {
            ResetPolicy::Never => String::new(),
            ResetPolicy::Year => format!("{}", date.year()),
            ResetPolicy::Month => format!("{}-{:02}", date.year(), date.month()),
        }
    }
}

/// Numbering configuration for one (entity label, field name) pair.
///
/// Example row: entity_label `"accounting.Invoice"`, field_name `"number"`,
/// pattern `"INV-{year}-{seq:04d}"`, reset `Year`, start 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingScheme {
    /// Entity type label owned by the caller, e.g. "accounting.Invoice"
    pub entity_label: String,
    /// Field the number is written to, usually "number"
    pub field_name: String,
    /// Render pattern; must contain the `{seq}` placeholder
    pub pattern: String,
    pub reset: ResetPolicy,
    /// First value a fresh sequence hands out
    pub start: u64,
    pub is_active: bool,
}

impl NumberingScheme {
    pub fn new(
        entity_label: impl Into<String>,
        pattern: impl Into<String>,
        reset: ResetPolicy,
    ) -> Self {
        Self {
            entity_label: entity_label.into(),
            field_name: "number".to_string(),
            pattern: pattern.into(),
            reset,
            start: 1,
            is_active: true,
        }
    }

    pub fn with_start(mut self, start: u64) -> Self {
        self.start = start;
        self
    }

    /// Reject patterns without the mandatory `{seq}` placeholder. Checked
    /// when a scheme is saved, not at generation time.
    pub fn validate(&self) -> LedgerResult<()> {
        if !self.pattern.contains("{seq") {
            return Err(LedgerError::InvalidPattern(format!(
                "pattern '{}' is missing the {{seq}} placeholder",
                self.pattern
            )));
        }
        Ok(())
    }
}

/// Fallback scheme table consulted when no scheme row exists for an entity.
///
/// Resolution never writes storage; the defaults live here so that a fresh
/// installation can number documents before anyone configures anything.
pub fn default_scheme(entity_label: &str, field_name: &str) -> NumberingScheme {
    let mut scheme = match entity_label {
        "accounting.Invoice" => {
            NumberingScheme::new(entity_label, "INV-{year}-{seq:04d}", ResetPolicy::Year)
        }
        "ledger.JournalEntry" => {
            NumberingScheme::new(entity_label, "{prefix}-{year}-{seq:04d}", ResetPolicy::Year)
        }
        _ => NumberingScheme::new(entity_label, "{seq:06d}", ResetPolicy::Never),
    };
    scheme.field_name = field_name.to_string();
    scheme
}
