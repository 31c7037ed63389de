//! Journal registry: named ledgers and default-journal resolution

use serde::{Deserialize, Serialize};

use crate::traits::LedgerStorage;
use crate::types::*;

/// Explicit journal overrides, passed in at construction.
///
/// Each field names the journal code to use for a purpose; unset fields fall
/// back to the type-preference scan. There is no stored settings singleton:
/// resolution reads this struct and a hard-coded preference table only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSettings {
    pub default_manual_journal: Option<String>,
    pub sales_invoice_journal: Option<String>,
    pub purchase_journal: Option<String>,
    pub customer_payment_journal: Option<String>,
    pub opening_balance_journal: Option<String>,
}

impl LedgerSettings {
    fn override_for(&self, purpose: JournalPurpose) -> Option<&str> {
        match purpose {
            JournalPurpose::ManualEntry => self.default_manual_journal.as_deref(),
            JournalPurpose::SalesInvoice => self.sales_invoice_journal.as_deref(),
            JournalPurpose::Purchase => self.purchase_journal.as_deref(),
            JournalPurpose::CustomerPayment => self.customer_payment_journal.as_deref(),
            JournalPurpose::OpeningBalance => self
                .opening_balance_journal
                .as_deref()
                .or(self.default_manual_journal.as_deref()),
        }
    }
}

/// Journal types tried in order for each purpose
fn preferred_types(purpose: JournalPurpose) -> &'static [JournalType] {
    match purpose {
        JournalPurpose::ManualEntry | JournalPurpose::OpeningBalance => &[JournalType::General],
        JournalPurpose::SalesInvoice => &[JournalType::Sales],
        JournalPurpose::Purchase => &[JournalType::Purchase],
        // Customer payments land in cash first, bank when no cash journal exists
        JournalPurpose::CustomerPayment => &[JournalType::Cash, JournalType::Bank],
    }
}

/// Registry of named ledgers
pub struct JournalRegistry<S: LedgerStorage> {
    storage: S,
    settings: LedgerSettings,
}

impl<S: LedgerStorage> JournalRegistry<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            settings: LedgerSettings::default(),
        }
    }

    pub fn with_settings(storage: S, settings: LedgerSettings) -> Self {
        Self { storage, settings }
    }

    /// Create a new journal
    pub async fn create(&mut self, journal: Journal) -> LedgerResult<Journal> {
        if journal.code.trim().is_empty() {
            return Err(LedgerError::Validation(
                "journal code cannot be empty".to_string(),
            ));
        }
        if self.storage.get_journal(&journal.code).await?.is_some() {
            return Err(LedgerError::Validation(format!(
                "journal with code '{}' already exists",
                journal.code
            )));
        }
        self.storage.save_journal(&journal).await?;
        Ok(journal)
    }

    pub async fn get(&self, code: &str) -> LedgerResult<Option<Journal>> {
        self.storage.get_journal(code).await
    }

    pub async fn get_required(&self, code: &str) -> LedgerResult<Journal> {
        self.storage
            .get_journal(code)
            .await?
            .ok_or_else(|| LedgerError::JournalNotFound(code.to_string()))
    }

    pub async fn list(&self, journal_type: Option<JournalType>) -> LedgerResult<Vec<Journal>> {
        self.storage.list_journals(journal_type).await
    }

    pub async fn update(&mut self, journal: &Journal) -> LedgerResult<()> {
        self.get_required(&journal.code).await?;
        self.storage.update_journal(journal).await
    }

    /// Resolve the default journal for a transaction class.
    ///
    /// Order: the explicit settings override when it names an existing
    /// active journal; then each preferred type in turn, taking the
    /// `is_default` journal of that type or failing that any active one;
    /// then any active journal at all. `None` means no active journal
    /// exists, which callers treat as a setup error.
    pub async fn default_for(&self, purpose: JournalPurpose) -> LedgerResult<Option<Journal>> {
        if let Some(code) = self.settings.override_for(purpose) {
            if let Some(journal) = self.storage.get_journal(code).await? {
                if journal.is_active {
                    return Ok(Some(journal));
                }
            }
        }

        for journal_type in preferred_types(purpose) {
            let of_type: Vec<Journal> = self
                .storage
                .list_journals(Some(*journal_type))
                .await?
                .into_iter()
                .filter(|j| j.is_active)
                .collect();

            if let Some(journal) = of_type
                .iter()
                .find(|j| j.is_default)
                .or_else(|| of_type.first())
            {
                return Ok(Some(journal.clone()));
            }
        }

        Ok(self
            .storage
            .list_journals(None)
            .await?
            .into_iter()
            .find(|j| j.is_active))
    }
}
