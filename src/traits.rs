//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::numbering::NumberingScheme;
use crate::types::*;

/// Filter for entry queries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFilter {
    pub fiscal_year: Option<i32>,
    pub journal: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub posted: Option<bool>,
}

impl EntryFilter {
    /// Unposted entries within a fiscal year, used as the close() guard
    pub fn unposted_in_year(year: i32) -> Self {
        Self {
            fiscal_year: Some(year),
            posted: Some(false),
            ..Self::default()
        }
    }
}

/// Filter for posted-line projections feeding the reports.
///
/// When `fiscal_year` is set it takes precedence over the date range.
/// `before` selects lines strictly earlier than the given date and is used
/// for opening-balance computation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineFilter {
    pub account: Option<String>,
    pub fiscal_year: Option<i32>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub before: Option<NaiveDate>,
}

/// A posted journal line joined with its entry header, as consumed by the
/// reporting projections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostedLine {
    pub entry_id: EntryId,
    pub line_id: LineId,
    pub date: NaiveDate,
    pub number: String,
    pub reference: String,
    /// Line description, falling back to the entry description when empty
    pub description: String,
    pub account: String,
    pub debit: BigDecimal,
    pub credit: BigDecimal,
}

/// Storage abstraction for the ledger system
///
/// This trait allows the ledger core to work with any storage backend
/// (PostgreSQL, MySQL, SQLite, in-memory, etc.) by implementing these
/// methods. Implementations own the transactional guarantees spelled out on
/// the individual methods; the core never assumes more than what is written
/// here.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    // --- accounts ---

    /// Save a new account; fails if the code is already taken
    async fn save_account(&mut self, account: &Account) -> LedgerResult<()>;

    /// Get an account by code
    async fn get_account(&self, code: &str) -> LedgerResult<Option<Account>>;

    /// List accounts ordered by code, optionally filtered by type
    async fn list_accounts(&self, account_type: Option<AccountType>) -> LedgerResult<Vec<Account>>;

    /// Update an existing account
    async fn update_account(&mut self, account: &Account) -> LedgerResult<()>;

    /// Delete an account. Must fail with `ReferentialIntegrity` while any
    /// journal line references it; deletions never cascade.
    async fn delete_account(&mut self, code: &str) -> LedgerResult<()>;

    /// Whether any journal line references the account
    async fn account_in_use(&self, code: &str) -> LedgerResult<bool>;

    // --- fiscal years ---

    /// Insert or update a fiscal year keyed by its `year`
    async fn save_fiscal_year(&mut self, fiscal_year: &FiscalYear) -> LedgerResult<()>;

    /// Get a fiscal year by its year label
    async fn get_fiscal_year(&self, year: i32) -> LedgerResult<Option<FiscalYear>>;

    /// List all fiscal years ordered by year ascending
    async fn list_fiscal_years(&self) -> LedgerResult<Vec<FiscalYear>>;

    /// Delete a fiscal year. Must fail with `ReferentialIntegrity` while
    /// entries are booked into it.
    async fn delete_fiscal_year(&mut self, year: i32) -> LedgerResult<()>;

    // --- journals ---

    /// Save a new journal; fails if the code is already taken
    async fn save_journal(&mut self, journal: &Journal) -> LedgerResult<()>;

    /// Get a journal by code
    async fn get_journal(&self, code: &str) -> LedgerResult<Option<Journal>>;

    /// List journals ordered by code, optionally filtered by type
    async fn list_journals(&self, journal_type: Option<JournalType>) -> LedgerResult<Vec<Journal>>;

    /// Update an existing journal
    async fn update_journal(&mut self, journal: &Journal) -> LedgerResult<()>;

    /// Delete a journal. Must fail with `ReferentialIntegrity` while
    /// entries are booked into it.
    async fn delete_journal(&mut self, code: &str) -> LedgerResult<()>;

    // --- journal entries ---

    /// Persist an entry together with all of its lines atomically, assigning
    /// entry and line ids. Either every row is written or none are.
    async fn insert_entry(&mut self, entry: JournalEntry) -> LedgerResult<JournalEntry>;

    /// Get an entry (with lines) by id
    async fn get_entry(&self, id: EntryId) -> LedgerResult<Option<JournalEntry>>;

    /// List entries matching the filter, ordered by (date, id)
    async fn list_entries(&self, filter: &EntryFilter) -> LedgerResult<Vec<JournalEntry>>;

    /// Count entries matching the filter
    async fn count_entries(&self, filter: &EntryFilter) -> LedgerResult<usize>;

    /// Atomically replace the whole line set of an entry (delete-all,
    /// insert-new). Returns the updated entry.
    async fn replace_lines(
        &mut self,
        id: EntryId,
        lines: Vec<JournalLine>,
    ) -> LedgerResult<JournalEntry>;

    /// Flip the posted flag and its audit fields in one write
    async fn set_posted_state(
        &mut self,
        id: EntryId,
        posted: bool,
        posted_at: Option<NaiveDateTime>,
        posted_by: Option<Uuid>,
    ) -> LedgerResult<JournalEntry>;

    /// Delete an entry and its lines (draft cleanup and opening-balance
    /// re-import only)
    async fn delete_entry(&mut self, id: EntryId) -> LedgerResult<()>;

    /// Whether any entry already carries this serial number
    async fn number_exists(&self, number: &str) -> LedgerResult<bool>;

    /// Posted lines matching the filter, ordered by (date, entry id, line id)
    async fn posted_lines(&self, filter: &LineFilter) -> LedgerResult<Vec<PostedLine>>;

    // --- numbering ---

    /// Get the numbering scheme for an (entity label, field name) pair
    async fn get_scheme(
        &self,
        entity_label: &str,
        field_name: &str,
    ) -> LedgerResult<Option<NumberingScheme>>;

    /// Insert or update a numbering scheme
    async fn save_scheme(&mut self, scheme: &NumberingScheme) -> LedgerResult<()>;

    /// Allocate the next integer in the (key, period) counter.
    ///
    /// The read-increment-write must run as one critical section holding an
    /// exclusive lock on the counter row for its whole duration (the SQL
    /// shape is `SELECT ... FOR UPDATE`; the in-memory backend holds a
    /// mutex). A missing row is created with `last_value = start - 1` inside
    /// the same critical section; an insert race must resolve to a single
    /// winner. Returned values for a given (key, period) are strictly
    /// increasing with no duplicates. Lock-wait timeouts surface as the
    /// retryable `SequenceContention` error.
    async fn next_sequence(&mut self, key: &str, period: &str, start: u64) -> LedgerResult<u64>;
}

/// Trait for implementing custom account validation rules
pub trait AccountValidator: Send + Sync {
    /// Validate an account before saving
    fn validate_account(&self, account: &Account) -> LedgerResult<()>;
}

/// Trait for implementing custom entry validation rules
pub trait EntryValidator: Send + Sync {
    /// Validate a fully-assembled entry before it is persisted or posted
    fn validate_entry(&self, entry: &JournalEntry) -> LedgerResult<()>;
}

/// Precondition hook consulted before an entry is unposted.
///
/// The engine always runs this guard; callers owning downstream artifacts
/// (e.g. a payment reconciled against the entry) install a guard that
/// rejects unposting while those artifacts exist, instead of each call site
/// remembering to check.
pub trait UnpostGuard: Send + Sync {
    fn check_unpost(&self, entry: &JournalEntry) -> LedgerResult<()>;
}

/// Default account validator with basic rules
pub struct DefaultAccountValidator;

impl AccountValidator for DefaultAccountValidator {
    fn validate_account(&self, account: &Account) -> LedgerResult<()> {
        if account.code.trim().is_empty() {
            return Err(LedgerError::Validation(
                "account code cannot be empty".to_string(),
            ));
        }
        if account.name.trim().is_empty() {
            return Err(LedgerError::Validation(
                "account name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default entry validator applying the balance and one-side invariants
pub struct DefaultEntryValidator;

impl EntryValidator for DefaultEntryValidator {
    fn validate_entry(&self, entry: &JournalEntry) -> LedgerResult<()> {
        entry.validate()
    }
}

/// Guard that permits every unpost. The safe default for installations
/// without reconciliation.
pub struct AllowUnpost;

impl UnpostGuard for AllowUnpost {
    fn check_unpost(&self, _entry: &JournalEntry) -> LedgerResult<()> {
        Ok(())
    }
}
