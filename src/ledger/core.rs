//! Main ledger orchestrator that coordinates accounts, fiscal years,
//! journals, entries and reports

use chrono::NaiveDate;
use uuid::Uuid;

use crate::ledger::account::{AccountManager, ChartImportSummary, ChartRow};
use crate::ledger::entry::{EntryEngine, NewEntry};
use crate::ledger::fiscal_year::FiscalYearRegistry;
use crate::ledger::journal::{JournalRegistry, LedgerSettings};
use crate::ledger::opening::{OpeningBalanceImporter, OpeningBalanceRow};
use crate::reports::{AccountLedger, ReportScope, Reports, TrialBalance};
use crate::traits::*;
use crate::types::*;

/// Facade over the whole ledger: one storage handle, every operation.
///
/// Each component holds its own clone of the storage; clones share the
/// backing store the way pooled connections share a database.
pub struct Ledger<S: LedgerStorage + Clone> {
    accounts: AccountManager<S>,
    fiscal_years: FiscalYearRegistry<S>,
    journals: JournalRegistry<S>,
    entries: EntryEngine<S>,
    opening: OpeningBalanceImporter<S>,
    reports: Reports<S>,
}

impl<S: LedgerStorage + Clone> Ledger<S> {
    /// Create a new ledger with the given storage backend
    pub fn new(storage: S) -> Self {
        Self::with_settings(storage, LedgerSettings::default())
    }

    /// Create a new ledger with explicit journal routing settings
    pub fn with_settings(storage: S, settings: LedgerSettings) -> Self {
        Self {
            accounts: AccountManager::new(storage.clone()),
            fiscal_years: FiscalYearRegistry::new(storage.clone()),
            journals: JournalRegistry::with_settings(storage.clone(), settings.clone()),
            entries: EntryEngine::new(storage.clone()),
            opening: OpeningBalanceImporter::with_settings(storage.clone(), settings),
            reports: Reports::new(storage),
        }
    }

    /// Create a new ledger with custom validation and unpost hooks
    pub fn with_hooks(
        storage: S,
        settings: LedgerSettings,
        account_validator: Box<dyn AccountValidator>,
        entry_validator: Box<dyn EntryValidator>,
        unpost_guard: Box<dyn UnpostGuard>,
    ) -> Self {
        Self {
            accounts: AccountManager::with_validator(storage.clone(), account_validator),
            fiscal_years: FiscalYearRegistry::new(storage.clone()),
            journals: JournalRegistry::with_settings(storage.clone(), settings.clone()),
            entries: EntryEngine::with_hooks(storage.clone(), entry_validator, unpost_guard),
            opening: OpeningBalanceImporter::with_settings(storage.clone(), settings),
            reports: Reports::new(storage),
        }
    }

    // --- accounts ---

    /// Create a new account
    pub async fn create_account(&mut self, account: Account) -> LedgerResult<Account> {
        self.accounts.create(account).await
    }

    /// Get an account by code
    pub async fn get_account(&self, code: &str) -> LedgerResult<Option<Account>> {
        self.accounts.get(code).await
    }

    /// List all accounts
    pub async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.accounts.list().await
    }

    /// List accounts by type
    pub async fn list_accounts_by_type(
        &self,
        account_type: AccountType,
    ) -> LedgerResult<Vec<Account>> {
        self.accounts.list_by_type(account_type).await
    }

    /// List active accounts usable in payment settlement
    pub async fn settlement_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.accounts.settlement_accounts().await
    }

    /// Update an account
    pub async fn update_account(&mut self, account: &Account) -> LedgerResult<()> {
        self.accounts.update(account).await
    }

    /// Deactivate an account, keeping its history
    pub async fn deactivate_account(&mut self, code: &str) -> LedgerResult<Account> {
        self.accounts.deactivate(code).await
    }

    /// Delete an account with no journal history
    pub async fn delete_account(&mut self, code: &str) -> LedgerResult<()> {
        self.accounts.delete(code).await
    }

    /// Seed the stock chart of accounts for a fresh ledger
    pub async fn seed_default_chart(&mut self) -> LedgerResult<ChartImportSummary> {
        self.accounts.seed_default_chart().await
    }

    /// Bulk-import a chart of accounts
    pub async fn import_chart(
        &mut self,
        rows: Vec<ChartRow>,
        replace_existing: bool,
        deactivate_missing: bool,
    ) -> LedgerResult<ChartImportSummary> {
        self.accounts
            .import_chart(rows, replace_existing, deactivate_missing)
            .await
    }

    // --- fiscal years ---

    /// Register a fiscal year
    pub async fn create_fiscal_year(
        &mut self,
        year: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> LedgerResult<FiscalYear> {
        self.fiscal_years.create(year, start_date, end_date).await
    }

    /// Get a fiscal year by its label
    pub async fn get_fiscal_year(&self, year: i32) -> LedgerResult<Option<FiscalYear>> {
        self.fiscal_years.get(year).await
    }

    /// List fiscal years ascending
    pub async fn list_fiscal_years(&self) -> LedgerResult<Vec<FiscalYear>> {
        self.fiscal_years.list().await
    }

    /// The fiscal year a date falls into
    pub async fn fiscal_year_for_date(&self, date: NaiveDate) -> LedgerResult<Option<FiscalYear>> {
        self.fiscal_years.for_date(date).await
    }

    /// Close a fiscal year, refusing while unposted entries remain in it
    pub async fn close_fiscal_year(&mut self, year: i32) -> LedgerResult<FiscalYear> {
        self.fiscal_years.close(year).await
    }

    // --- journals ---

    /// Register a journal
    pub async fn create_journal(&mut self, journal: Journal) -> LedgerResult<Journal> {
        self.journals.create(journal).await
    }

    /// Get a journal by code
    pub async fn get_journal(&self, code: &str) -> LedgerResult<Option<Journal>> {
        self.journals.get(code).await
    }

    /// List journals, optionally by type
    pub async fn list_journals(
        &self,
        journal_type: Option<JournalType>,
    ) -> LedgerResult<Vec<Journal>> {
        self.journals.list(journal_type).await
    }

    /// Resolve the journal a purpose books into
    pub async fn default_journal_for(
        &self,
        purpose: JournalPurpose,
    ) -> LedgerResult<Option<Journal>> {
        self.journals.default_for(purpose).await
    }

    // --- entries ---

    /// Create a draft journal entry
    pub async fn create_entry(&mut self, input: NewEntry) -> LedgerResult<JournalEntry> {
        self.entries.create(input).await
    }

    /// Get an entry by id
    pub async fn get_entry(&self, id: EntryId) -> LedgerResult<JournalEntry> {
        self.entries.get_required(id).await
    }

    /// Post an entry
    pub async fn post_entry(&mut self, id: EntryId, actor: Option<Uuid>) -> LedgerResult<JournalEntry> {
        self.entries.post(id, actor).await
    }

    /// Unpost an entry back to draft
    pub async fn unpost_entry(
        &mut self,
        id: EntryId,
        actor: Option<Uuid>,
    ) -> LedgerResult<JournalEntry> {
        self.entries.unpost(id, actor).await
    }

    /// Reverse a posted entry on the given date
    pub async fn reverse_entry(
        &mut self,
        id: EntryId,
        reversal_date: NaiveDate,
        actor: Option<Uuid>,
    ) -> LedgerResult<JournalEntry> {
        self.entries.reverse(id, reversal_date, actor).await
    }

    /// Replace the lines of a draft entry
    pub async fn update_entry_lines(
        &mut self,
        id: EntryId,
        lines: Vec<LineInput>,
    ) -> LedgerResult<JournalEntry> {
        self.entries.update(id, lines).await
    }

    // --- opening balances ---

    /// Import opening balances for a fiscal year
    pub async fn import_opening_balances(
        &mut self,
        year: i32,
        rows: Vec<OpeningBalanceRow>,
        actor: Option<Uuid>,
    ) -> LedgerResult<JournalEntry> {
        self.opening.import(year, rows, actor).await
    }

    // --- reports ---

    /// Trial balance over a scope
    pub async fn trial_balance(&self, scope: &ReportScope) -> LedgerResult<TrialBalance> {
        self.reports.trial_balance(scope).await
    }

    /// Movement history of one account with running balance
    pub async fn account_ledger(
        &self,
        account_code: &str,
        scope: &ReportScope,
    ) -> LedgerResult<AccountLedger> {
        self.reports.account_ledger(account_code, scope).await
    }
}
