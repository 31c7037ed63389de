//! Journal entry engine: creation, posting state transitions, reversal

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::ledger::fiscal_year::FiscalYearRegistry;
use crate::numbering::{NumberContext, NumberingService};
use crate::traits::*;
use crate::types::*;

/// Entity label journal entries are numbered under
pub const ENTRY_ENTITY_LABEL: &str = "ledger.JournalEntry";

/// Everything needed to create a journal entry
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub journal: String,
    pub date: NaiveDate,
    /// Resolved from `date` when omitted
    pub fiscal_year: Option<i32>,
    pub reference: String,
    pub description: String,
    pub lines: Vec<LineInput>,
    pub created_by: Option<Uuid>,
}

impl NewEntry {
    pub fn new(journal: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            journal: journal.into(),
            date,
            fiscal_year: None,
            reference: String::new(),
            description: String::new(),
            lines: Vec::new(),
            created_by: None,
        }
    }
}

/// Builder for assembling entries line by line
#[derive(Debug)]
pub struct EntryBuilder {
    entry: NewEntry,
}

impl EntryBuilder {
    pub fn new(journal: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            entry: NewEntry::new(journal, date),
        }
    }

    pub fn fiscal_year(mut self, year: i32) -> Self {
        self.entry.fiscal_year = Some(year);
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.entry.reference = reference.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.entry.description = description.into();
        self
    }

    pub fn created_by(mut self, actor: Uuid) -> Self {
        self.entry.created_by = Some(actor);
        self
    }

    /// Add a debit line
    pub fn debit(mut self, account: impl Into<String>, amount: BigDecimal) -> Self {
        self.entry.lines.push(LineInput::debit(account, amount));
        self
    }

    /// Add a credit line
    pub fn credit(mut self, account: impl Into<String>, amount: BigDecimal) -> Self {
        self.entry.lines.push(LineInput::credit(account, amount));
        self
    }

    /// Add a raw line row
    pub fn line(mut self, line: LineInput) -> Self {
        self.entry.lines.push(line);
        self
    }

    /// Finish the builder, pre-checking the balance invariant so obviously
    /// broken entries fail before touching the engine.
    pub fn build(self) -> LedgerResult<NewEntry> {
        let rows: Vec<&LineInput> = self.entry.lines.iter().filter(|l| !l.is_blank()).collect();
        if rows.is_empty() {
            return Err(LedgerError::EmptyEntry);
        }
        let debit: BigDecimal = rows.iter().map(|l| &l.debit).sum();
        let credit: BigDecimal = rows.iter().map(|l| &l.credit).sum();
        if debit != credit {
            return Err(LedgerError::Unbalanced { debit, credit });
        }
        Ok(self.entry)
    }
}

/// Turn raw input rows into validated journal lines.
///
/// Fully blank rows are dropped; a row carrying an amount or a description
/// without an account is rejected; every surviving line must obey the
/// one-side rule. `EmptyEntry` when nothing survives.
pub(crate) fn build_lines(inputs: &[LineInput]) -> LedgerResult<Vec<JournalLine>> {
    let mut lines = Vec::new();
    for (order, input) in inputs.iter().enumerate() {
        if input.is_blank() {
            continue;
        }
        let account = input.account.clone().ok_or_else(|| {
            LedgerError::Validation(format!(
                "line {} has an amount or description but no account",
                order + 1
            ))
        })?;
        let line = JournalLine {
            id: 0,
            account,
            description: input.description.clone(),
            debit: input.debit.clone(),
            credit: input.credit.clone(),
            order: order as u32,
        };
        line.validate()?;
        lines.push(line);
    }
    if lines.is_empty() {
        return Err(LedgerError::EmptyEntry);
    }
    Ok(lines)
}

/// Generate a serial for an entry, re-drawing while the candidate collides
/// with an existing number. The allocator alone is not trusted here:
/// imported legacy data may already occupy numbers ahead of the counter.
pub(crate) async fn assign_entry_number<S: LedgerStorage>(
    storage: &S,
    numbering: &mut NumberingService<S>,
    journal_code: &str,
    date: NaiveDate,
) -> LedgerResult<String> {
    let ctx = NumberContext::new()
        .on_date(date)
        .with_prefix(journal_code.to_uppercase());
    loop {
        let candidate = numbering
            .generate(ENTRY_ENTITY_LABEL, "number", &ctx)
            .await?;
        if !storage.number_exists(&candidate).await? {
            return Ok(candidate);
        }
        debug!(%candidate, "serial already taken, drawing the next one");
    }
}

/// The balanced unit of posting: validates, numbers, persists, and moves
/// entries through the draft/posted state machine
pub struct EntryEngine<S: LedgerStorage + Clone> {
    storage: S,
    fiscal_years: FiscalYearRegistry<S>,
    numbering: NumberingService<S>,
    validator: Box<dyn EntryValidator>,
    unpost_guard: Box<dyn UnpostGuard>,
}

impl<S: LedgerStorage + Clone> EntryEngine<S> {
    pub fn new(storage: S) -> Self {
        Self {
            fiscal_years: FiscalYearRegistry::new(storage.clone()),
            numbering: NumberingService::new(storage.clone()),
            storage,
            validator: Box::new(DefaultEntryValidator),
            unpost_guard: Box::new(AllowUnpost),
        }
    }

    /// Create an engine with custom validation and unpost hooks
    pub fn with_hooks(
        storage: S,
        validator: Box<dyn EntryValidator>,
        unpost_guard: Box<dyn UnpostGuard>,
    ) -> Self {
        Self {
            fiscal_years: FiscalYearRegistry::new(storage.clone()),
            numbering: NumberingService::new(storage.clone()),
            storage,
            validator,
            unpost_guard,
        }
    }

    /// Get an entry by id, erroring when absent
    pub async fn get_required(&self, id: EntryId) -> LedgerResult<JournalEntry> {
        self.storage
            .get_entry(id)
            .await?
            .ok_or(LedgerError::EntryNotFound(id))
    }

    /// Create a draft entry.
    ///
    /// Resolves the fiscal year from the entry date when not supplied,
    /// validates every line and the balance invariant, assigns the serial
    /// number, and persists header plus lines atomically. Nothing is
    /// written when any check fails.
    pub async fn create(&mut self, input: NewEntry) -> LedgerResult<JournalEntry> {
        let journal = self
            .storage
            .get_journal(&input.journal)
            .await?
            .ok_or_else(|| LedgerError::JournalNotFound(input.journal.clone()))?;

        let fiscal_year = match input.fiscal_year {
            Some(year) => self.fiscal_years.get_required(year).await?,
            None => self
                .fiscal_years
                .for_date(input.date)
                .await?
                .ok_or(LedgerError::NoFiscalYear(input.date))?,
        };
        if fiscal_year.is_closed {
            return Err(LedgerError::ClosedFiscalYear(fiscal_year.year));
        }

        let lines = build_lines(&input.lines)?;
        self.check_line_accounts(&lines).await?;

        let mut entry = JournalEntry {
            id: 0,
            number: String::new(),
            fiscal_year: Some(fiscal_year.year),
            journal: journal.code.clone(),
            date: input.date,
            reference: input.reference,
            description: input.description,
            posted: false,
            posted_at: None,
            posted_by: None,
            created_at: Utc::now().naive_utc(),
            created_by: input.created_by,
            lines,
        };
        self.validator.validate_entry(&entry)?;

        entry.number =
            assign_entry_number(&self.storage, &mut self.numbering, &journal.code, input.date)
                .await?;

        let entry = self.storage.insert_entry(entry).await?;
        debug!(entry = entry.id, number = %entry.number, "entry created");
        Ok(entry)
    }

    /// Mark an entry posted. No-op when already posted. The balance
    /// invariant is re-checked at the moment of transition, not assumed
    /// from creation time.
    pub async fn post(&mut self, id: EntryId, actor: Option<Uuid>) -> LedgerResult<JournalEntry> {
        let entry = self.get_required(id).await?;
        if entry.posted {
            debug!(entry = id, "already posted, nothing to do");
            return Ok(entry);
        }

        self.validator.validate_entry(&entry)?;
        self.check_open_fiscal_year(&entry).await?;

        let posted = self
            .storage
            .set_posted_state(id, true, Some(Utc::now().naive_utc()), actor)
            .await?;
        info!(entry = id, number = %posted.number, "entry posted");
        Ok(posted)
    }

    /// Clear the posted state. No-op when already draft. The unpost guard
    /// runs first; installations with reconciliation reject unposting
    /// entries that payments depend on.
    pub async fn unpost(&mut self, id: EntryId, actor: Option<Uuid>) -> LedgerResult<JournalEntry> {
        let entry = self.get_required(id).await?;
        if !entry.posted {
            debug!(entry = id, "not posted, nothing to do");
            return Ok(entry);
        }

        self.unpost_guard.check_unpost(&entry)?;

        let draft = self.storage.set_posted_state(id, false, None, None).await?;
        info!(entry = id, number = %draft.number, actor = ?actor, "entry unposted");
        Ok(draft)
    }

    /// Create and immediately post a reversal: a new entry in the same
    /// journal whose lines carry the original amounts with debit and credit
    /// swapped. The original entry is left untouched.
    pub async fn reverse(
        &mut self,
        id: EntryId,
        reversal_date: NaiveDate,
        actor: Option<Uuid>,
    ) -> LedgerResult<JournalEntry> {
        let original = self.get_required(id).await?;
        if !original.posted {
            return Err(LedgerError::Validation(format!(
                "entry {id} is not posted; a draft is corrected in place, not reversed"
            )));
        }

        let fiscal_year = self
            .fiscal_years
            .for_date(reversal_date)
            .await?
            .ok_or(LedgerError::NoFiscalYear(reversal_date))?;
        if fiscal_year.is_closed {
            return Err(LedgerError::ClosedFiscalYear(fiscal_year.year));
        }

        let lines: Vec<JournalLine> = original
            .lines
            .iter()
            .map(|line| JournalLine {
                id: 0,
                account: line.account.clone(),
                description: line.description.clone(),
                debit: line.credit.clone(),
                credit: line.debit.clone(),
                order: line.order,
            })
            .collect();

        let number = assign_entry_number(
            &self.storage,
            &mut self.numbering,
            &original.journal,
            reversal_date,
        )
        .await?;

        let now = Utc::now().naive_utc();
        let reversal = JournalEntry {
            id: 0,
            number,
            fiscal_year: Some(fiscal_year.year),
            journal: original.journal.clone(),
            date: reversal_date,
            reference: format!("REV-{}", original.number),
            description: format!("Reversal of {}", original.number),
            posted: true,
            posted_at: Some(now),
            posted_by: actor,
            created_at: now,
            created_by: actor,
            lines,
        };

        let reversal = self.storage.insert_entry(reversal).await?;
        info!(
            original = id,
            reversal = reversal.id,
            number = %reversal.number,
            "reversal entry posted"
        );
        Ok(reversal)
    }

    /// Replace the whole line set of a draft entry. Posted entries are
    /// immutable; unpost first or create a reversal.
    pub async fn update(
        &mut self,
        id: EntryId,
        new_lines: Vec<LineInput>,
    ) -> LedgerResult<JournalEntry> {
        let entry = self.get_required(id).await?;
        if entry.posted {
            return Err(LedgerError::PostedEntryImmutable(id));
        }

        let lines = build_lines(&new_lines)?;
        self.check_line_accounts(&lines).await?;

        let mut candidate = entry.clone();
        candidate.lines = lines.clone();
        self.validator.validate_entry(&candidate)?;

        let updated = self.storage.replace_lines(id, lines).await?;
        debug!(entry = id, "entry lines replaced");
        Ok(updated)
    }

    async fn check_line_accounts(&self, lines: &[JournalLine]) -> LedgerResult<()> {
        for line in lines {
            let account = self
                .storage
                .get_account(&line.account)
                .await?
                .ok_or_else(|| LedgerError::AccountNotFound(line.account.clone()))?;
            if !account.is_active {
                return Err(LedgerError::Validation(format!(
                    "account '{}' is inactive",
                    line.account
                )));
            }
        }
        Ok(())
    }

    async fn check_open_fiscal_year(&self, entry: &JournalEntry) -> LedgerResult<()> {
        if let Some(year) = entry.fiscal_year {
            let fiscal_year = self.fiscal_years.get_required(year).await?;
            if fiscal_year.is_closed {
                return Err(LedgerError::ClosedFiscalYear(year));
            }
        }
        Ok(())
    }
}

/// Common balanced line sets for originating transactions
pub mod patterns {
    use super::*;

    /// Sales invoice posting: debit receivables, credit revenue
    pub fn sales_invoice(
        receivable_account: impl Into<String>,
        revenue_account: impl Into<String>,
        amount: BigDecimal,
    ) -> Vec<LineInput> {
        vec![
            LineInput::debit(receivable_account, amount.clone()),
            LineInput::credit(revenue_account, amount),
        ]
    }

    /// Customer payment: debit cash/bank, credit receivables
    pub fn customer_payment(
        cash_account: impl Into<String>,
        receivable_account: impl Into<String>,
        amount: BigDecimal,
    ) -> Vec<LineInput> {
        vec![
            LineInput::debit(cash_account, amount.clone()),
            LineInput::credit(receivable_account, amount),
        ]
    }

    /// Expense payment: debit expense, credit cash/bank
    pub fn expense_payment(
        expense_account: impl Into<String>,
        cash_account: impl Into<String>,
        amount: BigDecimal,
    ) -> Vec<LineInput> {
        vec![
            LineInput::debit(expense_account, amount.clone()),
            LineInput::credit(cash_account, amount),
        ]
    }

    /// Owner investment: debit cash, credit equity
    pub fn owner_investment(
        cash_account: impl Into<String>,
        equity_account: impl Into<String>,
        amount: BigDecimal,
    ) -> Vec<LineInput> {
        vec![
            LineInput::debit(cash_account, amount.clone()),
            LineInput::credit(equity_account, amount),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn amount(n: i64) -> BigDecimal {
        BigDecimal::from(n)
    }

    /// Storage with a 2025 fiscal year, a default general journal, and a
    /// small chart of accounts
    async fn seeded_storage() -> MemoryStorage {
        let mut storage = MemoryStorage::new();
        storage
            .save_fiscal_year(&FiscalYear::new(2025, d(2025, 1, 1), d(2025, 12, 31)))
            .await
            .unwrap();
        storage
            .save_journal(&Journal::new("GEN", "General", JournalType::General).as_default())
            .await
            .unwrap();
        for (code, name, account_type) in [
            ("1000", "Cash", AccountType::Asset),
            ("4000", "Sales", AccountType::Revenue),
            ("5000", "Purchases", AccountType::Expense),
        ] {
            storage
                .save_account(&Account::new(code, name, account_type, None))
                .await
                .unwrap();
        }
        storage
    }

    fn balanced_entry(amount_value: i64) -> NewEntry {
        EntryBuilder::new("GEN", d(2025, 3, 1))
            .description("test entry")
            .debit("1000", amount(amount_value))
            .credit("4000", amount(amount_value))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_number_and_fiscal_year() {
        let storage = seeded_storage().await;
        let mut engine = EntryEngine::new(storage);

        let entry = engine.create(balanced_entry(100)).await.unwrap();
        assert_eq!(entry.number, "GEN-2025-0001");
        assert_eq!(entry.fiscal_year, Some(2025));
        assert!(!entry.posted);
        assert!(entry.id > 0);
        assert!(entry.is_balanced());
    }

    #[tokio::test]
    async fn test_create_rejects_unbalanced() {
        let storage = seeded_storage().await;
        let mut engine = EntryEngine::new(storage.clone());

        let input = NewEntry {
            lines: vec![
                LineInput::debit("1000", amount(100)),
                LineInput::credit("4000", amount(90)),
            ],
            ..NewEntry::new("GEN", d(2025, 3, 1))
        };
        let err = engine.create(input).await.unwrap_err();
        assert!(matches!(err, LedgerError::Unbalanced { .. }));

        // nothing persisted
        let entries = storage.list_entries(&EntryFilter::default()).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_create_discards_blank_rows() {
        let storage = seeded_storage().await;
        let mut engine = EntryEngine::new(storage);

        let input = NewEntry {
            lines: vec![
                LineInput::debit("1000", amount(50)),
                LineInput::default(), // fully blank, dropped
                LineInput::credit("4000", amount(50)),
            ],
            ..NewEntry::new("GEN", d(2025, 3, 1))
        };
        let entry = engine.create(input).await.unwrap();
        assert_eq!(entry.lines.len(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_amount_without_account() {
        let storage = seeded_storage().await;
        let mut engine = EntryEngine::new(storage);

        let input = NewEntry {
            lines: vec![
                LineInput::debit("1000", amount(50)),
                LineInput {
                    account: None,
                    description: String::new(),
                    debit: BigDecimal::from(0),
                    credit: amount(50),
                },
            ],
            ..NewEntry::new("GEN", d(2025, 3, 1))
        };
        let err = engine.create(input).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_all_blank_lines() {
        let storage = seeded_storage().await;
        let mut engine = EntryEngine::new(storage);

        let input = NewEntry {
            lines: vec![LineInput::default(), LineInput::default()],
            ..NewEntry::new("GEN", d(2025, 3, 1))
        };
        let err = engine.create(input).await.unwrap_err();
        assert!(matches!(err, LedgerError::EmptyEntry));
    }

    #[tokio::test]
    async fn test_create_without_fiscal_year_fails() {
        let storage = seeded_storage().await;
        let mut engine = EntryEngine::new(storage);

        let input = NewEntry {
            lines: patterns::sales_invoice("1000", "4000", amount(10)),
            ..NewEntry::new("GEN", d(2030, 1, 1))
        };
        let err = engine.create(input).await.unwrap_err();
        assert!(matches!(err, LedgerError::NoFiscalYear(_)));
    }

    #[tokio::test]
    async fn test_post_and_repost_is_noop() {
        let storage = seeded_storage().await;
        let mut engine = EntryEngine::new(storage);
        let actor = Uuid::new_v4();

        let entry = engine.create(balanced_entry(100)).await.unwrap();
        let posted = engine.post(entry.id, Some(actor)).await.unwrap();
        assert!(posted.posted);
        assert!(posted.posted_at.is_some());
        assert_eq!(posted.posted_by, Some(actor));

        let again = engine.post(entry.id, Some(Uuid::new_v4())).await.unwrap();
        assert_eq!(again.posted_by, Some(actor), "repost does not overwrite");
    }

    #[tokio::test]
    async fn test_post_into_closed_year_fails() {
        let mut storage = seeded_storage().await;
        let mut engine = EntryEngine::new(storage.clone());

        let entry = engine.create(balanced_entry(100)).await.unwrap();

        let mut fy = storage.get_fiscal_year(2025).await.unwrap().unwrap();
        fy.is_closed = true;
        storage.save_fiscal_year(&fy).await.unwrap();

        let err = engine.post(entry.id, None).await.unwrap_err();
        assert!(matches!(err, LedgerError::ClosedFiscalYear(2025)));
    }

    #[tokio::test]
    async fn test_create_into_closed_year_fails() {
        let mut storage = seeded_storage().await;
        let mut fy = storage.get_fiscal_year(2025).await.unwrap().unwrap();
        fy.is_closed = true;
        storage.save_fiscal_year(&fy).await.unwrap();

        let mut engine = EntryEngine::new(storage);
        let err = engine.create(balanced_entry(100)).await.unwrap_err();
        assert!(matches!(err, LedgerError::ClosedFiscalYear(2025)));
    }

    #[tokio::test]
    async fn test_unpost_clears_audit_fields() {
        let storage = seeded_storage().await;
        let mut engine = EntryEngine::new(storage);

        let entry = engine.create(balanced_entry(100)).await.unwrap();
        engine.post(entry.id, Some(Uuid::new_v4())).await.unwrap();

        let draft = engine.unpost(entry.id, None).await.unwrap();
        assert!(!draft.posted);
        assert!(draft.posted_at.is_none());
        assert!(draft.posted_by.is_none());
    }

    #[tokio::test]
    async fn test_unpost_guard_blocks() {
        struct DenyAll;
        impl UnpostGuard for DenyAll {
            fn check_unpost(&self, entry: &JournalEntry) -> LedgerResult<()> {
                Err(LedgerError::Validation(format!(
                    "entry {} has reconciled payments",
                    entry.id
                )))
            }
        }

        let storage = seeded_storage().await;
        let mut engine = EntryEngine::with_hooks(
            storage,
            Box::new(DefaultEntryValidator),
            Box::new(DenyAll),
        );

        let entry = engine.create(balanced_entry(100)).await.unwrap();
        engine.post(entry.id, None).await.unwrap();

        let err = engine.unpost(entry.id, None).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let still_posted = engine.get_required(entry.id).await.unwrap();
        assert!(still_posted.posted);
    }

    #[tokio::test]
    async fn test_reverse_swaps_sides() {
        let storage = seeded_storage().await;
        let mut engine = EntryEngine::new(storage);

        let entry = engine.create(balanced_entry(250)).await.unwrap();
        engine.post(entry.id, None).await.unwrap();

        let reversal = engine
            .reverse(entry.id, d(2025, 4, 1), Some(Uuid::new_v4()))
            .await
            .unwrap();

        assert!(reversal.posted);
        assert_eq!(reversal.reference, format!("REV-{}", entry.number));
        assert_eq!(reversal.lines.len(), entry.lines.len());
        for (original, reversed) in entry.lines.iter().zip(reversal.lines.iter()) {
            assert_eq!(original.debit, reversed.credit);
            assert_eq!(original.credit, reversed.debit);
            assert_eq!(original.account, reversed.account);
        }
        assert!(reversal.is_balanced());

        // original retained untouched
        let untouched = engine.get_required(entry.id).await.unwrap();
        assert!(untouched.posted);
        assert_eq!(untouched.lines, entry.lines);
    }

    #[tokio::test]
    async fn test_reverse_draft_is_rejected() {
        let storage = seeded_storage().await;
        let mut engine = EntryEngine::new(storage);

        let entry = engine.create(balanced_entry(10)).await.unwrap();
        let err = engine.reverse(entry.id, d(2025, 4, 1), None).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_replaces_lines() {
        let storage = seeded_storage().await;
        let mut engine = EntryEngine::new(storage);

        let entry = engine.create(balanced_entry(100)).await.unwrap();
        let updated = engine
            .update(entry.id, patterns::expense_payment("5000", "1000", amount(40)))
            .await
            .unwrap();

        assert_eq!(updated.lines.len(), 2);
        assert_eq!(updated.lines[0].account, "5000");
        assert_eq!(updated.total_debit(), amount(40));
        assert_eq!(updated.number, entry.number, "serial survives rewrites");
    }

    #[tokio::test]
    async fn test_update_posted_entry_is_immutable() {
        let storage = seeded_storage().await;
        let mut engine = EntryEngine::new(storage);

        let entry = engine.create(balanced_entry(100)).await.unwrap();
        engine.post(entry.id, None).await.unwrap();

        let err = engine
            .update(entry.id, patterns::expense_payment("5000", "1000", amount(40)))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::PostedEntryImmutable(_)));

        let unchanged = engine.get_required(entry.id).await.unwrap();
        assert_eq!(unchanged.lines, entry.lines);
    }

    #[tokio::test]
    async fn test_numbers_increment_within_journal_year() {
        let storage = seeded_storage().await;
        let mut engine = EntryEngine::new(storage);

        let first = engine.create(balanced_entry(1)).await.unwrap();
        let second = engine.create(balanced_entry(2)).await.unwrap();
        assert_eq!(first.number, "GEN-2025-0001");
        assert_eq!(second.number, "GEN-2025-0002");
    }

    #[tokio::test]
    async fn test_number_collision_draws_next() {
        let storage = seeded_storage().await;
        let mut engine = EntryEngine::new(storage.clone());

        // Simulate imported legacy data occupying the first serial while the
        // counter still sits at zero
        let legacy = JournalEntry {
            id: 0,
            number: "GEN-2025-0001".to_string(),
            fiscal_year: Some(2025),
            journal: "GEN".to_string(),
            date: d(2025, 1, 15),
            reference: String::new(),
            description: "imported".to_string(),
            posted: true,
            posted_at: Some(Utc::now().naive_utc()),
            posted_by: None,
            created_at: Utc::now().naive_utc(),
            created_by: None,
            lines: vec![
                JournalLine::debit("1000", amount(5)),
                JournalLine::credit("4000", amount(5)),
            ],
        };
        let mut storage_handle = storage.clone();
        storage_handle.insert_entry(legacy).await.unwrap();

        let entry = engine.create(balanced_entry(7)).await.unwrap();
        assert_eq!(entry.number, "GEN-2025-0002");
    }
}
