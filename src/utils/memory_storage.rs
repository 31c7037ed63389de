//! In-memory storage implementation for testing and development

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;

use crate::numbering::NumberingScheme;
use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct Counters {
    next_entry_id: EntryId,
    next_line_id: LineId,
}

/// In-memory storage backend.
///
/// `Clone` shares the underlying maps, so cloned handles see each other's
/// writes the way two connections to one database would. Sequence counters
/// live behind a single mutex, which makes the whole read-increment-write
/// of `next_sequence` one critical section.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    fiscal_years: Arc<RwLock<HashMap<i32, FiscalYear>>>,
    journals: Arc<RwLock<HashMap<String, Journal>>>,
    entries: Arc<RwLock<HashMap<EntryId, JournalEntry>>>,
    schemes: Arc<RwLock<HashMap<(String, String), NumberingScheme>>>,
    sequences: Arc<Mutex<HashMap<(String, String), u64>>>,
    counters: Arc<Mutex<Counters>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
            fiscal_years: Arc::new(RwLock::new(HashMap::new())),
            journals: Arc::new(RwLock::new(HashMap::new())),
            entries: Arc::new(RwLock::new(HashMap::new())),
            schemes: Arc::new(RwLock::new(HashMap::new())),
            sequences: Arc::new(Mutex::new(HashMap::new())),
            counters: Arc::new(Mutex::new(Counters::default())),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.accounts.write().unwrap().clear();
        self.fiscal_years.write().unwrap().clear();
        self.journals.write().unwrap().clear();
        self.entries.write().unwrap().clear();
        self.schemes.write().unwrap().clear();
        self.sequences.lock().unwrap().clear();
        *self.counters.lock().unwrap() = Counters::default();
    }

    fn entry_matches(entry: &JournalEntry, filter: &EntryFilter) -> bool {
        if let Some(year) = filter.fiscal_year {
            if entry.fiscal_year != Some(year) {
                return false;
            }
        }
        if let Some(journal) = &filter.journal {
            if &entry.journal != journal {
                return false;
            }
        }
        if let Some(from) = filter.date_from {
            if entry.date < from {
                return false;
            }
        }
        if let Some(to) = filter.date_to {
            if entry.date > to {
                return false;
            }
        }
        if let Some(posted) = filter.posted {
            if entry.posted != posted {
                return false;
            }
        }
        true
    }

    fn line_scope_matches(entry: &JournalEntry, filter: &LineFilter) -> bool {
        if let Some(before) = filter.before {
            return entry.date < before;
        }
        if let Some(year) = filter.fiscal_year {
            return entry.fiscal_year == Some(year);
        }
        if let Some(from) = filter.date_from {
            if entry.date < from {
                return false;
            }
        }
        if let Some(to) = filter.date_to {
            if entry.date > to {
                return false;
            }
        }
        true
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn save_account(&mut self, account: &Account) -> LedgerResult<()> {
        let mut accounts = self.accounts.write().unwrap();
        if accounts.contains_key(&account.code) {
            return Err(LedgerError::Validation(format!(
                "account '{}' already exists",
                account.code
            )));
        }
        accounts.insert(account.code.clone(), account.clone());
        Ok(())
    }

    async fn get_account(&self, code: &str) -> LedgerResult<Option<Account>> {
        Ok(self.accounts.read().unwrap().get(code).cloned())
    }

    async fn list_accounts(&self, account_type: Option<AccountType>) -> LedgerResult<Vec<Account>> {
        let accounts = self.accounts.read().unwrap();
        let mut filtered: Vec<Account> = accounts
            .values()
            .filter(|account| {
                account_type
                    .as_ref()
                    .is_none_or(|t| &account.account_type == t)
            })
            .cloned()
            .collect();
        filtered.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(filtered)
    }

    async fn update_account(&mut self, account: &Account) -> LedgerResult<()> {
        let mut accounts = self.accounts.write().unwrap();
        if !accounts.contains_key(&account.code) {
            return Err(LedgerError::AccountNotFound(account.code.clone()));
        }
        accounts.insert(account.code.clone(), account.clone());
        Ok(())
    }

    async fn delete_account(&mut self, code: &str) -> LedgerResult<()> {
        if self.account_in_use(code).await? {
            return Err(LedgerError::ReferentialIntegrity(format!(
                "account '{code}' is referenced by journal lines"
            )));
        }
        if self.accounts.write().unwrap().remove(code).is_some() {
            Ok(())
        } else {
            Err(LedgerError::AccountNotFound(code.to_string()))
        }
    }

    async fn account_in_use(&self, code: &str) -> LedgerResult<bool> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .values()
            .any(|entry| entry.lines.iter().any(|line| line.account == code)))
    }

    async fn save_fiscal_year(&mut self, fiscal_year: &FiscalYear) -> LedgerResult<()> {
        self.fiscal_years
            .write()
            .unwrap()
            .insert(fiscal_year.year, fiscal_year.clone());
        Ok(())
    }

    async fn get_fiscal_year(&self, year: i32) -> LedgerResult<Option<FiscalYear>> {
        Ok(self.fiscal_years.read().unwrap().get(&year).cloned())
    }

    async fn list_fiscal_years(&self) -> LedgerResult<Vec<FiscalYear>> {
        let years = self.fiscal_years.read().unwrap();
        let mut listed: Vec<FiscalYear> = years.values().cloned().collect();
        listed.sort_by_key(|fy| fy.year);
        Ok(listed)
    }

    async fn delete_fiscal_year(&mut self, year: i32) -> LedgerResult<()> {
        let booked = {
            let entries = self.entries.read().unwrap();
            entries.values().any(|e| e.fiscal_year == Some(year))
        };
        if booked {
            return Err(LedgerError::ReferentialIntegrity(format!(
                "fiscal year {year} has journal entries"
            )));
        }
        if self.fiscal_years.write().unwrap().remove(&year).is_some() {
            Ok(())
        } else {
            Err(LedgerError::FiscalYearNotFound(year))
        }
    }

    async fn save_journal(&mut self, journal: &Journal) -> LedgerResult<()> {
        let mut journals = self.journals.write().unwrap();
        if journals.contains_key(&journal.code) {
            return Err(LedgerError::Validation(format!(
                "journal '{}' already exists",
                journal.code
            )));
        }
        journals.insert(journal.code.clone(), journal.clone());
        Ok(())
    }

    async fn get_journal(&self, code: &str) -> LedgerResult<Option<Journal>> {
        Ok(self.journals.read().unwrap().get(code).cloned())
    }

    async fn list_journals(&self, journal_type: Option<JournalType>) -> LedgerResult<Vec<Journal>> {
        let journals = self.journals.read().unwrap();
        let mut filtered: Vec<Journal> = journals
            .values()
            .filter(|journal| {
                journal_type
                    .as_ref()
                    .is_none_or(|t| &journal.journal_type == t)
            })
            .cloned()
            .collect();
        filtered.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(filtered)
    }

    async fn update_journal(&mut self, journal: &Journal) -> LedgerResult<()> {
        let mut journals = self.journals.write().unwrap();
        if !journals.contains_key(&journal.code) {
            return Err(LedgerError::JournalNotFound(journal.code.clone()));
        }
        journals.insert(journal.code.clone(), journal.clone());
        Ok(())
    }

    async fn delete_journal(&mut self, code: &str) -> LedgerResult<()> {
        let booked = {
            let entries = self.entries.read().unwrap();
            entries.values().any(|e| e.journal == code)
        };
        if booked {
            return Err(LedgerError::ReferentialIntegrity(format!(
                "journal '{code}' has journal entries"
            )));
        }
        if self.journals.write().unwrap().remove(code).is_some() {
            Ok(())
        } else {
            Err(LedgerError::JournalNotFound(code.to_string()))
        }
    }

    async fn insert_entry(&mut self, mut entry: JournalEntry) -> LedgerResult<JournalEntry> {
        {
            let mut counters = self.counters.lock().unwrap();
            counters.next_entry_id += 1;
            entry.id = counters.next_entry_id;
            for line in &mut entry.lines {
                counters.next_line_id += 1;
                line.id = counters.next_line_id;
            }
        }
        self.entries
            .write()
            .unwrap()
            .insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn get_entry(&self, id: EntryId) -> LedgerResult<Option<JournalEntry>> {
        Ok(self.entries.read().unwrap().get(&id).cloned())
    }

    async fn list_entries(&self, filter: &EntryFilter) -> LedgerResult<Vec<JournalEntry>> {
        let entries = self.entries.read().unwrap();
        let mut listed: Vec<JournalEntry> = entries
            .values()
            .filter(|e| Self::entry_matches(e, filter))
            .cloned()
            .collect();
        listed.sort_by_key(|e| (e.date, e.id));
        Ok(listed)
    }

    async fn count_entries(&self, filter: &EntryFilter) -> LedgerResult<usize> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .values()
            .filter(|e| Self::entry_matches(e, filter))
            .count())
    }

    async fn replace_lines(
        &mut self,
        id: EntryId,
        mut lines: Vec<JournalLine>,
    ) -> LedgerResult<JournalEntry> {
        {
            let mut counters = self.counters.lock().unwrap();
            for line in &mut lines {
                counters.next_line_id += 1;
                line.id = counters.next_line_id;
            }
        }
        let mut entries = self.entries.write().unwrap();
        let entry = entries
            .get_mut(&id)
            .ok_or(LedgerError::EntryNotFound(id))?;
        entry.lines = lines;
        Ok(entry.clone())
    }

    async fn set_posted_state(
        &mut self,
        id: EntryId,
        posted: bool,
        posted_at: Option<NaiveDateTime>,
        posted_by: Option<Uuid>,
    ) -> LedgerResult<JournalEntry> {
        let mut entries = self.entries.write().unwrap();
        let entry = entries
            .get_mut(&id)
            .ok_or(LedgerError::EntryNotFound(id))?;
        entry.posted = posted;
        entry.posted_at = posted_at;
        entry.posted_by = posted_by;
        Ok(entry.clone())
    }

    async fn delete_entry(&mut self, id: EntryId) -> LedgerResult<()> {
        if self.entries.write().unwrap().remove(&id).is_some() {
            Ok(())
        } else {
            Err(LedgerError::EntryNotFound(id))
        }
    }

    async fn number_exists(&self, number: &str) -> LedgerResult<bool> {
        let entries = self.entries.read().unwrap();
        Ok(entries.values().any(|e| e.number == number))
    }

    async fn posted_lines(&self, filter: &LineFilter) -> LedgerResult<Vec<PostedLine>> {
        let entries = self.entries.read().unwrap();
        let mut lines: Vec<PostedLine> = entries
            .values()
            .filter(|e| e.posted && Self::line_scope_matches(e, filter))
            .flat_map(|entry| {
                entry
                    .lines
                    .iter()
                    .filter(|line| {
                        filter
                            .account
                            .as_ref()
                            .is_none_or(|code| &line.account == code)
                    })
                    .map(|line| PostedLine {
                        entry_id: entry.id,
                        line_id: line.id,
                        date: entry.date,
                        number: entry.number.clone(),
                        reference: entry.reference.clone(),
                        description: if line.description.trim().is_empty() {
                            entry.description.clone()
                        } else {
                            line.description.clone()
                        },
                        account: line.account.clone(),
                        debit: line.debit.clone(),
                        credit: line.credit.clone(),
                    })
            })
            .collect();
        lines.sort_by_key(|l| (l.date, l.entry_id, l.line_id));
        Ok(lines)
    }

    async fn get_scheme(
        &self,
        entity_label: &str,
        field_name: &str,
    ) -> LedgerResult<Option<NumberingScheme>> {
        let schemes = self.schemes.read().unwrap();
        Ok(schemes
            .get(&(entity_label.to_string(), field_name.to_string()))
            .cloned())
    }

    async fn save_scheme(&mut self, scheme: &NumberingScheme) -> LedgerResult<()> {
        self.schemes.write().unwrap().insert(
            (scheme.entity_label.clone(), scheme.field_name.clone()),
            scheme.clone(),
        );
        Ok(())
    }

    async fn next_sequence(&mut self, key: &str, period: &str, start: u64) -> LedgerResult<u64> {
        // one mutex over all counters: the whole read-increment-write is a
        // single critical section, matching the row-lock contract
        let mut sequences = self.sequences.lock().map_err(|_| {
            LedgerError::SequenceContention {
                key: key.to_string(),
                reason: "sequence lock poisoned".to_string(),
            }
        })?;
        let counter = sequences
            .entry((key.to_string(), period.to_string()))
            .or_insert(start.saturating_sub(1));
        *counter += 1;
        Ok(*counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::{NaiveDate, Utc};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn amount(n: i64) -> BigDecimal {
        BigDecimal::from(n)
    }

    fn entry(date: NaiveDate, number: &str, posted: bool) -> JournalEntry {
        JournalEntry {
            id: 0,
            number: number.to_string(),
            fiscal_year: Some(date.format("%Y").to_string().parse().unwrap()),
            journal: "GEN".to_string(),
            date,
            reference: String::new(),
            description: "entry description".to_string(),
            posted,
            posted_at: posted.then(|| Utc::now().naive_utc()),
            posted_by: None,
            created_at: Utc::now().naive_utc(),
            created_by: None,
            lines: vec![
                JournalLine::debit("1000", amount(10)),
                JournalLine::credit("4000", amount(10)),
            ],
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let mut storage = MemoryStorage::new();
        let first = storage.insert_entry(entry(d(2025, 1, 1), "A-1", false)).await.unwrap();
        let second = storage.insert_entry(entry(d(2025, 1, 2), "A-2", false)).await.unwrap();

        assert!(first.id > 0);
        assert!(second.id > first.id);
        assert!(second.lines[0].id > first.lines[1].id);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let mut storage = MemoryStorage::new();
        let other = storage.clone();

        storage
            .save_account(&Account::new("1000", "Cash", AccountType::Asset, None))
            .await
            .unwrap();
        assert!(other.get_account("1000").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_next_sequence_starts_and_increments() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.next_sequence("k", "2025", 1).await.unwrap(), 1);
        assert_eq!(storage.next_sequence("k", "2025", 1).await.unwrap(), 2);
        // other periods are independent
        assert_eq!(storage.next_sequence("k", "2026", 1).await.unwrap(), 1);
        // start only applies to counter creation
        assert_eq!(storage.next_sequence("k", "2025", 100).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_next_sequence_yields_distinct_values() {
        let storage = MemoryStorage::new();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let mut handle = storage.clone();
            handles.push(tokio::spawn(async move {
                handle.next_sequence("ledger.JournalEntry", "2025", 1).await
            }));
        }

        let mut values = Vec::new();
        for handle in handles {
            values.push(handle.await.unwrap().unwrap());
        }
        values.sort_unstable();
        let expected: Vec<u64> = (1..=32).collect();
        assert_eq!(values, expected, "no duplicates, no gaps");
    }

    #[tokio::test]
    async fn test_posted_lines_ordering_and_fallback() {
        let mut storage = MemoryStorage::new();
        let mut later = entry(d(2025, 2, 1), "A-2", true);
        later.lines[0].description = "own text".to_string();
        storage.insert_entry(later).await.unwrap();
        storage.insert_entry(entry(d(2025, 1, 1), "A-1", true)).await.unwrap();
        storage.insert_entry(entry(d(2025, 3, 1), "A-3", false)).await.unwrap();

        let lines = storage.posted_lines(&LineFilter::default()).await.unwrap();
        assert_eq!(lines.len(), 4, "draft excluded");
        assert_eq!(lines[0].number, "A-1");
        assert_eq!(lines[2].number, "A-2");
        assert_eq!(lines[2].description, "own text");
        assert_eq!(lines[3].description, "entry description", "falls back to header");
    }

    #[tokio::test]
    async fn test_line_filter_fiscal_year_precedence() {
        let mut storage = MemoryStorage::new();
        storage.insert_entry(entry(d(2025, 6, 1), "A-1", true)).await.unwrap();
        storage.insert_entry(entry(d(2024, 6, 1), "B-1", true)).await.unwrap();

        let filter = LineFilter {
            fiscal_year: Some(2025),
            // dates would match 2024 but the year wins
            date_from: Some(d(2024, 1, 1)),
            date_to: Some(d(2024, 12, 31)),
            ..LineFilter::default()
        };
        let lines = storage.posted_lines(&filter).await.unwrap();
        assert!(lines.iter().all(|l| l.number == "A-1"));
    }

    #[tokio::test]
    async fn test_line_filter_before_is_strict() {
        let mut storage = MemoryStorage::new();
        storage.insert_entry(entry(d(2025, 1, 31), "A-1", true)).await.unwrap();
        storage.insert_entry(entry(d(2025, 2, 1), "A-2", true)).await.unwrap();

        let filter = LineFilter {
            before: Some(d(2025, 2, 1)),
            ..LineFilter::default()
        };
        let lines = storage.posted_lines(&filter).await.unwrap();
        assert!(lines.iter().all(|l| l.number == "A-1"));
    }

    #[tokio::test]
    async fn test_delete_account_in_use_fails() {
        let mut storage = MemoryStorage::new();
        storage
            .save_account(&Account::new("1000", "Cash", AccountType::Asset, None))
            .await
            .unwrap();
        storage.insert_entry(entry(d(2025, 1, 1), "A-1", true)).await.unwrap();

        let err = storage.delete_account("1000").await.unwrap_err();
        assert!(matches!(err, LedgerError::ReferentialIntegrity(_)));
    }

    #[tokio::test]
    async fn test_delete_fiscal_year_with_entries_fails() {
        let mut storage = MemoryStorage::new();
        storage
            .save_fiscal_year(&FiscalYear::new(2025, d(2025, 1, 1), d(2025, 12, 31)))
            .await
            .unwrap();
        storage.insert_entry(entry(d(2025, 1, 1), "A-1", true)).await.unwrap();

        let err = storage.delete_fiscal_year(2025).await.unwrap_err();
        assert!(matches!(err, LedgerError::ReferentialIntegrity(_)));
    }

    #[tokio::test]
    async fn test_count_entries_filters() {
        let mut storage = MemoryStorage::new();
        storage.insert_entry(entry(d(2025, 1, 1), "A-1", true)).await.unwrap();
        storage.insert_entry(entry(d(2025, 2, 1), "A-2", false)).await.unwrap();

        let unposted = storage
            .count_entries(&EntryFilter::unposted_in_year(2025))
            .await
            .unwrap();
        assert_eq!(unposted, 1);
    }
}
