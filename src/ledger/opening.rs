//! Opening balance import
//!
//! Brings account balances carried in from a previous system into the
//! ledger as a single posted entry dated just before the target fiscal
//! year opens, so the year itself starts from the imported position.

use bigdecimal::BigDecimal;
use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::ledger::entry::assign_entry_number;
use crate::ledger::fiscal_year::FiscalYearRegistry;
use crate::ledger::journal::{JournalRegistry, LedgerSettings};
use crate::numbering::NumberingService;
use crate::traits::{EntryFilter, LedgerStorage};
use crate::types::*;

/// One account balance carried in from outside the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct OpeningBalanceRow {
    pub account: String,
    pub debit: BigDecimal,
    pub credit: BigDecimal,
}

impl OpeningBalanceRow {
    pub fn debit(account: impl Into<String>, amount: BigDecimal) -> Self {
        Self {
            account: account.into(),
            debit: amount,
            credit: BigDecimal::from(0),
        }
    }

    pub fn credit(account: impl Into<String>, amount: BigDecimal) -> Self {
        Self {
            account: account.into(),
            debit: BigDecimal::from(0),
            credit: amount,
        }
    }
}

/// Imports opening balances as a posted entry, replacing any earlier
/// import for the same year
pub struct OpeningBalanceImporter<S: LedgerStorage + Clone> {
    storage: S,
    fiscal_years: FiscalYearRegistry<S>,
    journals: JournalRegistry<S>,
    numbering: NumberingService<S>,
}

impl<S: LedgerStorage + Clone> OpeningBalanceImporter<S> {
    pub fn new(storage: S) -> Self {
        Self::with_settings(storage, LedgerSettings::default())
    }

    pub fn with_settings(storage: S, settings: LedgerSettings) -> Self {
        Self {
            fiscal_years: FiscalYearRegistry::new(storage.clone()),
            journals: JournalRegistry::with_settings(storage.clone(), settings),
            numbering: NumberingService::new(storage.clone()),
            storage,
        }
    }

    /// Import the balances for `year`.
    ///
    /// The rows must balance as a whole. The entry lands on the previous
    /// fiscal year's end date when that year is registered, otherwise on
    /// the day before `year` starts with no fiscal year attached. Running
    /// the import again for the same year replaces the earlier entry.
    pub async fn import(
        &mut self,
        year: i32,
        rows: Vec<OpeningBalanceRow>,
        actor: Option<Uuid>,
    ) -> LedgerResult<JournalEntry> {
        let fiscal_year = self.fiscal_years.get_required(year).await?;
        if fiscal_year.is_closed {
            return Err(LedgerError::ClosedFiscalYear(year));
        }

        let rows: Vec<OpeningBalanceRow> = rows
            .into_iter()
            .filter(|row| {
                let zero = BigDecimal::from(0);
                row.debit != zero || row.credit != zero
            })
            .collect();
        if rows.is_empty() {
            return Err(LedgerError::EmptyEntry);
        }

        let total_debit: BigDecimal = rows.iter().map(|r| &r.debit).sum();
        let total_credit: BigDecimal = rows.iter().map(|r| &r.credit).sum();
        if total_debit != total_credit {
            return Err(LedgerError::Unbalanced {
                debit: total_debit,
                credit: total_credit,
            });
        }

        let mut lines = Vec::with_capacity(rows.len());
        for (order, row) in rows.iter().enumerate() {
            self.storage
                .get_account(&row.account)
                .await?
                .ok_or_else(|| LedgerError::AccountNotFound(row.account.clone()))?;
            let line = JournalLine {
                id: 0,
                account: row.account.clone(),
                description: String::new(),
                debit: row.debit.clone(),
                credit: row.credit.clone(),
                order: order as u32,
            };
            line.validate()?;
            lines.push(line);
        }

        let previous = self.fiscal_years.get(year - 1).await?;
        let (date, entry_year) = match previous {
            Some(prev) => (prev.end_date, Some(prev.year)),
            None => (fiscal_year.start_date - Duration::days(1), None),
        };

        let journal = self
            .journals
            .default_for(JournalPurpose::OpeningBalance)
            .await?
            .ok_or_else(|| {
                LedgerError::JournalNotFound("no journal available for opening balances".into())
            })?;

        let reference = format!("OPENING-{year}");
        self.replace_previous_import(&journal.code, &reference).await?;

        let number =
            assign_entry_number(&self.storage, &mut self.numbering, &journal.code, date).await?;

        let now = Utc::now().naive_utc();
        let entry = JournalEntry {
            id: 0,
            number,
            fiscal_year: entry_year,
            journal: journal.code,
            date,
            reference,
            description: format!("Opening balances for {year}"),
            posted: true,
            posted_at: Some(now),
            posted_by: actor,
            created_at: now,
            created_by: actor,
            lines,
        };

        let entry = self.storage.insert_entry(entry).await?;
        info!(year, entry = entry.id, number = %entry.number, "opening balances imported");
        Ok(entry)
    }

    /// References are not unique across the ledger, so the lookup is
    /// scoped to the opening journal. Entries elsewhere that happen to
    /// reuse the reference text are left alone.
    async fn replace_previous_import(&mut self, journal: &str, reference: &str) -> LedgerResult<()> {
        let filter = EntryFilter {
            journal: Some(journal.to_string()),
            ..EntryFilter::default()
        };
        for entry in self.storage.list_entries(&filter).await? {
            if entry.reference == reference {
                self.storage.delete_entry(entry.id).await?;
                info!(entry = entry.id, number = %entry.number, "replaced earlier opening import");
            }
        }
        Ok(())
    }
}
