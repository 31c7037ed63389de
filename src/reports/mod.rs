//! Reporting projections over posted journal lines
//!
//! Reports never read a stored balance; every figure is recomputed from
//! the posted lines in scope, so a report can never disagree with the
//! journal it is derived from.

use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::traits::{LedgerStorage, LineFilter};
use crate::types::*;

/// Scope selector shared by the reports. A fiscal year takes precedence
/// over an explicit date window when both are given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportScope {
    pub fiscal_year: Option<i32>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl ReportScope {
    pub fn fiscal_year(year: i32) -> Self {
        Self {
            fiscal_year: Some(year),
            ..Self::default()
        }
    }

    pub fn date_range(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            fiscal_year: None,
            date_from: Some(from),
            date_to: Some(to),
        }
    }

    fn line_filter(&self) -> LineFilter {
        if self.fiscal_year.is_some() {
            LineFilter {
                fiscal_year: self.fiscal_year,
                ..LineFilter::default()
            }
        } else {
            LineFilter {
                date_from: self.date_from,
                date_to: self.date_to,
                ..LineFilter::default()
            }
        }
    }
}

/// One account's totals in a trial balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub debit: BigDecimal,
    pub credit: BigDecimal,
}

/// Trial balance over the posted lines in scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit: BigDecimal,
    pub total_credit: BigDecimal,
}

impl TrialBalance {
    /// A trial balance over only-posted, individually balanced entries
    /// must always balance; a false here means corrupted data.
    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }
}

/// One movement row in an account ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountLedgerRow {
    pub date: NaiveDate,
    pub entry_id: EntryId,
    pub number: String,
    pub reference: String,
    pub description: String,
    pub debit: BigDecimal,
    pub credit: BigDecimal,
    /// Running balance after this row, signed by the account's normal side
    pub balance: BigDecimal,
}

/// Movement history of a single account with running balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountLedger {
    pub account: Account,
    /// Signed balance accumulated strictly before the window
    pub opening_balance: BigDecimal,
    pub rows: Vec<AccountLedgerRow>,
    pub closing_balance: BigDecimal,
}

/// Report generator reading posted lines from storage
pub struct Reports<S: LedgerStorage> {
    storage: S,
}

impl<S: LedgerStorage> Reports<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Build a trial balance: per-account debit and credit sums over the
    /// posted lines in scope, one row per account that moved, ordered by
    /// account code. Debit and credit are kept as independent sums, not
    /// netted.
    pub async fn trial_balance(&self, scope: &ReportScope) -> LedgerResult<TrialBalance> {
        let lines = self.storage.posted_lines(&scope.line_filter()).await?;
        debug!(lines = lines.len(), "trial balance input");

        let mut per_account: BTreeMap<String, (BigDecimal, BigDecimal)> = BTreeMap::new();
        for line in &lines {
            let sums = per_account
                .entry(line.account.clone())
                .or_insert_with(|| (BigDecimal::from(0), BigDecimal::from(0)));
            sums.0 += &line.debit;
            sums.1 += &line.credit;
        }

        let mut rows = Vec::with_capacity(per_account.len());
        let mut total_debit = BigDecimal::from(0);
        let mut total_credit = BigDecimal::from(0);
        for (code, (debit, credit)) in per_account {
            let account = self
                .storage
                .get_account(&code)
                .await?
                .ok_or_else(|| LedgerError::AccountNotFound(code.clone()))?;
            total_debit += &debit;
            total_credit += &credit;
            rows.push(TrialBalanceRow {
                code,
                name: account.name,
                account_type: account.account_type,
                debit,
                credit,
            });
        }

        Ok(TrialBalance {
            rows,
            total_debit,
            total_credit,
        })
    }

    /// Build the movement history of one account over the given scope.
    ///
    /// A fiscal year scope resolves to the year's start and end dates, so
    /// the opening balance folds in everything booked before the year
    /// began. The opening balance is the signed sum of posted lines
    /// strictly before the window; each row then carries the running
    /// balance after applying its own movement. Rows come back in posting
    /// order, ties broken by entry id then line id.
    pub async fn account_ledger(
        &self,
        account_code: &str,
        scope: &ReportScope,
    ) -> LedgerResult<AccountLedger> {
        let account = self
            .storage
            .get_account(account_code)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_code.to_string()))?;

        let (date_from, date_to) = match scope.fiscal_year {
            Some(year) => {
                let fy = self
                    .storage
                    .get_fiscal_year(year)
                    .await?
                    .ok_or(LedgerError::FiscalYearNotFound(year))?;
                (Some(fy.start_date), Some(fy.end_date))
            }
            None => (scope.date_from, scope.date_to),
        };

        let mut balance = BigDecimal::from(0);
        if let Some(from) = date_from {
            let prior = self
                .storage
                .posted_lines(&LineFilter {
                    account: Some(account_code.to_string()),
                    before: Some(from),
                    ..LineFilter::default()
                })
                .await?;
            for line in &prior {
                balance += account.account_type.signed_delta(&line.debit, &line.credit);
            }
        }
        let opening_balance = balance.clone();

        let lines = self
            .storage
            .posted_lines(&LineFilter {
                account: Some(account_code.to_string()),
                date_from,
                date_to,
                ..LineFilter::default()
            })
            .await?;

        let mut rows = Vec::with_capacity(lines.len());
        for line in lines {
            balance += account.account_type.signed_delta(&line.debit, &line.credit);
            rows.push(AccountLedgerRow {
                date: line.date,
                entry_id: line.entry_id,
                number: line.number,
                reference: line.reference,
                description: line.description,
                debit: line.debit,
                credit: line.credit,
                balance: balance.clone(),
            });
        }

        Ok(AccountLedger {
            account,
            opening_balance,
            rows,
            closing_balance: balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::{EntryBuilder, EntryEngine};
    use crate::utils::memory_storage::MemoryStorage;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn amount(n: i64) -> BigDecimal {
        BigDecimal::from(n)
    }

    async fn seeded() -> (MemoryStorage, EntryEngine<MemoryStorage>) {
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
        let engine = EntryEngine::new(storage.clone());
        (storage, engine)
    }

    async fn post_simple(
        engine: &mut EntryEngine<MemoryStorage>,
        date: NaiveDate,
        debit_account: &str,
        credit_account: &str,
        value: i64,
    ) -> JournalEntry {
        let input = EntryBuilder::new("GEN", date)
            .debit(debit_account, amount(value))
            .credit(credit_account, amount(value))
            .build()
            .unwrap();
        let entry = engine.create(input).await.unwrap();
        engine.post(entry.id, None).await.unwrap()
    }

    #[tokio::test]
    async fn test_trial_balance_balances_and_groups() {
        let (storage, mut engine) = seeded().await;

        post_simple(&mut engine, d(2025, 2, 1), "1000", "4000", 100).await;
        post_simple(&mut engine, d(2025, 3, 1), "1000", "4000", 50).await;
        post_simple(&mut engine, d(2025, 4, 1), "5000", "1000", 30).await;

        let reports = Reports::new(storage);
        let tb = reports
            .trial_balance(&ReportScope::fiscal_year(2025))
            .await
            .unwrap();

        assert!(tb.is_balanced());
        assert_eq!(tb.total_debit, amount(180));

        let codes: Vec<&str> = tb.rows.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["1000", "4000", "5000"], "ordered by code");

        let cash = &tb.rows[0];
        assert_eq!(cash.debit, amount(150));
        assert_eq!(cash.credit, amount(30));
        let sales = &tb.rows[1];
        assert_eq!(sales.debit, amount(0));
        assert_eq!(sales.credit, amount(150));
    }

    #[tokio::test]
    async fn test_trial_balance_ignores_drafts() {
        let (storage, mut engine) = seeded().await;

        post_simple(&mut engine, d(2025, 2, 1), "1000", "4000", 100).await;
        // a draft that must not appear
        let draft = EntryBuilder::new("GEN", d(2025, 2, 2))
            .debit("1000", amount(999))
            .credit("4000", amount(999))
            .build()
            .unwrap();
        engine.create(draft).await.unwrap();

        let reports = Reports::new(storage);
        let tb = reports
            .trial_balance(&ReportScope::fiscal_year(2025))
            .await
            .unwrap();
        assert_eq!(tb.total_debit, amount(100));
    }

    #[tokio::test]
    async fn test_trial_balance_date_window() {
        let (storage, mut engine) = seeded().await;

        post_simple(&mut engine, d(2025, 1, 15), "1000", "4000", 10).await;
        post_simple(&mut engine, d(2025, 6, 15), "1000", "4000", 20).await;

        let reports = Reports::new(storage);
        let tb = reports
            .trial_balance(&ReportScope::date_range(d(2025, 6, 1), d(2025, 6, 30)))
            .await
            .unwrap();
        assert_eq!(tb.total_debit, amount(20));
    }

    #[tokio::test]
    async fn test_empty_scope_is_empty_and_balanced() {
        let (storage, _engine) = seeded().await;

        let reports = Reports::new(storage);
        let tb = reports
            .trial_balance(&ReportScope::fiscal_year(2025))
            .await
            .unwrap();
        assert!(tb.rows.is_empty());
        assert!(tb.is_balanced());
        assert_eq!(tb.total_debit, amount(0));
    }

    #[tokio::test]
    async fn test_account_ledger_running_balance() {
        let (storage, mut engine) = seeded().await;

        // before the window: cash up by 100
        post_simple(&mut engine, d(2025, 1, 10), "1000", "4000", 100).await;
        // inside the window
        post_simple(&mut engine, d(2025, 2, 5), "1000", "4000", 40).await;
        post_simple(&mut engine, d(2025, 2, 20), "5000", "1000", 25).await;

        let reports = Reports::new(storage);
        let ledger = reports
            .account_ledger("1000", &ReportScope::date_range(d(2025, 2, 1), d(2025, 2, 28)))
            .await
            .unwrap();

        assert_eq!(ledger.opening_balance, amount(100));
        assert_eq!(ledger.rows.len(), 2);
        assert_eq!(ledger.rows[0].balance, amount(140));
        assert_eq!(ledger.rows[1].balance, amount(115));
        assert_eq!(ledger.closing_balance, amount(115));
    }

    #[tokio::test]
    async fn test_account_ledger_credit_normal_sign() {
        let (storage, mut engine) = seeded().await;

        post_simple(&mut engine, d(2025, 2, 5), "1000", "4000", 80).await;

        let reports = Reports::new(storage);
        let ledger = reports
            .account_ledger("4000", &ReportScope::date_range(d(2025, 2, 1), d(2025, 2, 28)))
            .await
            .unwrap();

        // revenue grows with credits
        assert_eq!(ledger.closing_balance, amount(80));
    }

    #[tokio::test]
    async fn test_account_ledger_fiscal_year_scope() {
        let (mut storage, mut engine) = seeded().await;
        storage
            .save_fiscal_year(&FiscalYear::new(2024, d(2024, 1, 1), d(2024, 12, 31)))
            .await
            .unwrap();

        // prior year feeds the opening balance, current year the rows
        post_simple(&mut engine, d(2024, 11, 5), "1000", "4000", 300).await;
        post_simple(&mut engine, d(2025, 3, 1), "1000", "4000", 70).await;

        let reports = Reports::new(storage);
        let ledger = reports
            .account_ledger("1000", &ReportScope::fiscal_year(2025))
            .await
            .unwrap();

        assert_eq!(ledger.opening_balance, amount(300));
        assert_eq!(ledger.rows.len(), 1);
        assert_eq!(ledger.closing_balance, amount(370));
    }

    #[tokio::test]
    async fn test_account_ledger_unknown_fiscal_year() {
        let (storage, _engine) = seeded().await;

        let reports = Reports::new(storage);
        let err = reports
            .account_ledger("1000", &ReportScope::fiscal_year(1999))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::FiscalYearNotFound(1999)));
    }

    #[tokio::test]
    async fn test_account_ledger_unknown_account() {
        let (storage, _engine) = seeded().await;

        let reports = Reports::new(storage);
        let err = reports
            .account_ledger("9999", &ReportScope::fiscal_year(2025))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(_)));
    }
}
