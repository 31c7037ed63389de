//! Core types and data structures for the ledger system

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storage-assigned identifier for a journal entry.
pub type EntryId = i64;

/// Storage-assigned identifier for a journal line.
pub type LineId = i64;

/// Account types following standard accounting principles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Assets - what the business owns (Cash, Bank, Receivables, etc.)
    Asset,
    /// Liabilities - what the business owes (Payables, Loans, etc.)
    Liability,
    /// Equity - owner's interest in the business (Capital, Retained Earnings, etc.)
    Equity,
    /// Revenue - money earned by the business
    Revenue,
    /// Expenses - costs incurred by the business
    Expense,
}

impl AccountType {
    /// Returns the normal balance side for this account type.
    /// Assets and Expenses normally carry debit balances;
    /// Liabilities, Equity, and Revenue carry credit balances.
    pub fn normal_balance(&self) -> Side {
        match self {
            AccountType::Asset | AccountType::Expense => Side::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => Side::Credit,
        }
    }

    /// Signed balance movement for a (debit, credit) pair on this account type.
    ///
    /// Natural-debit accounts grow with debits (`debit - credit`),
    /// natural-credit accounts grow with credits (`credit - debit`).
    pub fn signed_delta(&self, debit: &BigDecimal, credit: &BigDecimal) -> BigDecimal {
        match self.normal_balance() {
            Side::Debit => debit - credit,
            Side::Credit => credit - debit,
        }
    }
}

/// The two sides of a double-entry posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Debit,
    Credit,
}

/// Node in the chart of accounts tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique, sortable account code (e.g. "1000")
    pub code: String,
    /// Human-readable account name
    pub name: String,
    /// Type of account (Asset, Liability, etc.)
    pub account_type: AccountType,
    /// Optional parent account code for hierarchical charts
    pub parent_code: Option<String>,
    /// Inactive accounts are hidden from entry forms but kept for history
    pub is_active: bool,
    /// Whether this account may be the counterparty side of
    /// customer/supplier reconciliations
    pub allow_settlement: bool,
}

impl Account {
    /// Create a new active account
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
        parent_code: Option<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type,
            parent_code,
            is_active: true,
            allow_settlement: true,
        }
    }

    /// Builder-style toggle for settlement eligibility
    pub fn with_settlement(mut self, allow: bool) -> Self {
        self.allow_settlement = allow;
        self
    }
}

/// A date range used to bucket and close accounting periods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYear {
    /// Calendar year label, unique
    pub year: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Closed years reject new entry creation and posting
    pub is_closed: bool,
}

impl FiscalYear {
    pub fn new(year: i32, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            year,
            start_date,
            end_date,
            is_closed: false,
        }
    }

    /// Whether `date` falls within [start_date, end_date]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Kinds of named ledgers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalType {
    General,
    Sales,
    Purchase,
    Cash,
    Bank,
}

/// Transaction classes a caller can request a default journal for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalPurpose {
    ManualEntry,
    SalesInvoice,
    Purchase,
    CustomerPayment,
    OpeningBalance,
}

/// A named ledger entries are booked into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    /// Unique journal code (e.g. "GEN", "CASH")
    pub code: String,
    pub name: String,
    pub journal_type: JournalType,
    /// At most one default per type; maintained by the application,
    /// not enforced by storage
    pub is_default: bool,
    pub is_active: bool,
}

impl Journal {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        journal_type: JournalType,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            journal_type,
            is_default: false,
            is_active: true,
        }
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// One side of a posting within a journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Storage-assigned id, 0 until persisted
    pub id: LineId,
    /// Account code this line posts to
    pub account: String,
    pub description: String,
    /// Debit amount, non-negative; exactly one of debit/credit is nonzero
    pub debit: BigDecimal,
    /// Credit amount, non-negative
    pub credit: BigDecimal,
    /// Display sequence within the entry
    pub order: u32,
}

impl JournalLine {
    /// Create a debit line
    pub fn debit(account: impl Into<String>, amount: BigDecimal) -> Self {
        Self {
            id: 0,
            account: account.into(),
            description: String::new(),
            debit: amount,
            credit: BigDecimal::from(0),
            order: 0,
        }
    }

    /// Create a credit line
    pub fn credit(account: impl Into<String>, amount: BigDecimal) -> Self {
        Self {
            id: 0,
            account: account.into(),
            description: String::new(),
            debit: BigDecimal::from(0),
            credit: amount,
            order: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Validate the one-side rule: exactly one of debit/credit nonzero,
    /// neither negative.
    pub fn validate(&self) -> LedgerResult<()> {
        let zero = BigDecimal::from(0);
        if self.debit < zero || self.credit < zero {
            return Err(LedgerError::Validation(format!(
                "line for account '{}' has a negative amount",
                self.account
            )));
        }
        if self.debit > zero && self.credit > zero {
            return Err(LedgerError::Validation(format!(
                "line for account '{}' cannot be both debit and credit",
                self.account
            )));
        }
        if self.debit == zero && self.credit == zero {
            return Err(LedgerError::Validation(format!(
                "line for account '{}' has neither a debit nor a credit amount",
                self.account
            )));
        }
        Ok(())
    }
}

/// Raw line row as supplied by a caller (a form, an import, an invoice
/// posting). Fully blank rows are discarded before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineInput {
    pub account: Option<String>,
    pub description: String,
    pub debit: BigDecimal,
    pub credit: BigDecimal,
}

impl LineInput {
    pub fn debit(account: impl Into<String>, amount: BigDecimal) -> Self {
        Self {
            account: Some(account.into()),
            description: String::new(),
            debit: amount,
            credit: BigDecimal::from(0),
        }
    }

    pub fn credit(account: impl Into<String>, amount: BigDecimal) -> Self {
        Self {
            account: Some(account.into()),
            description: String::new(),
            debit: BigDecimal::from(0),
            credit: amount,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// A row with no account, no description, and both amounts zero
    pub fn is_blank(&self) -> bool {
        let zero = BigDecimal::from(0);
        self.account.is_none()
            && self.description.trim().is_empty()
            && self.debit == zero
            && self.credit == zero
    }
}

/// The atomic postable unit: header plus ordered lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Storage-assigned id, 0 until persisted
    pub id: EntryId,
    /// System-generated serial, unique and immutable once assigned
    pub number: String,
    /// Owning fiscal year; resolved from `date` at creation when omitted
    pub fiscal_year: Option<i32>,
    /// Code of the journal this entry is booked into
    pub journal: String,
    pub date: NaiveDate,
    /// Free-text reference, not guaranteed unique
    pub reference: String,
    pub description: String,
    /// Posted entries are finalized and included in reports
    pub posted: bool,
    pub posted_at: Option<NaiveDateTime>,
    pub posted_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub created_by: Option<Uuid>,
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    /// Total of all debit amounts
    pub fn total_debit(&self) -> BigDecimal {
        self.lines.iter().map(|l| &l.debit).sum()
    }

    /// Total of all credit amounts
    pub fn total_credit(&self) -> BigDecimal {
        self.lines.iter().map(|l| &l.credit).sum()
    }

    /// Whether total debit equals total credit
    pub fn is_balanced(&self) -> bool {
        self.total_debit() == self.total_credit()
    }

    /// Validate the entry invariants: at least one line, every line obeys
    /// the one-side rule, and the entry balances.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.lines.is_empty() {
            return Err(LedgerError::EmptyEntry);
        }
        for line in &self.lines {
            line.validate()?;
        }
        if !self.is_balanced() {
            return Err(LedgerError::Unbalanced {
                debit: self.total_debit(),
                credit: self.total_credit(),
            });
        }
        Ok(())
    }
}

/// Errors that can occur in the ledger system
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("entry is not balanced: debit = {debit}, credit = {credit}")]
    Unbalanced {
        debit: BigDecimal,
        credit: BigDecimal,
    },
    #[error("entry has no valid lines")]
    EmptyEntry,
    #[error("no fiscal year covers {0}")]
    NoFiscalYear(NaiveDate),
    #[error("fiscal year {0} is closed")]
    ClosedFiscalYear(i32),
    #[error("entry {0} is posted and its lines cannot be modified")]
    PostedEntryImmutable(EntryId),
    #[error("invalid numbering pattern: {0}")]
    InvalidPattern(String),
    #[error("sequence contention for '{key}': {reason}")]
    SequenceContention { key: String, reason: String },
    #[error("referential integrity: {0}")]
    ReferentialIntegrity(String),
    #[error("account not found: {0}")]
    AccountNotFound(String),
    #[error("journal not found: {0}")]
    JournalNotFound(String),
    #[error("fiscal year not found: {0}")]
    FiscalYearNotFound(i32),
    #[error("entry not found: {0}")]
    EntryNotFound(EntryId),
}

impl LedgerError {
    /// Only sequence contention is worth retrying; every other error needs
    /// caller or user intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::SequenceContention { .. })
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
