//! Validation utilities

use crate::traits::*;
use crate::types::*;

/// Validate that an account code is usable as a key
pub fn validate_account_code(code: &str) -> LedgerResult<()> {
    if code.trim().is_empty() {
        return Err(LedgerError::Validation(
            "account code cannot be empty".to_string(),
        ));
    }

    if code.len() > 50 {
        return Err(LedgerError::Validation(
            "account code cannot exceed 50 characters".to_string(),
        ));
    }

    // alphanumeric, dashes, underscores and dots only
    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(LedgerError::Validation(
            "account code can only contain alphanumeric characters, dashes, underscores and dots"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate that an account name fits the schema
pub fn validate_account_name(name: &str) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation(
            "account name cannot be empty".to_string(),
        ));
    }

    if name.len() > 100 {
        return Err(LedgerError::Validation(
            "account name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate that an entry description fits the schema
pub fn validate_description(description: &str) -> LedgerResult<()> {
    if description.len() > 500 {
        return Err(LedgerError::Validation(
            "description cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}

/// Enhanced entry validator with detailed checks
pub struct StrictEntryValidator;

impl EntryValidator for StrictEntryValidator {
    fn validate_entry(&self, entry: &JournalEntry) -> LedgerResult<()> {
        // basic invariants first
        entry.validate()?;

        validate_description(&entry.description)?;

        for line in &entry.lines {
            validate_account_code(&line.account)?;
            validate_description(&line.description)?;
        }

        // the same account must not appear twice on the same side
        let zero = bigdecimal::BigDecimal::from(0);
        let mut seen = std::collections::HashSet::new();
        for line in &entry.lines {
            let side = if line.debit > zero {
                Side::Debit
            } else {
                Side::Credit
            };
            if !seen.insert((line.account.as_str(), side)) {
                return Err(LedgerError::Validation(format!(
                    "account '{}' appears multiple times on the {side:?} side",
                    line.account
                )));
            }
        }

        Ok(())
    }
}

/// Enhanced account validator with detailed checks
pub struct StrictAccountValidator;

impl AccountValidator for StrictAccountValidator {
    fn validate_account(&self, account: &Account) -> LedgerResult<()> {
        validate_account_code(&account.code)?;
        validate_account_name(&account.name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::{NaiveDate, Utc};

    fn entry_with_lines(lines: Vec<JournalLine>) -> JournalEntry {
        JournalEntry {
            id: 0,
            number: "GEN-2025-0001".to_string(),
            fiscal_year: Some(2025),
            journal: "GEN".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            reference: String::new(),
            description: "test".to_string(),
            posted: false,
            posted_at: None,
            posted_by: None,
            created_at: Utc::now().naive_utc(),
            created_by: None,
            lines,
        }
    }

    #[test]
    fn test_account_code_rules() {
        assert!(validate_account_code("1000").is_ok());
        assert!(validate_account_code("ASSET-1000_a.b").is_ok());
        assert!(validate_account_code("").is_err());
        assert!(validate_account_code("has space").is_err());
        assert!(validate_account_code(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_strict_validator_rejects_duplicate_side() {
        let entry = entry_with_lines(vec![
            JournalLine::debit("1000", BigDecimal::from(50)),
            JournalLine::debit("1000", BigDecimal::from(50)),
            JournalLine::credit("4000", BigDecimal::from(100)),
        ]);
        let err = StrictEntryValidator.validate_entry(&entry).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_strict_validator_allows_same_account_both_sides() {
        let entry = entry_with_lines(vec![
            JournalLine::debit("1000", BigDecimal::from(50)),
            JournalLine::credit("1000", BigDecimal::from(50)),
        ]);
        assert!(StrictEntryValidator.validate_entry(&entry).is_ok());
    }
}
