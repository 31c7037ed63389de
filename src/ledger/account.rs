//! Chart of accounts management

use tracing::{info, warn};

use crate::traits::*;
use crate::types::*;

/// Input row for a bulk chart import
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub parent_code: Option<String>,
    pub is_active: bool,
    pub allow_settlement: bool,
}

/// Outcome of a bulk chart import
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartImportSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub deactivated: usize,
    pub errors: Vec<String>,
}

/// Account manager for chart of accounts operations
pub struct AccountManager<S: LedgerStorage> {
    pub(crate) storage: S,
    validator: Box<dyn AccountValidator>,
}

impl<S: LedgerStorage> AccountManager<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultAccountValidator),
        }
    }

    /// Create a new account manager with custom validator
    pub fn with_validator(storage: S, validator: Box<dyn AccountValidator>) -> Self {
        Self { storage, validator }
    }

    /// Create a new account
    pub async fn create(&mut self, account: Account) -> LedgerResult<Account> {
        self.validator.validate_account(&account)?;

        if self.storage.get_account(&account.code).await?.is_some() {
            return Err(LedgerError::Validation(format!(
                "account with code '{}' already exists",
                account.code
            )));
        }
        self.check_parent(&account).await?;

        self.storage.save_account(&account).await?;
        Ok(account)
    }

    /// Get an account by code
    pub async fn get(&self, code: &str) -> LedgerResult<Option<Account>> {
        self.storage.get_account(code).await
    }

    /// Get an account by code, erroring when absent
    pub async fn get_required(&self, code: &str) -> LedgerResult<Account> {
        self.storage
            .get_account(code)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(code.to_string()))
    }

    /// List all accounts ordered by code
    pub async fn list(&self) -> LedgerResult<Vec<Account>> {
        self.storage.list_accounts(None).await
    }

    /// List accounts of one type
    pub async fn list_by_type(&self, account_type: AccountType) -> LedgerResult<Vec<Account>> {
        self.storage.list_accounts(Some(account_type)).await
    }

    /// List active accounts usable in payment settlement
    pub async fn settlement_accounts(&self) -> LedgerResult<Vec<Account>> {
        let accounts = self.list().await?;
        Ok(accounts
            .into_iter()
            .filter(|a| a.is_active && a.allow_settlement)
            .collect())
    }

    /// Update an account.
    ///
    /// The account type is frozen once any journal line references the
    /// account; retyping it would silently flip the sign convention of
    /// every historical balance.
    pub async fn update(&mut self, account: &Account) -> LedgerResult<()> {
        self.validator.validate_account(account)?;

        let existing = self.get_required(&account.code).await?;
        if existing.account_type != account.account_type
            && self.storage.account_in_use(&account.code).await?
        {
            return Err(LedgerError::Validation(format!(
                "account '{}' has journal lines; its type cannot change",
                account.code
            )));
        }
        self.check_parent(account).await?;

        self.storage.update_account(account).await
    }

    /// Deactivate an account, keeping its history intact. New journal
    /// lines will refuse it; existing lines are unaffected.
    pub async fn deactivate(&mut self, code: &str) -> LedgerResult<Account> {
        let mut account = self.get_required(code).await?;
        if account.is_active {
            account.is_active = false;
            self.storage.update_account(&account).await?;
            info!(code, "account deactivated");
        }
        Ok(account)
    }

    /// Delete an account. Fails while journal lines or child accounts
    /// reference it.
    pub async fn delete(&mut self, code: &str) -> LedgerResult<()> {
        self.get_required(code).await?;

        let children = self.children(code).await?;
        if !children.is_empty() {
            return Err(LedgerError::ReferentialIntegrity(format!(
                "account '{}' has {} child account(s)",
                code,
                children.len()
            )));
        }

        self.storage.delete_account(code).await
    }

    /// Direct children of an account
    pub async fn children(&self, code: &str) -> LedgerResult<Vec<Account>> {
        let accounts = self.list().await?;
        Ok(accounts
            .into_iter()
            .filter(|a| a.parent_code.as_deref() == Some(code))
            .collect())
    }

    /// Parent chain from the root down to the account itself
    pub async fn path(&self, code: &str) -> LedgerResult<Vec<Account>> {
        let mut path = Vec::new();
        let mut current = Some(code.to_string());

        while let Some(code) = current {
            let account = self.get_required(&code).await?;
            current = account.parent_code.clone();
            path.insert(0, account);
            if path.len() > 64 {
                return Err(LedgerError::Validation(format!(
                    "account hierarchy under '{code}' is circular or too deep"
                )));
            }
        }

        Ok(path)
    }

    /// Bulk-import a chart of accounts.
    ///
    /// Parents are linked in a second pass so row order does not matter.
    /// Existing accounts are updated when `replace_existing` is set and
    /// skipped otherwise; with `deactivate_missing` stored accounts absent
    /// from the rows are deactivated, never deleted. Row-level failures are
    /// collected rather than aborting the whole import.
    pub async fn import_chart(
        &mut self,
        rows: Vec<ChartRow>,
        replace_existing: bool,
        deactivate_missing: bool,
    ) -> LedgerResult<ChartImportSummary> {
        let mut summary = ChartImportSummary::default();

        // first pass: accounts without parent links
        for row in &rows {
            let account = Account {
                code: row.code.clone(),
                name: row.name.clone(),
                account_type: row.account_type,
                parent_code: None,
                is_active: row.is_active,
                allow_settlement: row.allow_settlement,
            };
            match self.storage.get_account(&row.code).await? {
                None => match self.create(account).await {
                    Ok(_) => summary.created += 1,
                    Err(err) => summary.errors.push(format!("{}: {err}", row.code)),
                },
                Some(_) if replace_existing => match self.update(&account).await {
                    Ok(()) => summary.updated += 1,
                    Err(err) => summary.errors.push(format!("{}: {err}", row.code)),
                },
                Some(_) => summary.skipped += 1,
            }
        }

        // second pass: parent links, now that every code exists
        for row in &rows {
            let Some(parent) = &row.parent_code else {
                continue;
            };
            let Some(mut account) = self.storage.get_account(&row.code).await? else {
                continue; // first pass already recorded the failure
            };
            if account.parent_code.as_deref() == Some(parent.as_str()) {
                continue;
            }
            account.parent_code = Some(parent.clone());
            if let Err(err) = self.update(&account).await {
                summary.errors.push(format!("{}: {err}", row.code));
            }
        }

        if deactivate_missing {
            let imported: std::collections::HashSet<&str> =
                rows.iter().map(|r| r.code.as_str()).collect();
            for account in self.list().await? {
                if account.is_active && !imported.contains(account.code.as_str()) {
                    match self.deactivate(&account.code).await {
                        Ok(_) => summary.deactivated += 1,
                        Err(err) => summary.errors.push(format!("{}: {err}", account.code)),
                    }
                }
            }
        }

        if !summary.errors.is_empty() {
            warn!(errors = summary.errors.len(), "chart import finished with errors");
        }
        info!(
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped,
            "chart import complete"
        );
        Ok(summary)
    }

    /// Seed the default chart for a fresh ledger. Present accounts are
    /// left alone; only the missing ones are created.
    pub async fn seed_default_chart(&mut self) -> LedgerResult<ChartImportSummary> {
        self.import_chart(default_chart(), false, false).await
    }

    async fn check_parent(&self, account: &Account) -> LedgerResult<()> {
        let Some(parent_code) = &account.parent_code else {
            return Ok(());
        };
        if parent_code == &account.code {
            return Err(LedgerError::Validation(format!(
                "account '{}' cannot be its own parent",
                account.code
            )));
        }
        if self.storage.get_account(parent_code).await?.is_none() {
            return Err(LedgerError::Validation(format!(
                "parent account '{parent_code}' does not exist"
            )));
        }

        // walk upward to reject cycles before they are persisted
        let mut current = Some(parent_code.clone());
        let mut hops = 0;
        while let Some(code) = current {
            if code == account.code {
                return Err(LedgerError::Validation(format!(
                    "setting parent '{}' on '{}' would create a cycle",
                    parent_code, account.code
                )));
            }
            current = self
                .storage
                .get_account(&code)
                .await?
                .and_then(|a| a.parent_code);
            hops += 1;
            if hops > 64 {
                return Err(LedgerError::Validation(
                    "account hierarchy is too deep".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// The stock nine-account chart a fresh ledger starts from
pub fn default_chart() -> Vec<ChartRow> {
    let row = |code: &str, name: &str, account_type, allow_settlement| ChartRow {
        code: code.to_string(),
        name: name.to_string(),
        account_type,
        parent_code: None,
        is_active: true,
        allow_settlement,
    };
    vec![
        row("1000", "Cash", AccountType::Asset, true),
        row("1010", "Bank", AccountType::Asset, true),
        row("1100", "Customers", AccountType::Asset, true),
        row("1200", "Inventory", AccountType::Asset, false),
        row("2000", "Suppliers", AccountType::Liability, true),
        row("3000", "Capital", AccountType::Equity, false),
        row("4000", "Sales", AccountType::Revenue, false),
        row("5000", "Purchases", AccountType::Expense, false),
        row("5100", "General & Administrative Expenses", AccountType::Expense, false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;

    #[tokio::test]
    async fn test_create_and_get() {
        let storage = MemoryStorage::new();
        let mut manager = AccountManager::new(storage);

        let account = Account::new("1000", "Cash", AccountType::Asset, None);
        manager.create(account.clone()).await.unwrap();

        let fetched = manager.get_required("1000").await.unwrap();
        assert_eq!(fetched, account);
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let storage = MemoryStorage::new();
        let mut manager = AccountManager::new(storage);

        manager
            .create(Account::new("1000", "Cash", AccountType::Asset, None))
            .await
            .unwrap();
        let err = manager
            .create(Account::new("1000", "Petty Cash", AccountType::Asset, None))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_parent_rejected() {
        let storage = MemoryStorage::new();
        let mut manager = AccountManager::new(storage);

        let err = manager
            .create(Account::new(
                "1001",
                "Petty Cash",
                AccountType::Asset,
                Some("1000".to_string()),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cycle_rejected() {
        let storage = MemoryStorage::new();
        let mut manager = AccountManager::new(storage);

        manager
            .create(Account::new("A", "Top", AccountType::Asset, None))
            .await
            .unwrap();
        manager
            .create(Account::new("B", "Mid", AccountType::Asset, Some("A".into())))
            .await
            .unwrap();

        let mut top = manager.get_required("A").await.unwrap();
        top.parent_code = Some("B".to_string());
        let err = manager.update(&top).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_path_walks_to_root() {
        let storage = MemoryStorage::new();
        let mut manager = AccountManager::new(storage);

        manager
            .create(Account::new("1", "Assets", AccountType::Asset, None))
            .await
            .unwrap();
        manager
            .create(Account::new("10", "Current", AccountType::Asset, Some("1".into())))
            .await
            .unwrap();
        manager
            .create(Account::new("100", "Cash", AccountType::Asset, Some("10".into())))
            .await
            .unwrap();

        let path = manager.path("100").await.unwrap();
        let codes: Vec<&str> = path.iter().map(|a| a.code.as_str()).collect();
        assert_eq!(codes, vec!["1", "10", "100"]);
    }

    #[tokio::test]
    async fn test_seed_default_chart() {
        let storage = MemoryStorage::new();
        let mut manager = AccountManager::new(storage);

        let summary = manager.seed_default_chart().await.unwrap();
        assert_eq!(summary.created, 9);
        assert!(summary.errors.is_empty());

        let cash = manager.get_required("1000").await.unwrap();
        assert!(cash.allow_settlement);
        let sales = manager.get_required("4000").await.unwrap();
        assert!(!sales.allow_settlement);
        assert_eq!(sales.account_type, AccountType::Revenue);

        // idempotent: the second run skips everything
        let again = manager.seed_default_chart().await.unwrap();
        assert_eq!(again.created, 0);
        assert_eq!(again.skipped, 9);
    }

    #[tokio::test]
    async fn test_import_links_parents_out_of_order() {
        let storage = MemoryStorage::new();
        let mut manager = AccountManager::new(storage);

        let rows = vec![
            ChartRow {
                code: "1001".into(),
                name: "Petty Cash".into(),
                account_type: AccountType::Asset,
                parent_code: Some("1000".into()),
                is_active: true,
                allow_settlement: true,
            },
            ChartRow {
                code: "1000".into(),
                name: "Cash".into(),
                account_type: AccountType::Asset,
                parent_code: None,
                is_active: true,
                allow_settlement: true,
            },
        ];
        let summary = manager.import_chart(rows, false, false).await.unwrap();
        assert_eq!(summary.created, 2);
        assert!(summary.errors.is_empty());

        let child = manager.get_required("1001").await.unwrap();
        assert_eq!(child.parent_code.as_deref(), Some("1000"));
    }

    #[tokio::test]
    async fn test_import_deactivates_missing() {
        let storage = MemoryStorage::new();
        let mut manager = AccountManager::new(storage);
        manager.seed_default_chart().await.unwrap();

        let rows = vec![ChartRow {
            code: "1000".into(),
            name: "Cash".into(),
            account_type: AccountType::Asset,
            parent_code: None,
            is_active: true,
            allow_settlement: true,
        }];
        let summary = manager.import_chart(rows, true, true).await.unwrap();
        assert_eq!(summary.deactivated, 8);

        assert!(manager.get_required("1000").await.unwrap().is_active);
        assert!(!manager.get_required("4000").await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_import_collects_errors_and_still_deactivates() {
        let storage = MemoryStorage::new();
        let mut manager = AccountManager::new(storage);
        manager.seed_default_chart().await.unwrap();

        // the second row points at a parent that exists nowhere, so its
        // link fails; the import must still finish the deactivation pass
        let rows = vec![
            ChartRow {
                code: "1000".into(),
                name: "Cash".into(),
                account_type: AccountType::Asset,
                parent_code: None,
                is_active: true,
                allow_settlement: true,
            },
            ChartRow {
                code: "1900".into(),
                name: "Orphan".into(),
                account_type: AccountType::Asset,
                parent_code: Some("8888".into()),
                is_active: true,
                allow_settlement: false,
            },
        ];
        let summary = manager.import_chart(rows, true, true).await.unwrap();

        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.deactivated, 8);
        assert!(manager.get_required("1000").await.unwrap().is_active);
        assert!(!manager.get_required("4000").await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_deactivate_keeps_account() {
        let storage = MemoryStorage::new();
        let mut manager = AccountManager::new(storage);

        manager
            .create(Account::new("1000", "Cash", AccountType::Asset, None))
            .await
            .unwrap();
        let account = manager.deactivate("1000").await.unwrap();
        assert!(!account.is_active);
        assert!(manager.get("1000").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_with_children_rejected() {
        let storage = MemoryStorage::new();
        let mut manager = AccountManager::new(storage);

        manager
            .create(Account::new("1", "Assets", AccountType::Asset, None))
            .await
            .unwrap();
        manager
            .create(Account::new("10", "Cash", AccountType::Asset, Some("1".into())))
            .await
            .unwrap();

        let err = manager.delete("1").await.unwrap_err();
        assert!(matches!(err, LedgerError::ReferentialIntegrity(_)));
    }
}
