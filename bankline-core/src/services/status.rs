//! Status service - account and transaction summaries

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::adapters::duckdb::DuckDbRepository;
use crate::ports::AccountRepository;

/// Status service for account summaries
pub struct StatusService {
    repository: Arc<DuckDbRepository>,
}

impl StatusService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self { repository }
    }

    /// Get overall status summary
    pub fn get_status(&self) -> Result<StatusSummary> {
        let accounts = self.repository.list_accounts()?;
        let transaction_count = self.repository.count_transactions()?;
        let by_type = self.repository.count_accounts_by_type()?;

        let total_balance = accounts
            .iter()
            .try_fold(Decimal::ZERO, |acc, a| acc.checked_add(a.balance))
            .ok_or_else(|| anyhow::anyhow!("total balance overflowed"))?;

        Ok(StatusSummary {
            total_accounts: accounts.len() as i64,
            total_transactions: transaction_count,
            total_balance,
            accounts_by_type: by_type.into_iter().collect(),
            accounts: accounts
                .into_iter()
                .map(|a| AccountSummary {
                    id: a.id.to_string(),
                    holder_name: a.holder_name,
                    account_type: a.account_type,
                    balance: a.balance,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub total_accounts: i64,
    pub total_transactions: i64,
    pub total_balance: Decimal,
    pub accounts_by_type: BTreeMap<String, i64>,
    pub accounts: Vec<AccountSummary>,
}

#[derive(Debug, Serialize)]
pub struct AccountSummary {
    pub id: String,
    pub holder_name: String,
    pub account_type: String,
    pub balance: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{AccountService, LedgerService};

    #[test]
    fn test_status_counts_and_totals() {
        let repo = Arc::new(DuckDbRepository::in_memory().unwrap());
        repo.ensure_schema().unwrap();
        let accounts = AccountService::new(repo.clone(), LedgerService::default());

        let checking = accounts.create_account("Ana Souza", "checking", Decimal::new(100, 0)).unwrap();
        let savings = accounts.create_account("Bruno Lima", "savings", Decimal::ZERO).unwrap();
        accounts.withdraw(checking.id, Decimal::new(40, 0)).unwrap();
        accounts.deposit(savings.id, Decimal::new(1050, 1)).unwrap();

        let status = StatusService::new(repo).get_status().unwrap();
        assert_eq!(status.total_accounts, 2);
        assert_eq!(status.total_transactions, 2);
        assert_eq!(status.total_balance, Decimal::new(650, 1));
        assert_eq!(status.accounts_by_type.get("checking"), Some(&1));
        assert_eq!(status.accounts_by_type.get("savings"), Some(&1));
    }
}
