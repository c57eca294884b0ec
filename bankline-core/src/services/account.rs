//! Account service - request-scoped account operations
//!
//! Every operation loads the stored row, lets the ledger rebuild the account
//! and apply the change, then persists the new balance and the transaction row
//! in one storage transaction. No account object outlives a call.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, AccountRecord, AccountType, BalanceCommit, TransactionKind, TransactionRecord};
use crate::ports::AccountRepository;
use crate::services::ledger::{LedgerOutcome, LedgerService};

/// Minimum holder name length accepted when opening an account
pub const MIN_HOLDER_NAME_LEN: usize = 3;

/// Result of a balance-changing operation
#[derive(Debug, Clone, Serialize)]
pub struct OperationReceipt {
    pub account_id: Uuid,
    pub balance: Decimal,
    pub version: i64,
    /// `None` when the operation had nothing to post (no interest accrued)
    pub transaction: Option<TransactionRecord>,
}

/// Aggregates over an account's transaction log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountStatistics {
    pub account_id: Uuid,
    pub total_deposits: Decimal,
    pub total_withdrawals: Decimal,
    pub total_interest: Decimal,
    pub transaction_count: usize,
    pub current_balance: Decimal,
}

/// An account with its derived figures
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: Uuid,
    pub holder_name: String,
    pub account_type: AccountType,
    pub balance: Decimal,
    pub overdraft_limit: Decimal,
    pub available_to_withdraw: Decimal,
    /// Interest the account would accrue now
    pub projected_yield: Decimal,
    /// Informational only; never deducted
    pub maintenance_fee: Decimal,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account operations over a repository
pub struct AccountService {
    repository: Arc<dyn AccountRepository>,
    ledger: LedgerService,
}

impl AccountService {
    pub fn new(repository: Arc<dyn AccountRepository>, ledger: LedgerService) -> Self {
        Self { repository, ledger }
    }

    pub fn ledger(&self) -> &LedgerService {
        &self.ledger
    }

    /// Open a new account with a zero balance
    ///
    /// The overdraft limit only applies to checking accounts and is stored
    /// as zero for savings.
    pub fn create_account(
        &self,
        holder_name: &str,
        account_type: &str,
        overdraft_limit: Decimal,
    ) -> Result<AccountRecord> {
        let account_type: AccountType = account_type.parse()?;

        let holder_name = holder_name.trim();
        if holder_name.chars().count() < MIN_HOLDER_NAME_LEN {
            return Err(Error::validation(format!(
                "holder name must have at least {} characters",
                MIN_HOLDER_NAME_LEN
            )));
        }
        if overdraft_limit < Decimal::ZERO {
            return Err(Error::validation("overdraft limit cannot be negative"));
        }

        let overdraft_limit = match account_type {
            AccountType::Checking => overdraft_limit,
            AccountType::Savings => Decimal::ZERO,
        };

        let account = Account::open(holder_name, self.ledger.kind_for(account_type, overdraft_limit))?;
        let new_account = self.ledger.dehydrate(&account).into_new_account();
        self.repository.insert_account(&new_account)
    }

    pub fn get_account(&self, id: Uuid) -> Result<AccountRecord> {
        self.repository
            .get_account(id)?
            .ok_or_else(|| Error::account_not_found(id))
    }

    pub fn list_accounts(&self) -> Result<Vec<AccountRecord>> {
        self.repository.list_accounts()
    }

    /// Delete an account together with its transactions
    pub fn delete_account(&self, id: Uuid) -> Result<()> {
        if !self.repository.delete_account(id)? {
            return Err(Error::account_not_found(id));
        }
        Ok(())
    }

    pub fn deposit(&self, id: Uuid, amount: Decimal) -> Result<OperationReceipt> {
        self.run(id, |ledger, account| ledger.record_deposit(account, amount).map(Some))
    }

    pub fn withdraw(&self, id: Uuid, amount: Decimal) -> Result<OperationReceipt> {
        self.run(id, |ledger, account| ledger.record_withdrawal(account, amount).map(Some))
    }

    /// Credit accrued interest; a no-op receipt when nothing accrued
    pub fn apply_interest(&self, id: Uuid) -> Result<OperationReceipt> {
        self.run(id, |ledger, account| ledger.record_interest(account))
    }

    /// Transactions of an account, newest first
    pub fn list_transactions(&self, id: Uuid) -> Result<Vec<TransactionRecord>> {
        self.get_account(id)?;
        let mut transactions = self.repository.list_transactions(id)?;
        transactions.reverse();
        Ok(transactions)
    }

    pub fn statistics(&self, id: Uuid) -> Result<AccountStatistics> {
        let record = self.get_account(id)?;
        let transactions = self.repository.list_transactions(id)?;

        let total = |kind: TransactionKind| -> Result<Decimal> {
            transactions
                .iter()
                .filter(|t| t.kind == kind)
                .try_fold(Decimal::ZERO, |acc, t| {
                    acc.checked_add(t.amount)
                        .ok_or_else(|| Error::validation("transaction total overflowed"))
                })
        };

        Ok(AccountStatistics {
            account_id: id,
            total_deposits: total(TransactionKind::Deposit)?,
            total_withdrawals: total(TransactionKind::Withdrawal)?,
            total_interest: total(TransactionKind::Interest)?,
            transaction_count: transactions.len(),
            current_balance: record.balance,
        })
    }

    /// The account with its available amount, yield and maintenance fee
    pub fn describe(&self, id: Uuid) -> Result<AccountView> {
        let record = self.get_account(id)?;
        let account = self.ledger.load_account(&record)?;

        Ok(AccountView {
            id: record.id,
            holder_name: record.holder_name,
            account_type: account.account_type(),
            balance: account.balance(),
            overdraft_limit: account.kind().overdraft_limit(),
            available_to_withdraw: account.available_to_withdraw(),
            projected_yield: account.compute_yield()?,
            maintenance_fee: account.compute_maintenance_fee()?,
            version: record.version,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    /// Load, apply one ledger operation, persist
    fn run<F>(&self, id: Uuid, operation: F) -> Result<OperationReceipt>
    where
        F: FnOnce(&LedgerService, &mut Account) -> Result<Option<LedgerOutcome>>,
    {
        let record = self.get_account(id)?;
        let mut account = self.ledger.load_account(&record)?;

        let Some(outcome) = operation(&self.ledger, &mut account)? else {
            return Ok(OperationReceipt {
                account_id: id,
                balance: record.balance,
                version: record.version,
                transaction: None,
            });
        };

        let updated = self.repository.commit(&BalanceCommit {
            account_id: id,
            expected_version: record.version,
            new_balance: outcome.new_balance,
            transaction: outcome.record.clone(),
        })?;

        Ok(OperationReceipt {
            account_id: id,
            balance: updated.balance,
            version: updated.version,
            transaction: Some(outcome.record),
        })
    }
}
