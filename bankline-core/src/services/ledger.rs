//! Ledger service - rehydrate, mutate, dehydrate
//!
//! Turns stored rows into domain accounts with the configured rates, runs one
//! operation on them and hands back what has to be persisted. It never talks
//! to storage itself.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::config::{default_fee_rate, default_interest_rate, Config};
use crate::domain::result::{Error, Result};
use crate::domain::{
    Account, AccountKind, AccountRecord, AccountType, NewAccount, Transaction, TransactionRecord,
};

/// What one applied operation produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerOutcome {
    pub new_balance: Decimal,
    pub record: TransactionRecord,
}

/// Persistable fields of an account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountState {
    pub id: Option<Uuid>,
    pub holder_name: String,
    pub account_type: AccountType,
    pub balance: Decimal,
    pub overdraft_limit: Decimal,
}

impl AccountState {
    /// Insert shape for an account that has not been stored yet
    pub fn into_new_account(self) -> NewAccount {
        NewAccount {
            holder_name: self.holder_name,
            account_type: self.account_type.as_str().to_string(),
            balance: self.balance,
            overdraft_limit: self.overdraft_limit,
        }
    }
}

/// Stateless ledger operations over domain accounts
#[derive(Debug, Clone)]
pub struct LedgerService {
    savings_interest_rate: Decimal,
    checking_fee_rate: Decimal,
}

impl Default for LedgerService {
    fn default() -> Self {
        Self::new(default_interest_rate(), default_fee_rate())
    }
}

impl LedgerService {
    pub fn new(savings_interest_rate: Decimal, checking_fee_rate: Decimal) -> Self {
        Self {
            savings_interest_rate,
            checking_fee_rate,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.savings_interest_rate, config.checking_fee_rate)
    }

    pub fn savings_interest_rate(&self) -> Decimal {
        self.savings_interest_rate
    }

    pub fn checking_fee_rate(&self) -> Decimal {
        self.checking_fee_rate
    }

    /// Variant rules for an account type, with the configured rates attached
    pub fn kind_for(&self, account_type: AccountType, overdraft_limit: Decimal) -> AccountKind {
        match account_type {
            AccountType::Checking => AccountKind::checking(overdraft_limit, self.checking_fee_rate),
            AccountType::Savings => AccountKind::savings(self.savings_interest_rate),
        }
    }

    /// Rebuild an account from its row, with an empty transaction log
    pub fn load_account(&self, record: &AccountRecord) -> Result<Account> {
        self.load_account_with_history(record, &[])
    }

    /// Rebuild an account from its row and its stored transactions
    pub fn load_account_with_history(
        &self,
        record: &AccountRecord,
        history: &[TransactionRecord],
    ) -> Result<Account> {
        let account_type: AccountType = record.account_type.parse()?;
        let kind = self.kind_for(account_type, record.overdraft_limit);

        let transactions = history
            .iter()
            .map(|row| {
                if row.account_id != record.id {
                    return Err(Error::validation(format!(
                        "transaction {} does not belong to account {}",
                        row.id, record.id
                    )));
                }
                Transaction::at(row.kind, row.amount, row.timestamp)
            })
            .collect::<Result<Vec<_>>>()?;

        Account::restore(
            record.id,
            record.holder_name.clone(),
            kind,
            record.balance,
            transactions,
        )
    }

    pub fn record_deposit(&self, account: &mut Account, amount: Decimal) -> Result<LedgerOutcome> {
        let id = stored_id(account)?;
        account.deposit(amount)?;
        outcome(id, account)
    }

    pub fn record_withdrawal(&self, account: &mut Account, amount: Decimal) -> Result<LedgerOutcome> {
        let id = stored_id(account)?;
        account.withdraw(amount)?;
        outcome(id, account)
    }

    /// Credit accrued interest; `None` when the account earned nothing
    pub fn record_interest(&self, account: &mut Account) -> Result<Option<LedgerOutcome>> {
        let id = stored_id(account)?;
        let credited = account.apply_interest()?;
        if credited.is_zero() {
            return Ok(None);
        }
        outcome(id, account).map(Some)
    }

    /// Apply an already built transaction through the dispatch path
    pub fn execute(&self, account: &mut Account, transaction: Transaction) -> Result<LedgerOutcome> {
        let id = stored_id(account)?;
        transaction.apply(account)?;
        outcome(id, account)
    }

    /// Persistable fields of an account
    pub fn dehydrate(&self, account: &Account) -> AccountState {
        AccountState {
            id: account.id(),
            holder_name: account.holder_name().to_string(),
            account_type: account.account_type(),
            balance: account.balance(),
            overdraft_limit: account.kind().overdraft_limit(),
        }
    }
}

fn stored_id(account: &Account) -> Result<Uuid> {
    account
        .id()
        .ok_or_else(|| Error::validation("account has not been stored yet"))
}

fn outcome(id: Uuid, account: &Account) -> Result<LedgerOutcome> {
    let applied = account
        .last_transaction()
        .ok_or_else(|| Error::Other("operation left no transaction".to_string()))?;
    Ok(LedgerOutcome {
        new_balance: account.balance(),
        record: TransactionRecord::from_transaction(id, applied),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionKind;
    use chrono::Utc;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn row(account_type: &str, balance: &str, overdraft: &str) -> AccountRecord {
        AccountRecord {
            id: Uuid::new_v4(),
            holder_name: "Ana Souza".to_string(),
            account_type: account_type.to_string(),
            balance: dec(balance),
            overdraft_limit: dec(overdraft),
            version: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_load_picks_variant_and_rates() {
        let ledger = LedgerService::new(dec("0.05"), dec("0.10"));

        let checking = ledger.load_account(&row("checking", "-20", "100")).unwrap();
        assert_eq!(
            checking.kind(),
            &AccountKind::checking(dec("100"), dec("0.10"))
        );

        let savings = ledger.load_account(&row("savings", "20", "0")).unwrap();
        assert_eq!(savings.kind(), &AccountKind::savings(dec("0.05")));
        assert!(savings.transactions().is_empty());
    }

    #[test]
    fn test_load_unknown_type() {
        let ledger = LedgerService::default();
        match ledger.load_account(&row("brokerage", "0", "0")) {
            Err(Error::UnknownAccountType(t)) => assert_eq!(t, "brokerage"),
            other => panic!("expected UnknownAccountType, got {:?}", other),
        }
    }

    #[test]
    fn test_load_with_history_keeps_order() {
        let ledger = LedgerService::default();
        let record = row("savings", "70", "0");
        let history: Vec<TransactionRecord> = [("100", TransactionKind::Deposit), ("30", TransactionKind::Withdrawal)]
            .iter()
            .map(|(amount, kind)| TransactionRecord {
                id: Uuid::new_v4(),
                account_id: record.id,
                kind: *kind,
                amount: dec(amount),
                timestamp: Utc::now(),
            })
            .collect();

        let account = ledger.load_account_with_history(&record, &history).unwrap();
        let kinds: Vec<_> = account.transactions().iter().map(|t| t.kind()).collect();
        assert_eq!(kinds, vec![TransactionKind::Deposit, TransactionKind::Withdrawal]);
    }

    #[test]
    fn test_record_withdrawal_reports_new_balance() {
        let ledger = LedgerService::default();
        let record = row("checking", "0", "200");
        let mut account = ledger.load_account(&record).unwrap();

        let outcome = ledger.record_withdrawal(&mut account, dec("150")).unwrap();
        assert_eq!(outcome.new_balance, dec("-150"));
        assert_eq!(outcome.record.account_id, record.id);
        assert_eq!(outcome.record.kind, TransactionKind::Withdrawal);
        assert_eq!(outcome.record.amount, dec("150"));
        assert_eq!(outcome.record.timestamp, account.last_transaction().unwrap().timestamp());

        assert!(matches!(
            ledger.record_withdrawal(&mut account, dec("60")),
            Err(Error::InsufficientFunds { .. })
        ));
        assert_eq!(account.balance(), dec("-150"));
    }

    #[test]
    fn test_record_interest() {
        let ledger = LedgerService::default();
        let mut account = ledger.load_account(&row("savings", "1000", "0")).unwrap();
        let outcome = ledger.record_interest(&mut account).unwrap().unwrap();
        assert_eq!(outcome.new_balance, dec("1050"));
        assert_eq!(outcome.record.amount, dec("50"));

        let mut empty = ledger.load_account(&row("savings", "0", "0")).unwrap();
        assert!(ledger.record_interest(&mut empty).unwrap().is_none());

        let mut checking = ledger.load_account(&row("checking", "500", "0")).unwrap();
        assert!(ledger.record_interest(&mut checking).unwrap().is_none());
    }

    #[test]
    fn test_execute_matches_direct_path() {
        let ledger = LedgerService::default();
        let record = row("savings", "10", "0");
        let mut direct = ledger.load_account(&record).unwrap();
        let mut dispatched = ledger.load_account(&record).unwrap();

        let a = ledger.record_deposit(&mut direct, dec("5")).unwrap();
        let b = ledger
            .execute(&mut dispatched, Transaction::deposit(dec("5")).unwrap())
            .unwrap();
        assert_eq!(a.new_balance, b.new_balance);
        assert_eq!(direct.transactions().len(), dispatched.transactions().len());
    }

    #[test]
    fn test_unstored_account_is_rejected() {
        let ledger = LedgerService::default();
        let mut account = Account::open("Ana", ledger.kind_for(AccountType::Savings, Decimal::ZERO)).unwrap();
        assert!(matches!(
            ledger.record_deposit(&mut account, dec("1")),
            Err(Error::Validation(_))
        ));
        assert_eq!(account.balance(), Decimal::ZERO);
    }

    #[test]
    fn test_dehydrate() {
        let ledger = LedgerService::default();
        let record = row("checking", "12.5", "40");
        let state = ledger.dehydrate(&ledger.load_account(&record).unwrap());
        assert_eq!(state.id, Some(record.id));
        assert_eq!(state.account_type, AccountType::Checking);
        assert_eq!(state.balance, dec("12.5"));
        assert_eq!(state.overdraft_limit, dec("40"));

        let new = state.into_new_account();
        assert_eq!(new.account_type, "checking");
    }
}
