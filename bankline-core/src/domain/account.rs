//! Account domain model

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::{Error, Result};
use super::transaction::{Transaction, TransactionKind};

/// Account type as stored and requested: "checking" or "savings"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
        }
    }
}

impl FromStr for AccountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "checking" => Ok(AccountType::Checking),
            "savings" => Ok(AccountType::Savings),
            _ => Err(Error::UnknownAccountType(s.to_string())),
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variant-specific rules of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AccountKind {
    /// May go negative down to `-overdraft_limit`; never accrues interest
    Checking {
        overdraft_limit: Decimal,
        fee_rate: Decimal,
    },
    /// Never goes negative; accrues `balance * interest_rate` on demand
    Savings { interest_rate: Decimal },
}

impl AccountKind {
    pub fn checking(overdraft_limit: Decimal, fee_rate: Decimal) -> Self {
        AccountKind::Checking {
            overdraft_limit,
            fee_rate,
        }
    }

    pub fn savings(interest_rate: Decimal) -> Self {
        AccountKind::Savings { interest_rate }
    }

    pub fn account_type(&self) -> AccountType {
        match self {
            AccountKind::Checking { .. } => AccountType::Checking,
            AccountKind::Savings { .. } => AccountType::Savings,
        }
    }

    /// Overdraft limit (zero for savings accounts)
    pub fn overdraft_limit(&self) -> Decimal {
        match self {
            AccountKind::Checking { overdraft_limit, .. } => *overdraft_limit,
            AccountKind::Savings { .. } => Decimal::ZERO,
        }
    }

    /// Lowest balance this variant may reach
    pub fn balance_floor(&self) -> Decimal {
        -self.overdraft_limit()
    }

    fn validate(&self) -> Result<()> {
        match self {
            AccountKind::Checking {
                overdraft_limit,
                fee_rate,
            } => {
                if *overdraft_limit < Decimal::ZERO {
                    return Err(Error::validation("overdraft limit cannot be negative"));
                }
                if *fee_rate < Decimal::ZERO {
                    return Err(Error::validation("fee rate cannot be negative"));
                }
            }
            AccountKind::Savings { interest_rate } => {
                if *interest_rate < Decimal::ZERO {
                    return Err(Error::validation("interest rate cannot be negative"));
                }
            }
        }
        Ok(())
    }
}

/// A bank account: holder, balance and the log of transactions applied to it
///
/// The balance only changes through [`Account::deposit`], [`Account::withdraw`],
/// [`Account::apply_interest`] or [`Transaction::apply`], and every change
/// appends exactly one entry to the log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    id: Option<Uuid>,
    holder_name: String,
    balance: Decimal,
    kind: AccountKind,
    transactions: Vec<Transaction>,
}

impl Account {
    /// Open a new, not yet stored account with a zero balance
    pub fn open(holder_name: impl Into<String>, kind: AccountKind) -> Result<Self> {
        let holder_name = validate_holder_name(holder_name.into())?;
        kind.validate()?;
        Ok(Self {
            id: None,
            holder_name,
            balance: Decimal::ZERO,
            kind,
            transactions: Vec::new(),
        })
    }

    /// Rebuild a stored account from its persisted state
    pub fn restore(
        id: Uuid,
        holder_name: impl Into<String>,
        kind: AccountKind,
        balance: Decimal,
        transactions: Vec<Transaction>,
    ) -> Result<Self> {
        let holder_name = validate_holder_name(holder_name.into())?;
        kind.validate()?;
        if balance < kind.balance_floor() {
            return Err(Error::validation(format!(
                "stored balance {} is below the {} floor of {}",
                balance,
                kind.account_type(),
                kind.balance_floor()
            )));
        }
        Ok(Self {
            id: Some(id),
            holder_name,
            balance,
            kind,
            transactions,
        })
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn holder_name(&self) -> &str {
        &self.holder_name
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn kind(&self) -> &AccountKind {
        &self.kind
    }

    pub fn account_type(&self) -> AccountType {
        self.kind.account_type()
    }

    /// Transactions applied so far, oldest first
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Most recently applied transaction
    pub fn last_transaction(&self) -> Option<&Transaction> {
        self.transactions.last()
    }

    /// Largest amount a withdrawal may take right now
    pub fn available_to_withdraw(&self) -> Decimal {
        match self.kind {
            AccountKind::Checking {
                overdraft_limit, ..
            } => self.balance.saturating_add(overdraft_limit),
            AccountKind::Savings { .. } => self.balance,
        }
    }

    /// Deposit a positive amount
    pub fn deposit(&mut self, amount: Decimal) -> Result<()> {
        self.post(Transaction::deposit(amount)?)
    }

    /// Withdraw a positive amount, subject to the variant's sufficiency rule
    pub fn withdraw(&mut self, amount: Decimal) -> Result<()> {
        self.post(Transaction::withdrawal(amount)?)
    }

    /// Interest this account would accrue right now, without applying it
    pub fn compute_yield(&self) -> Result<Decimal> {
        match self.kind {
            AccountKind::Checking { .. } => Ok(Decimal::ZERO),
            AccountKind::Savings { interest_rate } => self
                .balance
                .checked_mul(interest_rate)
                .ok_or_else(|| Error::validation("interest calculation overflowed")),
        }
    }

    /// Maintenance fee on the current balance; informational, never deducted
    pub fn compute_maintenance_fee(&self) -> Result<Decimal> {
        match self.kind {
            AccountKind::Checking { fee_rate, .. } => self
                .balance
                .checked_mul(fee_rate)
                .ok_or_else(|| Error::validation("fee calculation overflowed")),
            AccountKind::Savings { .. } => Ok(Decimal::ZERO),
        }
    }

    /// Credit the current yield, if any, as an interest transaction
    ///
    /// Returns the amount credited (zero when nothing accrued).
    pub fn apply_interest(&mut self) -> Result<Decimal> {
        let interest = self.compute_yield()?;
        if interest <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        self.post(Transaction::interest(interest)?)?;
        Ok(interest)
    }

    /// Single posting routine behind every balance change
    ///
    /// All checks run before the balance or the log is touched.
    pub(crate) fn post(&mut self, tx: Transaction) -> Result<()> {
        let amount = tx.amount();
        let new_balance = match tx.kind() {
            TransactionKind::Deposit => self.balance.checked_add(amount),
            TransactionKind::Interest => {
                if let AccountKind::Checking { .. } = self.kind {
                    return Err(Error::validation("checking accounts do not accrue interest"));
                }
                self.balance.checked_add(amount)
            }
            TransactionKind::Withdrawal => {
                let available = self.available_to_withdraw();
                if amount > available {
                    return Err(Error::InsufficientFunds {
                        requested: amount,
                        available,
                    });
                }
                self.balance.checked_sub(amount)
            }
        }
        .ok_or_else(|| Error::validation("balance overflowed"))?;

        self.balance = new_balance;
        self.transactions.push(tx);
        Ok(())
    }
}

fn validate_holder_name(name: String) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("holder name cannot be empty"));
    }
    Ok(trimmed.to_string())
}
