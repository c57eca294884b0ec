//! Transaction domain model

use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::Account;
use super::result::{Error, Result};

/// What a transaction does to a balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Interest,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::Interest => "interest",
        }
    }

    /// Sign of the balance change this kind produces
    pub(crate) fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Deposit | TransactionKind::Interest => amount,
            TransactionKind::Withdrawal => -amount,
        }
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdrawal" => Ok(TransactionKind::Withdrawal),
            "interest" => Ok(TransactionKind::Interest),
            other => Err(Error::validation(format!("unknown transaction kind: {}", other))),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable balance-affecting event
///
/// Fields are private: once built, a transaction cannot change. It holds no
/// reference to the account it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    kind: TransactionKind,
    amount: Decimal,
    timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Create a transaction stamped with the current time
    pub fn new(kind: TransactionKind, amount: Decimal) -> Result<Self> {
        // Microsecond precision survives a TIMESTAMP round trip unchanged
        Self::at(kind, amount, Utc::now().trunc_subsecs(6))
    }

    /// Create a transaction with an explicit timestamp (used when rehydrating)
    pub fn at(kind: TransactionKind, amount: Decimal, timestamp: DateTime<Utc>) -> Result<Self> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount(amount));
        }
        Ok(Self {
            kind,
            amount,
            timestamp,
        })
    }

    pub fn deposit(amount: Decimal) -> Result<Self> {
        Self::new(TransactionKind::Deposit, amount)
    }

    pub fn withdrawal(amount: Decimal) -> Result<Self> {
        Self::new(TransactionKind::Withdrawal, amount)
    }

    pub fn interest(amount: Decimal) -> Result<Self> {
        Self::new(TransactionKind::Interest, amount)
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Signed balance change (withdrawals are negative)
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }

    /// Apply this transaction to an account
    ///
    /// Every kind goes through the account's own posting rules, so the result
    /// is identical to calling `deposit`/`withdraw`/`apply_interest` directly.
    /// The transaction is consumed and ends up in the account's log on success.
    pub fn apply(self, account: &mut Account) -> Result<()> {
        account.post(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive_amounts() {
        for amount in [Decimal::ZERO, Decimal::new(-1, 2)] {
            for kind in [
                TransactionKind::Deposit,
                TransactionKind::Withdrawal,
                TransactionKind::Interest,
            ] {
                match Transaction::new(kind, amount) {
                    Err(Error::InvalidAmount(a)) => assert_eq!(a, amount),
                    other => panic!("expected InvalidAmount, got {:?}", other),
                }
            }
        }
    }

    #[test]
    fn test_timestamp_is_truncated_to_micros() {
        let tx = Transaction::deposit(Decimal::new(1000, 2)).unwrap();
        assert_eq!(tx.timestamp().timestamp_subsec_nanos() % 1000, 0);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("deposit".parse::<TransactionKind>().unwrap(), TransactionKind::Deposit);
        assert_eq!(" Withdrawal ".parse::<TransactionKind>().unwrap(), TransactionKind::Withdrawal);
        assert_eq!("interest".parse::<TransactionKind>().unwrap(), TransactionKind::Interest);
        assert!("saque".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn test_signed_amount() {
        let amount = Decimal::new(2500, 2);
        assert_eq!(Transaction::deposit(amount).unwrap().signed_amount(), amount);
        assert_eq!(Transaction::interest(amount).unwrap().signed_amount(), amount);
        assert_eq!(Transaction::withdrawal(amount).unwrap().signed_amount(), -amount);
    }
}
