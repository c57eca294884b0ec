//! Persisted shapes exchanged with the repository
//!
//! These mirror storage rows. They carry no behavior beyond conversion helpers;
//! the rules live in [`crate::domain::Account`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transaction::{Transaction, TransactionKind};

/// An account row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: Uuid,
    pub holder_name: String,
    /// Raw type text; validated when the account is loaded
    pub account_type: String,
    pub balance: Decimal,
    pub overdraft_limit: Decimal,
    /// Optimistic concurrency token, bumped on every committed operation
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert an account; the repository assigns the id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccount {
    pub holder_name: String,
    pub account_type: String,
    pub balance: Decimal,
    pub overdraft_limit: Decimal,
}

/// A transaction row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    /// Build the row for a transaction applied to `account_id`
    pub fn from_transaction(account_id: Uuid, tx: &Transaction) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            kind: tx.kind(),
            amount: tx.amount(),
            timestamp: tx.timestamp(),
        }
    }

    /// Signed balance change described by this row
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }
}

/// One operation to persist atomically: the new balance and its transaction row
///
/// The write only succeeds if the stored version still equals
/// `expected_version`.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceCommit {
    pub account_id: Uuid,
    pub expected_version: i64,
    pub new_balance: Decimal,
    pub transaction: TransactionRecord,
}
