//! Repository port - persistence abstraction

use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{AccountRecord, BalanceCommit, NewAccount, TransactionRecord};

/// Storage for account and transaction rows
///
/// Implementations must make [`AccountRepository::commit`] atomic: either the
/// new balance, the version bump and the transaction row are all written, or
/// nothing is. A commit whose `expected_version` no longer matches fails with
/// `Error::Conflict`.
pub trait AccountRepository: Send + Sync {
    // === Accounts ===

    /// Insert an account and return the stored row with its assigned id
    fn insert_account(&self, account: &NewAccount) -> Result<AccountRecord>;

    /// Get an account row by id
    fn get_account(&self, id: Uuid) -> Result<Option<AccountRecord>>;

    /// Get all account rows, oldest first
    fn list_accounts(&self) -> Result<Vec<AccountRecord>>;

    /// Delete an account and its transactions; returns false if it did not exist
    fn delete_account(&self, id: Uuid) -> Result<bool>;

    // === Operations ===

    /// Persist one operation and return the updated account row
    fn commit(&self, commit: &BalanceCommit) -> Result<AccountRecord>;

    // === Transactions ===

    /// Transactions for an account in the order they were committed
    fn list_transactions(&self, account_id: Uuid) -> Result<Vec<TransactionRecord>>;

    /// Total number of stored transactions
    fn count_transactions(&self) -> Result<i64>;
}
