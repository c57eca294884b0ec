//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
pub mod record;
pub mod result;
mod transaction;

pub use account::{Account, AccountKind, AccountType};
pub use record::{AccountRecord, BalanceCommit, NewAccount, TransactionRecord};
pub use transaction::{Transaction, TransactionKind};
