//! DuckDB repository implementation

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::{params, Connection};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{AccountRecord, BalanceCommit, NewAccount, TransactionRecord};
use crate::migrations::MIGRATIONS;
use crate::ports::AccountRepository;
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

const ACCOUNT_COLUMNS: &str = "account_id, holder_name, account_type, balance, overdraft_limit,
                               version, created_at::VARCHAR, updated_at::VARCHAR";

const TRANSACTION_COLUMNS: &str =
    "transaction_id, account_id, kind, amount, occurred_at::VARCHAR";

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// DuckDB repository implementation
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl DuckDbRepository {
    /// Open (or create) the ledger database at `db_path`
    ///
    /// Retries with exponential backoff when the file is locked by another
    /// process, e.g. two CLI invocations racing each other.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: Some(db_path.to_path_buf()),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[bankline] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }

        Err(last_error.map(Error::from).unwrap_or_else(|| {
            Error::database(format!("Failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    /// Open a private in-memory database (tests, dry runs)
    pub fn in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    fn try_open_connection(db_path: &Path) -> duckdb::Result<Connection> {
        // Extension autoloading stays off; nothing here needs extensions
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(db_path, config)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Path of the database file, if file-backed
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.conn()?;
        MigrationService::new(&conn, MIGRATIONS)
            .run_pending()
            .map_err(|e| Error::database(e.to_string()))
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    fn fetch_account(conn: &Connection, id: Uuid) -> Result<Option<AccountRecord>> {
        let sql = format!(
            "SELECT {} FROM sys_accounts WHERE account_id = ?",
            ACCOUNT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query_map([id.to_string()], RawAccountRow::from_row)?;
        match rows.next() {
            Some(raw) => Ok(Some(raw?.try_into()?)),
            None => Ok(None),
        }
    }

    // === Health checks ===

    /// Transactions whose account no longer exists, as (transaction_id, account_id)
    pub fn find_orphaned_transactions(&self) -> Result<Vec<(String, String)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT t.transaction_id, t.account_id
             FROM sys_transactions t
             LEFT JOIN sys_accounts a ON t.account_id = a.account_id
             WHERE a.account_id IS NULL
             ORDER BY t.seq",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<duckdb::Result<Vec<(String, String)>>>()?;
        Ok(rows)
    }

    /// Count stored accounts grouped by their raw type text
    pub fn count_accounts_by_type(&self) -> Result<Vec<(String, i64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT account_type, COUNT(*) FROM sys_accounts GROUP BY account_type ORDER BY account_type",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<duckdb::Result<Vec<(String, i64)>>>()?;
        Ok(rows)
    }
}

impl AccountRepository for DuckDbRepository {
    fn insert_account(&self, account: &NewAccount) -> Result<AccountRecord> {
        let conn = self.conn()?;
        let id = Uuid::new_v4();
        let now = format_timestamp(&Utc::now());

        conn.execute(
            "INSERT INTO sys_accounts (account_id, holder_name, account_type, balance,
                                       overdraft_limit, version, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 0, ?, ?)",
            params![
                id.to_string(),
                account.holder_name,
                account.account_type,
                account.balance.to_string(),
                account.overdraft_limit.to_string(),
                now,
                now,
            ],
        )?;

        Self::fetch_account(&conn, id)?
            .ok_or_else(|| Error::database(format!("Inserted account {} not readable", id)))
    }

    fn get_account(&self, id: Uuid) -> Result<Option<AccountRecord>> {
        let conn = self.conn()?;
        Self::fetch_account(&conn, id)
    }

    fn list_accounts(&self) -> Result<Vec<AccountRecord>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM sys_accounts ORDER BY created_at, account_id",
            ACCOUNT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map([], RawAccountRow::from_row)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        raw.into_iter().map(AccountRecord::try_from).collect()
    }

    /// Delete an account and its transactions in one storage transaction
    fn delete_account(&self, id: Uuid) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM sys_transactions WHERE account_id = ?",
            params![id.to_string()],
        )?;
        let deleted = tx.execute(
            "DELETE FROM sys_accounts WHERE account_id = ?",
            params![id.to_string()],
        )?;

        tx.commit()?;
        Ok(deleted > 0)
    }

    fn commit(&self, commit: &BalanceCommit) -> Result<AccountRecord> {
        if commit.transaction.account_id != commit.account_id {
            return Err(Error::validation(format!(
                "transaction {} belongs to account {}, not {}",
                commit.transaction.id, commit.transaction.account_id, commit.account_id
            )));
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let account_id = commit.account_id.to_string();

        // Compare-and-swap on version; dropping `tx` without commit rolls back
        let updated = tx.execute(
            "UPDATE sys_accounts
             SET balance = ?, version = version + 1, updated_at = ?
             WHERE account_id = ? AND version = ?",
            params![
                commit.new_balance.to_string(),
                format_timestamp(&Utc::now()),
                account_id,
                commit.expected_version,
            ],
        )?;

        if updated == 0 {
            let exists: i64 = tx.query_row(
                "SELECT COUNT(*) FROM sys_accounts WHERE account_id = ?",
                params![account_id],
                |row| row.get(0),
            )?;
            return Err(if exists == 0 {
                Error::account_not_found(commit.account_id)
            } else {
                Error::conflict(format!(
                    "account {} was modified concurrently (expected version {})",
                    commit.account_id, commit.expected_version
                ))
            });
        }

        let record = &commit.transaction;
        tx.execute(
            "INSERT INTO sys_transactions (transaction_id, account_id, kind, amount, occurred_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                record.id.to_string(),
                account_id,
                record.kind.as_str(),
                record.amount.to_string(),
                format_timestamp(&record.timestamp),
            ],
        )?;

        let updated_account = Self::fetch_account(&tx, commit.account_id)?
            .ok_or_else(|| Error::account_not_found(commit.account_id))?;

        tx.commit()?;
        Ok(updated_account)
    }

    fn list_transactions(&self, account_id: Uuid) -> Result<Vec<TransactionRecord>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM sys_transactions WHERE account_id = ? ORDER BY seq",
            TRANSACTION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map([account_id.to_string()], RawTransactionRow::from_row)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        raw.into_iter().map(TransactionRecord::try_from).collect()
    }

    fn count_transactions(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM sys_transactions", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Account columns as read from DuckDB, before parsing
struct RawAccountRow {
    id: String,
    holder_name: String,
    account_type: String,
    balance: String,
    overdraft_limit: String,
    version: i64,
    created_at: String,
    updated_at: String,
}

impl RawAccountRow {
    fn from_row(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            holder_name: row.get(1)?,
            account_type: row.get(2)?,
            balance: row.get(3)?,
            overdraft_limit: row.get(4)?,
            version: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl TryFrom<RawAccountRow> for AccountRecord {
    type Error = Error;

    fn try_from(raw: RawAccountRow) -> Result<Self> {
        Ok(AccountRecord {
            id: parse_uuid(&raw.id)?,
            holder_name: raw.holder_name,
            account_type: raw.account_type,
            balance: parse_decimal(&raw.balance)?,
            overdraft_limit: parse_decimal(&raw.overdraft_limit)?,
            version: raw.version,
            created_at: parse_timestamp(&raw.created_at)?,
            updated_at: parse_timestamp(&raw.updated_at)?,
        })
    }
}

/// Transaction columns as read from DuckDB, before parsing
struct RawTransactionRow {
    id: String,
    account_id: String,
    kind: String,
    amount: String,
    occurred_at: String,
}

impl RawTransactionRow {
    fn from_row(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            account_id: row.get(1)?,
            kind: row.get(2)?,
            amount: row.get(3)?,
            occurred_at: row.get(4)?,
        })
    }
}

impl TryFrom<RawTransactionRow> for TransactionRecord {
    type Error = Error;

    fn try_from(raw: RawTransactionRow) -> Result<Self> {
        Ok(TransactionRecord {
            id: parse_uuid(&raw.id)?,
            account_id: parse_uuid(&raw.account_id)?,
            kind: raw.kind.parse()?,
            amount: parse_decimal(&raw.amount)?,
            timestamp: parse_timestamp(&raw.occurred_at)?,
        })
    }
}

// Helper functions

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::database(format!("Invalid stored id '{}': {}", s, e)))
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str_exact(s.trim())
        .map_err(|e| Error::database(format!("Invalid stored amount '{}': {}", s, e)))
}

/// Format a UTC instant for a DuckDB TIMESTAMP column (microsecond precision)
fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Parse a TIMESTAMP rendered as VARCHAR back into UTC
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::database(format!("Invalid stored timestamp '{}': {}", s, e)))
}
