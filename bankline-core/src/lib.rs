//! Bankline Core - Business logic for bank accounts and their transactions
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Account, Transaction, records, errors)
//! - **ports**: Trait definitions for external dependencies (AccountRepository)
//! - **services**: Business logic orchestration (ledger, accounts, status, doctor, logging)
//! - **adapters**: Concrete implementations (DuckDB)

pub mod domain;
pub mod ports;
pub mod services;
pub mod adapters;
pub mod config;
pub mod migrations;
pub mod log_migrations;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::duckdb::DuckDbRepository;
use config::Config;
use services::*;

// Re-export commonly used types at crate root
pub use domain::{
    Account, AccountKind, AccountRecord, AccountType, Transaction, TransactionKind,
    TransactionRecord,
};
pub use domain::result::{Error, ErrorKind, ErrorPayload, OperationResult};
pub use services::{EntryPoint, LogEvent, LoggingService};

/// Name of the ledger database inside the bankline directory
pub const DB_FILENAME: &str = "bankline.duckdb";

/// Main context for Bankline operations
///
/// This is the primary entry point for all business logic. It holds
/// the database connection, configuration, and all services.
pub struct BanklineContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub account_service: AccountService,
    pub status_service: StatusService,
    pub doctor_service: DoctorService,
}

impl BanklineContext {
    /// Create a new Bankline context
    pub fn new(bankline_dir: &Path) -> Result<Self> {
        let config = Config::load(bankline_dir)?;

        let db_path = bankline_dir.join(DB_FILENAME);
        let repository = Arc::new(DuckDbRepository::new(&db_path)?);

        // Initialize schema
        repository.ensure_schema()?;

        let ledger = LedgerService::from_config(&config);
        let account_service = AccountService::new(repository.clone(), ledger);
        let status_service = StatusService::new(Arc::clone(&repository));
        let doctor_service = DoctorService::new(Arc::clone(&repository));

        Ok(Self {
            config,
            repository,
            account_service,
            status_service,
            doctor_service,
        })
    }
}
