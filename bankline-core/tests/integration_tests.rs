//! Integration tests for bankline-core services
//!
//! These tests verify critical data integrity scenarios using a real DuckDB
//! file in a temporary directory.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

use chrono::Utc;
use rust_decimal::Decimal;

use bankline_core::adapters::duckdb::DuckDbRepository;
use bankline_core::domain::{BalanceCommit, NewAccount, TransactionKind, TransactionRecord};
use bankline_core::ports::AccountRepository;
use bankline_core::services::{AccountService, LedgerService};
use bankline_core::{BanklineContext, Error, ErrorKind, OperationResult};

// ============================================================================
// Test Helpers
// ============================================================================

/// Create a test repository with schema initialized
fn create_test_repo(temp_dir: &TempDir) -> Arc<DuckDbRepository> {
    let db_path = temp_dir.path().join("test.duckdb");
    let repo = DuckDbRepository::new(&db_path).expect("Failed to create repository");
    repo.ensure_schema().expect("Failed to initialize schema");
    Arc::new(repo)
}

fn create_service(repo: &Arc<DuckDbRepository>) -> AccountService {
    AccountService::new(repo.clone(), LedgerService::default())
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

/// Full request cycle: open, deposit, withdraw into overdraft, rejected withdrawal
#[test]
fn test_checking_overdraft_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let service = create_service(&repo);

    let account = service.create_account("Ana Souza", "checking", dec("200")).unwrap();
    assert_eq!(account.balance, Decimal::ZERO);

    let receipt = service.withdraw(account.id, dec("150")).unwrap();
    assert_eq!(receipt.balance, dec("-150"));

    let err = service.withdraw(account.id, dec("60")).unwrap_err();
    match err {
        Error::InsufficientFunds { requested, available } => {
            assert_eq!(requested, dec("60"));
            assert_eq!(available, dec("50"));
        }
        other => panic!("expected InsufficientFunds, got {:?}", other),
    }

    // Failed operation persisted nothing
    let stored = service.get_account(account.id).unwrap();
    assert_eq!(stored.balance, dec("-150"));
    assert_eq!(stored.version, 1);
    assert_eq!(service.list_transactions(account.id).unwrap().len(), 1);
}

/// Savings floor and interest through the service layer
#[test]
fn test_savings_interest_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let service = create_service(&repo);

    let account = service.create_account("Bruno Lima", "savings", Decimal::ZERO).unwrap();
    service.deposit(account.id, dec("1000")).unwrap();

    let receipt = service.apply_interest(account.id).unwrap();
    assert_eq!(receipt.balance, dec("1050"));
    let interest = receipt.transaction.unwrap();
    assert_eq!(interest.kind, TransactionKind::Interest);
    assert_eq!(interest.amount, dec("50"));

    service.withdraw(account.id, dec("1050")).unwrap();
    let err = service.withdraw(account.id, dec("1")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    assert_eq!(service.get_account(account.id).unwrap().balance, Decimal::ZERO);
}

/// Amounts keep their exact decimal value through storage
#[test]
fn test_decimal_amounts_survive_storage() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let service = create_service(&repo);

    let account = service.create_account("Carla Dias", "checking", Decimal::ZERO).unwrap();
    for amount in ["0.10", "0.20", "1234567.89"] {
        service.deposit(account.id, dec(amount)).unwrap();
    }

    let stats = service.statistics(account.id).unwrap();
    assert_eq!(stats.total_deposits, dec("1234568.19"));
    assert_eq!(stats.current_balance, dec("1234568.19"));
    assert_eq!(stats.transaction_count, 3);
}

/// Reopening the database sees everything committed before
#[test]
fn test_state_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let account_id = {
        let ctx = BanklineContext::new(temp_dir.path()).unwrap();
        let account = ctx
            .account_service
            .create_account("Dora Reis", "savings", Decimal::ZERO)
            .unwrap();
        ctx.account_service.deposit(account.id, dec("42.42")).unwrap();
        account.id
    };

    let ctx = BanklineContext::new(temp_dir.path()).unwrap();
    let history = ctx.account_service.list_transactions(account_id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].amount, dec("42.42"));
    assert_eq!(ctx.account_service.get_account(account_id).unwrap().balance, dec("42.42"));
}

// ============================================================================
// Atomicity & Versioning Tests
// ============================================================================

/// A commit built from a stale read is rejected and leaves no trace
#[test]
fn test_stale_version_conflict() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let service = create_service(&repo);

    let account = service.create_account("Ana Souza", "savings", Decimal::ZERO).unwrap();
    let stale = service.get_account(account.id).unwrap();

    // Another request wins the race
    service.deposit(account.id, dec("10")).unwrap();

    let commit = BalanceCommit {
        account_id: stale.id,
        expected_version: stale.version,
        new_balance: dec("99"),
        transaction: TransactionRecord {
            id: Uuid::new_v4(),
            account_id: stale.id,
            kind: TransactionKind::Deposit,
            amount: dec("99"),
            timestamp: Utc::now(),
        },
    };
    let err = repo.commit(&commit).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.kind().status_code(), 409);

    let stored = service.get_account(account.id).unwrap();
    assert_eq!(stored.balance, dec("10"));
    assert_eq!(service.list_transactions(account.id).unwrap().len(), 1);
}

/// delete_account removes the account and its whole history
#[test]
fn test_delete_account_cascades() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let service = create_service(&repo);

    let doomed = service.create_account("Eva Prado", "checking", dec("10")).unwrap();
    let kept = service.create_account("Fábio Melo", "savings", Decimal::ZERO).unwrap();
    for _ in 0..3 {
        service.deposit(doomed.id, dec("5")).unwrap();
    }
    service.deposit(kept.id, dec("5")).unwrap();

    service.delete_account(doomed.id).unwrap();

    assert!(matches!(service.get_account(doomed.id), Err(Error::AccountNotFound(_))));
    assert_eq!(repo.count_transactions().unwrap(), 1);
    assert_eq!(service.list_accounts().unwrap().len(), 1);
    assert!(repo.find_orphaned_transactions().unwrap().is_empty());
}

// ============================================================================
// Load-time Validation Tests
// ============================================================================

/// Rows with a type the ledger doesn't know are rejected on load
#[test]
fn test_unknown_stored_type_fails_on_operation() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let service = create_service(&repo);

    let legacy = repo
        .insert_account(&NewAccount {
            holder_name: "Legacy Holder".to_string(),
            account_type: "poupanca".to_string(),
            balance: Decimal::ZERO,
            overdraft_limit: Decimal::ZERO,
        })
        .unwrap();

    let err = service.deposit(legacy.id, dec("1")).unwrap_err();
    assert!(matches!(err, Error::UnknownAccountType(ref t) if t == "poupanca"));
    assert_eq!(repo.get_account(legacy.id).unwrap().unwrap().version, 0);

    let ctx_doctor = bankline_core::services::DoctorService::new(repo);
    let report = ctx_doctor.run_checks().unwrap();
    assert_eq!(report.checks["unknown_account_types"].status, "error");
}

/// Errors serialize to the transport payload shape
#[test]
fn test_error_payload_shape() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let service = create_service(&repo);

    let result: OperationResult<_> = service.deposit(Uuid::new_v4(), dec("1")).into();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["kind"], "account_not_found");
    assert!(json["error"]["message"].as_str().unwrap().contains("Account not found"));
}
