//! Concurrent database access tests
//!
//! Several threads drive the same account through one shared service. Each
//! operation reads the row, applies the ledger and commits against the
//! version it read, so racing writers must either win or get a conflict,
//! never lose an update.
//!
//! Run with: cargo test --test concurrent_access_test -- --nocapture

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

use rust_decimal::Decimal;

use bankline_core::adapters::duckdb::DuckDbRepository;
use bankline_core::ports::AccountRepository;
use bankline_core::services::{AccountService, DoctorService, LedgerService};
use bankline_core::ErrorKind;

/// Number of concurrent threads for stress tests
const THREAD_COUNT: usize = 6;

/// Number of operations per thread
const ITERATIONS_PER_THREAD: usize = 10;

/// Upper bound on conflict retries for one logical deposit
const MAX_ATTEMPTS: usize = 50;

fn setup(temp_dir: &TempDir) -> (Arc<DuckDbRepository>, Arc<AccountService>) {
    let db_path = temp_dir.path().join("test_concurrent.duckdb");
    let repo = Arc::new(DuckDbRepository::new(&db_path).unwrap());
    repo.ensure_schema().unwrap();
    let service = Arc::new(AccountService::new(repo.clone(), LedgerService::default()));
    (repo, service)
}

/// Racing deposits: every successful deposit is reflected exactly once
#[test]
fn test_concurrent_deposits_never_lose_updates() {
    let temp_dir = TempDir::new().unwrap();
    let (repo, service) = setup(&temp_dir);
    let account = service
        .create_account("Shared Account", "savings", Decimal::ZERO)
        .unwrap();

    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let conflict_count = Arc::new(AtomicUsize::new(0));
    let mut handles = vec![];

    for _ in 0..THREAD_COUNT {
        let barrier = Arc::clone(&barrier);
        let service = Arc::clone(&service);
        let conflict_count = Arc::clone(&conflict_count);

        handles.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..ITERATIONS_PER_THREAD {
                let mut attempts = 0;
                loop {
                    attempts += 1;
                    match service.deposit(account.id, Decimal::ONE) {
                        Ok(_) => break,
                        Err(e) if e.kind() == ErrorKind::Conflict && attempts < MAX_ATTEMPTS => {
                            conflict_count.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => panic!("deposit failed after {} attempts: {}", attempts, e),
                    }
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let expected = (THREAD_COUNT * ITERATIONS_PER_THREAD) as i64;
    let stored = service.get_account(account.id).unwrap();
    println!(
        "balance {} after {} conflicts",
        stored.balance,
        conflict_count.load(Ordering::Relaxed)
    );

    assert_eq!(stored.balance, Decimal::from(expected));
    assert_eq!(stored.version, expected);
    assert_eq!(repo.count_transactions().unwrap(), expected);

    let report = DoctorService::new(repo).run_checks().unwrap();
    assert_eq!(report.summary.errors, 0);
    assert_eq!(report.summary.warnings, 0);
}

/// Racing withdrawals on a savings account never push it below zero
#[test]
fn test_concurrent_withdrawals_respect_floor() {
    let temp_dir = TempDir::new().unwrap();
    let (repo, service) = setup(&temp_dir);
    let account = service
        .create_account("Shared Savings", "savings", Decimal::ZERO)
        .unwrap();
    service.deposit(account.id, Decimal::from(20)).unwrap();

    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let successes = Arc::new(AtomicUsize::new(0));
    let mut handles = vec![];

    for _ in 0..THREAD_COUNT {
        let barrier = Arc::clone(&barrier);
        let service = Arc::clone(&service);
        let successes = Arc::clone(&successes);

        handles.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..ITERATIONS_PER_THREAD {
                match service.withdraw(account.id, Decimal::ONE) {
                    Ok(_) => {
                        successes.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => assert!(
                        matches!(e.kind(), ErrorKind::Conflict | ErrorKind::InsufficientFunds),
                        "unexpected error: {}",
                        e
                    ),
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let withdrawn = successes.load(Ordering::Relaxed);
    let stored = service.get_account(account.id).unwrap();
    assert!(withdrawn <= 20);
    assert!(stored.balance >= Decimal::ZERO);
    assert_eq!(stored.balance, Decimal::from(20 - withdrawn as i64));
    assert_eq!(repo.count_transactions().unwrap(), 1 + withdrawn as i64);
}

/// Opening the same file repeatedly keeps schema and data intact
#[test]
fn test_rapid_open_write_close_cycle() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test_cycle.duckdb");

    for i in 0..5 {
        let repo = Arc::new(DuckDbRepository::new(&db_path).unwrap());
        repo.ensure_schema().unwrap();
        let service = AccountService::new(repo.clone(), LedgerService::default());
        service
            .create_account(&format!("Holder {}", i), "checking", Decimal::ZERO)
            .unwrap();
        assert_eq!(service.list_accounts().unwrap().len(), i + 1);
    }
}
