//! Doctor service - database health checks

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::AccountType;
use crate::ports::AccountRepository;

/// Doctor service for health checks
pub struct DoctorService {
    repository: Arc<DuckDbRepository>,
}

impl DoctorService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self { repository }
    }

    /// Run all health checks
    ///
    /// Works on raw rows so that broken data is reported rather than
    /// rejected on load.
    pub fn run_checks(&self) -> Result<DoctorResult> {
        let mut checks = HashMap::new();
        let accounts = self.repository.list_accounts()?;

        // Orphaned transactions
        let orphaned = self.repository.find_orphaned_transactions()?;
        let orphan_details: Vec<serde_json::Value> = orphaned
            .iter()
            .map(|(tx_id, account_id)| {
                json!({
                    "transaction_id": tx_id,
                    "account_id": account_id
                })
            })
            .collect();
        checks.insert(
            "orphaned_transactions".to_string(),
            CheckResult::from_findings(
                orphan_details,
                "error",
                "No orphaned transactions found",
                |n| format!("{} transaction(s) reference missing accounts", n),
            ),
        );

        // Unknown account types
        let unknown: Vec<serde_json::Value> = accounts
            .iter()
            .filter(|a| a.account_type.parse::<AccountType>().is_err())
            .map(|a| json!({"account_id": a.id, "account_type": a.account_type}))
            .collect();
        checks.insert(
            "unknown_account_types".to_string(),
            CheckResult::from_findings(
                unknown,
                "error",
                "All accounts have a known type",
                |n| format!("{} account(s) have an unknown type", n),
            ),
        );

        // Balance floor: savings never below zero, checking never below -overdraft
        let below_floor: Vec<serde_json::Value> = accounts
            .iter()
            .filter_map(|a| {
                let floor = match a.account_type.parse::<AccountType>().ok()? {
                    AccountType::Checking => -a.overdraft_limit,
                    AccountType::Savings => Decimal::ZERO,
                };
                (a.balance < floor).then(|| {
                    json!({
                        "account_id": a.id,
                        "balance": a.balance,
                        "floor": floor
                    })
                })
            })
            .collect();
        checks.insert(
            "balance_floor".to_string(),
            CheckResult::from_findings(
                below_floor,
                "error",
                "All balances respect their account limits",
                |n| format!("{} account(s) are below their balance floor", n),
            ),
        );

        // Stored balance vs. sum of the transaction log
        let mut mismatches = Vec::new();
        for account in &accounts {
            let transactions = self.repository.list_transactions(account.id)?;
            let logged = transactions
                .iter()
                .try_fold(Decimal::ZERO, |acc, t| acc.checked_add(t.signed_amount()));
            match logged {
                Some(sum) if sum == account.balance => {}
                other => mismatches.push(json!({
                    "account_id": account.id,
                    "balance": account.balance,
                    "transaction_sum": other,
                    "transaction_count": transactions.len()
                })),
            }
        }
        checks.insert(
            "balance_reconciliation".to_string(),
            CheckResult::from_findings(
                mismatches,
                "warning",
                "All balances match their transaction history",
                |n| format!("{} account(s) differ from their transaction history", n),
            ),
        );

        // Calculate summary
        let passed = checks.values().filter(|c| c.status == "pass").count() as i64;
        let warnings = checks.values().filter(|c| c.status == "warning").count() as i64;
        let errors = checks.values().filter(|c| c.status == "error").count() as i64;

        Ok(DoctorResult {
            checks,
            summary: DoctorSummary {
                passed,
                warnings,
                errors,
            },
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DoctorResult {
    pub checks: HashMap<String, CheckResult>,
    pub summary: DoctorSummary,
}

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<serde_json::Value>>,
}

impl CheckResult {
    fn from_findings(
        findings: Vec<serde_json::Value>,
        failing_status: &str,
        pass_message: &str,
        fail_message: impl Fn(usize) -> String,
    ) -> Self {
        if findings.is_empty() {
            return Self {
                status: "pass".to_string(),
                message: pass_message.to_string(),
                details: None,
            };
        }
        Self {
            status: failing_status.to_string(),
            message: fail_message(findings.len()),
            details: Some(findings),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DoctorSummary {
    pub passed: i64,
    pub warnings: i64,
    pub errors: i64,
}
