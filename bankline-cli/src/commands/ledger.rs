//! Ledger commands - deposit, withdraw, interest, history and stats

use anyhow::Result;
use colored::Colorize;
use comfy_table::Cell;

use bankline_core::services::OperationReceipt;
use bankline_core::{LogEvent, LoggingService, TransactionKind};

use super::{emit, get_context, log_event, parse_account_id, parse_amount};
use crate::output;

pub fn run_deposit(
    account_id: &str,
    amount: &str,
    json: bool,
    logger: &Option<LoggingService>,
) -> Result<()> {
    let id = parse_account_id(account_id)?;
    let amount = parse_amount(amount)?;

    let ctx = get_context()?;
    let receipt = ctx.account_service.deposit(id, amount)?;
    log_operation(logger, "deposit");

    emit(receipt, json, |receipt| {
        output::success(&format!("Deposited {}", output::format_amount(amount)));
        print_receipt(receipt);
    })
}

pub fn run_withdraw(
    account_id: &str,
    amount: &str,
    json: bool,
    logger: &Option<LoggingService>,
) -> Result<()> {
    let id = parse_account_id(account_id)?;
    let amount = parse_amount(amount)?;

    let ctx = get_context()?;
    let receipt = ctx.account_service.withdraw(id, amount)?;
    log_operation(logger, "withdraw");

    emit(receipt, json, |receipt| {
        output::success(&format!("Withdrew {}", output::format_amount(amount)));
        print_receipt(receipt);
    })
}

pub fn run_interest(account_id: &str, json: bool, logger: &Option<LoggingService>) -> Result<()> {
    let id = parse_account_id(account_id)?;

    let ctx = get_context()?;
    let receipt = ctx.account_service.apply_interest(id)?;
    if receipt.transaction.is_some() {
        log_operation(logger, "interest");
    }

    emit(receipt, json, |receipt| {
        match &receipt.transaction {
            Some(tx) => output::success(&format!(
                "Credited {} interest",
                output::format_amount(tx.amount)
            )),
            None => output::info("No interest accrued"),
        }
        print_receipt(receipt);
    })
}

pub fn run_history(account_id: &str, limit: Option<usize>, json: bool) -> Result<()> {
    let id = parse_account_id(account_id)?;

    let ctx = get_context()?;
    let mut transactions = ctx.account_service.list_transactions(id)?;
    if let Some(limit) = limit {
        transactions.truncate(limit);
    }

    emit(transactions, json, |transactions| {
        if transactions.is_empty() {
            println!("No transactions yet.");
            return;
        }

        let mut table = output::create_table();
        table.set_header(vec!["Time", "Kind", "Amount", "ID"]);
        for tx in transactions {
            let kind = match tx.kind {
                TransactionKind::Deposit => Cell::new("deposit").fg(comfy_table::Color::Green),
                TransactionKind::Withdrawal => Cell::new("withdrawal").fg(comfy_table::Color::Red),
                TransactionKind::Interest => Cell::new("interest").fg(comfy_table::Color::Cyan),
            };
            table.add_row(vec![
                Cell::new(output::format_time(tx.timestamp)),
                kind,
                output::amount_cell(tx.signed_amount()),
                Cell::new(tx.id.to_string().dimmed()),
            ]);
        }
        println!("{}", table);
    })
}

pub fn run_stats(account_id: &str, json: bool) -> Result<()> {
    let id = parse_account_id(account_id)?;

    let ctx = get_context()?;
    let stats = ctx.account_service.statistics(id)?;

    emit(stats, json, |stats| {
        println!("{}", "Account Statistics".bold());
        println!();

        let mut table = output::create_table();
        table.add_row(vec![
            "Total deposits".to_string(),
            output::format_amount(stats.total_deposits),
        ]);
        table.add_row(vec![
            "Total withdrawals".to_string(),
            output::format_amount(stats.total_withdrawals),
        ]);
        table.add_row(vec![
            "Total interest".to_string(),
            output::format_amount(stats.total_interest),
        ]);
        table.add_row(vec![
            "Transactions".to_string(),
            stats.transaction_count.to_string(),
        ]);
        table.add_row(vec![
            "Current balance".to_string(),
            output::format_amount(stats.current_balance),
        ]);
        println!("{}", table);
    })
}

fn print_receipt(receipt: &OperationReceipt) {
    println!("  Account: {}", receipt.account_id);
    println!("  Balance: {}", output::format_amount(receipt.balance));
    if let Some(tx) = &receipt.transaction {
        println!("  Transaction: {}", tx.id.to_string().dimmed());
    }
}

/// Record a completed ledger operation; amounts are never logged
fn log_operation(logger: &Option<LoggingService>, operation: &str) {
    log_event(
        logger,
        LogEvent::new("operation_completed")
            .with_operation(operation)
            .with_command(operation),
    );
}
