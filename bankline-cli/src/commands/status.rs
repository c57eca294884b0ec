//! Status command - show account status and summary

use anyhow::Result;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use super::get_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let status = ctx.status_service.get_status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Ledger Status".bold());
    println!();

    // Vertical key-value summary
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec!["Accounts", &status.total_accounts.to_string()]);
    for (account_type, count) in &status.accounts_by_type {
        table.add_row(vec![&format!("  {}", account_type), &count.to_string()]);
    }
    table.add_row(vec!["Transactions", &status.total_transactions.to_string()]);
    table.add_row(vec!["Total balance", &output::format_amount(status.total_balance)]);

    println!("{}", table);
    println!();

    if !status.accounts.is_empty() {
        println!("{}", "Accounts".bold());
        for account in &status.accounts {
            println!(
                "  • {} ({}) {}",
                account.holder_name,
                account.account_type,
                output::format_amount(account.balance)
            );
        }
    }

    Ok(())
}
