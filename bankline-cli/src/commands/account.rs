//! Account command - open, list, show and remove accounts

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::{Confirm, Input, Select};
use rust_decimal::Decimal;

use bankline_core::services::MIN_HOLDER_NAME_LEN;
use bankline_core::AccountRecord;

use super::{emit, get_context, parse_account_id, parse_amount};
use crate::output;

const ACCOUNT_TYPES: [&str; 2] = ["checking", "savings"];

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open a new account
    New {
        /// Account holder name
        holder_name: Option<String>,
        /// Account type (checking, savings)
        #[arg(long = "type", short = 't')]
        account_type: Option<String>,
        /// Overdraft limit (checking accounts only)
        #[arg(long, default_value = "0")]
        overdraft: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all accounts
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one account with its available amount, yield and fee
    Show {
        /// Account ID
        account_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove an account and its transaction history
    Remove {
        /// Account ID
        account_id: String,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: AccountCommands) -> Result<()> {
    match command {
        AccountCommands::New {
            holder_name,
            account_type,
            overdraft,
            json,
        } => run_new(holder_name, account_type, &overdraft, json),
        AccountCommands::List { json } => run_list(json),
        AccountCommands::Show { account_id, json } => run_show(&account_id, json),
        AccountCommands::Remove {
            account_id,
            force,
            json,
        } => run_remove(&account_id, force, json),
    }
}

fn run_new(
    holder_name: Option<String>,
    account_type: Option<String>,
    overdraft: &str,
    json: bool,
) -> Result<()> {
    // Get holder name interactively if not provided
    let holder_name = match holder_name {
        Some(name) => name,
        None => Input::new()
            .with_prompt(format!("Holder name (at least {} characters)", MIN_HOLDER_NAME_LEN))
            .interact_text()?,
    };

    let account_type = match account_type {
        Some(t) => t,
        None => {
            let choice = Select::new()
                .with_prompt("Account type")
                .items(&ACCOUNT_TYPES)
                .default(0)
                .interact()?;
            ACCOUNT_TYPES[choice].to_string()
        }
    };

    let overdraft = parse_amount(overdraft)?;

    let ctx = get_context()?;
    let record = ctx
        .account_service
        .create_account(&holder_name, &account_type, overdraft)?;

    emit(record, json, |record| {
        output::success("Account opened");
        print_record(record);
    })
}

fn run_list(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let accounts = ctx.account_service.list_accounts()?;

    emit(accounts, json, |accounts| {
        if accounts.is_empty() {
            println!("No accounts yet. Open one with `bl account new`.");
            return;
        }

        let mut table = output::create_table();
        table.set_header(vec!["ID", "Holder", "Type", "Balance", "Overdraft"]);
        for account in accounts {
            table.add_row(vec![
                comfy_table::Cell::new(account.id),
                comfy_table::Cell::new(&account.holder_name),
                comfy_table::Cell::new(&account.account_type),
                output::amount_cell(account.balance),
                comfy_table::Cell::new(output::format_amount(account.overdraft_limit)),
            ]);
        }
        println!("{}", table);
    })
}

fn run_show(account_id: &str, json: bool) -> Result<()> {
    let id = parse_account_id(account_id)?;
    let ctx = get_context()?;
    let view = ctx.account_service.describe(id)?;

    emit(view, json, |view| {
        println!("{}", view.holder_name.bold());
        println!();

        let mut table = output::create_table();
        table.add_row(vec!["ID".to_string(), view.id.to_string()]);
        table.add_row(vec!["Type".to_string(), view.account_type.to_string()]);
        table.add_row(vec!["Balance".to_string(), output::format_amount(view.balance)]);
        table.add_row(vec![
            "Overdraft limit".to_string(),
            output::format_amount(view.overdraft_limit),
        ]);
        table.add_row(vec![
            "Available".to_string(),
            output::format_amount(view.available_to_withdraw),
        ]);
        table.add_row(vec![
            "Projected interest".to_string(),
            output::format_amount(view.projected_yield),
        ]);
        table.add_row(vec![
            "Maintenance fee".to_string(),
            output::format_amount(view.maintenance_fee),
        ]);
        table.add_row(vec!["Opened".to_string(), output::format_time(view.created_at)]);
        println!("{}", table);
    })
}

fn run_remove(account_id: &str, force: bool, json: bool) -> Result<()> {
    let id = parse_account_id(account_id)?;
    let ctx = get_context()?;
    let record = ctx.account_service.get_account(id)?;

    // Confirm removal unless --force (JSON mode never prompts)
    if !force && !json {
        println!(
            "\n{}",
            format!(
                "This will remove the account of '{}' and its whole transaction history.",
                record.holder_name
            )
            .yellow()
        );

        if !Confirm::new()
            .with_prompt("Are you sure?")
            .default(false)
            .interact()?
        {
            output::warning("Cancelled");
            return Ok(());
        }
    }

    ctx.account_service.delete_account(id)?;

    emit(serde_json::json!({ "deleted": id }), json, |_| {
        output::success(&format!("Account {} removed", id));
    })
}

fn print_record(record: &AccountRecord) {
    println!("  ID: {}", record.id);
    println!("  Holder: {}", record.holder_name);
    println!("  Type: {}", record.account_type);
    if record.overdraft_limit > Decimal::ZERO {
        println!("  Overdraft limit: {}", output::format_amount(record.overdraft_limit));
    }
}
