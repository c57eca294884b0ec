//! Bankline CLI - bank accounts in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use bankline_core::{LogEvent, LoggingService};
use commands::{account, config, doctor, get_logger, ledger, log_event, logs, status};

/// Bankline - checking and savings accounts in your terminal
#[derive(Parser)]
#[command(name = "bl", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open, list, show and remove accounts
    Account {
        #[command(subcommand)]
        command: account::AccountCommands,
    },

    /// Deposit into an account
    Deposit {
        /// Account ID
        account_id: String,
        /// Amount (greater than zero)
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Withdraw from an account
    Withdraw {
        /// Account ID
        account_id: String,
        /// Amount (greater than zero)
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Credit accrued interest to a savings account
    Interest {
        /// Account ID
        account_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show an account's transactions, newest first
    History {
        /// Account ID
        account_id: String,
        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show deposit, withdrawal and interest totals for an account
    Stats {
        /// Account ID
        account_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show ledger status and summary
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run ledger health checks
    Doctor {
        /// Show verbose output
        #[arg(long, short)]
        verbose: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change the savings interest and checking fee rates
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    /// Command name as recorded in the event log
    fn name(&self) -> &'static str {
        match self {
            Commands::Account { command } => match command {
                account::AccountCommands::New { .. } => "account new",
                account::AccountCommands::List { .. } => "account list",
                account::AccountCommands::Show { .. } => "account show",
                account::AccountCommands::Remove { .. } => "account remove",
            },
            Commands::Deposit { .. } => "deposit",
            Commands::Withdraw { .. } => "withdraw",
            Commands::Interest { .. } => "interest",
            Commands::History { .. } => "history",
            Commands::Stats { .. } => "stats",
            Commands::Status { .. } => "status",
            Commands::Doctor { .. } => "doctor",
            Commands::Config { command } => match command {
                config::ConfigCommands::Show { .. } => "config show",
                config::ConfigCommands::Set { .. } => "config set",
            },
            Commands::Logs { command } => match command {
                logs::LogsCommands::List { .. } => "logs list",
                logs::LogsCommands::Clear { .. } => "logs clear",
                logs::LogsCommands::Stats { .. } => "logs stats",
                logs::LogsCommands::Export { .. } => "logs export",
            },
        }
    }

    fn json(&self) -> bool {
        match self {
            Commands::Account { command } => match command {
                account::AccountCommands::New { json, .. }
                | account::AccountCommands::List { json }
                | account::AccountCommands::Show { json, .. }
                | account::AccountCommands::Remove { json, .. } => *json,
            },
            Commands::Deposit { json, .. }
            | Commands::Withdraw { json, .. }
            | Commands::Interest { json, .. }
            | Commands::History { json, .. }
            | Commands::Stats { json, .. }
            | Commands::Status { json }
            | Commands::Doctor { json, .. } => *json,
            Commands::Config { command } => match command {
                config::ConfigCommands::Show { json } | config::ConfigCommands::Set { json, .. } => {
                    *json
                }
            },
            Commands::Logs { command } => match command {
                logs::LogsCommands::List { json, .. }
                | logs::LogsCommands::Clear { json, .. }
                | logs::LogsCommands::Stats { json }
                | logs::LogsCommands::Export { json, .. } => *json,
            },
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let name = cli.command.name();
    let json = cli.command.json();

    // One log handle per process, shared by every command
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command(name));

    match run(cli, &logger) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => commands::report_failure(&logger, name, &e, json),
    }
}

fn run(cli: Cli, logger: &Option<LoggingService>) -> Result<()> {
    match cli.command {
        Commands::Account { command } => account::run(command),
        Commands::Deposit { account_id, amount, json } => {
            ledger::run_deposit(&account_id, &amount, json, logger)
        }
        Commands::Withdraw { account_id, amount, json } => {
            ledger::run_withdraw(&account_id, &amount, json, logger)
        }
        Commands::Interest { account_id, json } => {
            ledger::run_interest(&account_id, json, logger)
        }
        Commands::History { account_id, limit, json } => {
            ledger::run_history(&account_id, limit, json)
        }
        Commands::Stats { account_id, json } => ledger::run_stats(&account_id, json),
        Commands::Status { json } => status::run(json),
        Commands::Doctor { verbose, json } => doctor::run(verbose, json),
        Commands::Config { command } => config::run(command),
        Commands::Logs { command } => logs::run(command, logger),
    }
}
