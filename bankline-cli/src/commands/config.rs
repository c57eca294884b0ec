//! Config command - show and change the ledger rates

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use rust_decimal::Decimal;
use serde::Serialize;

use bankline_core::config::{Config, FEE_RATE_ENV, INTEREST_RATE_ENV};
use bankline_core::Error;

use super::{emit, get_bankline_dir, get_context, parse_amount};
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the rates in effect, including environment overrides
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Store new rates in settings.json
    Set {
        /// Savings interest rate (0.05 is 5%)
        #[arg(long, allow_hyphen_values = true)]
        interest_rate: Option<String>,
        /// Checking maintenance fee rate (0.10 is 10%)
        #[arg(long, allow_hyphen_values = true)]
        fee_rate: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct RatesView {
    savings_interest_rate: Decimal,
    checking_fee_rate: Decimal,
    interest_rate_overridden: bool,
    fee_rate_overridden: bool,
}

fn overridden(name: &str) -> bool {
    std::env::var(name).map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Parse a rate argument; rates are never negative
fn parse_rate(raw: &str) -> Result<Decimal> {
    let rate = parse_amount(raw)?;
    if rate < Decimal::ZERO {
        return Err(Error::validation("rates cannot be negative").into());
    }
    Ok(rate)
}

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show { json } => run_show(json),
        ConfigCommands::Set {
            interest_rate,
            fee_rate,
            json,
        } => run_set(interest_rate.as_deref(), fee_rate.as_deref(), json),
    }
}

fn run_show(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let ledger = ctx.account_service.ledger();

    let view = RatesView {
        savings_interest_rate: ledger.savings_interest_rate(),
        checking_fee_rate: ledger.checking_fee_rate(),
        interest_rate_overridden: overridden(INTEREST_RATE_ENV),
        fee_rate_overridden: overridden(FEE_RATE_ENV),
    };

    emit(view, json, |view| {
        println!("{}", "Ledger Rates".bold());
        let mut table = output::create_table();
        table.add_row(vec![
            "Savings interest rate".to_string(),
            rate_label(
                view.savings_interest_rate,
                view.interest_rate_overridden,
                INTEREST_RATE_ENV,
            ),
        ]);
        table.add_row(vec![
            "Checking fee rate".to_string(),
            rate_label(view.checking_fee_rate, view.fee_rate_overridden, FEE_RATE_ENV),
        ]);
        println!("{}", table);
    })
}

fn rate_label(rate: Decimal, overridden: bool, env: &str) -> String {
    if overridden {
        format!("{} {}", rate, format!("(from {})", env).dimmed())
    } else {
        rate.to_string()
    }
}

fn run_set(interest_rate: Option<&str>, fee_rate: Option<&str>, json: bool) -> Result<()> {
    if interest_rate.is_none() && fee_rate.is_none() {
        return Err(Error::validation("nothing to set; pass --interest-rate or --fee-rate").into());
    }
    let interest_rate = interest_rate.map(parse_rate).transpose()?;
    let fee_rate = fee_rate.map(parse_rate).transpose()?;

    let bankline_dir = get_bankline_dir()?;
    std::fs::create_dir_all(&bankline_dir)?;

    let mut config = Config::load_stored(&bankline_dir)?;
    if let Some(rate) = interest_rate {
        config.savings_interest_rate = rate;
    }
    if let Some(rate) = fee_rate {
        config.checking_fee_rate = rate;
    }
    config.save(&bankline_dir)?;

    let view = RatesView {
        savings_interest_rate: config.savings_interest_rate,
        checking_fee_rate: config.checking_fee_rate,
        interest_rate_overridden: overridden(INTEREST_RATE_ENV),
        fee_rate_overridden: overridden(FEE_RATE_ENV),
    };

    emit(view, json, |view| {
        output::success("Rates saved");
        println!("  Savings interest rate: {}", view.savings_interest_rate);
        println!("  Checking fee rate: {}", view.checking_fee_rate);
        if view.interest_rate_overridden || view.fee_rate_overridden {
            output::warning("An environment override is set and takes precedence");
        }
    })
}
