//! CLI command implementations

pub mod account;
pub mod config;
pub mod doctor;
pub mod ledger;
pub mod logs;
pub mod status;

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use uuid::Uuid;

use bankline_core::{
    BanklineContext, EntryPoint, Error, ErrorKind, ErrorPayload, LogEvent, LoggingService,
    OperationResult,
};

use crate::output;

/// Get the logging service for CLI operations
///
/// Opened once per process and passed to every command; a second handle on
/// logs.duckdb would keep its own state and overwrite this one's writes.
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let bankline_dir = get_bankline_dir().ok()?;
    std::fs::create_dir_all(&bankline_dir).ok()?;
    LoggingService::new(&bankline_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the bankline directory from environment or default
pub fn get_bankline_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("BANKLINE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".bankline"))
        .context("Could not find home directory; set BANKLINE_DIR")
}

/// Get or create bankline context
pub fn get_context() -> Result<BanklineContext> {
    let bankline_dir = get_bankline_dir()?;

    std::fs::create_dir_all(&bankline_dir)
        .with_context(|| format!("Failed to create bankline directory: {:?}", bankline_dir))?;

    BanklineContext::new(&bankline_dir).context("Failed to initialize bankline context")
}

/// Parse an account id argument
pub fn parse_account_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| Error::validation(format!("'{}' is not a valid account id", raw)).into())
}

/// Parse a decimal amount argument exactly as typed
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw.trim())
        .map_err(|_| Error::validation(format!("'{}' is not a valid amount", raw)).into())
}

/// Print a successful result, as the JSON envelope or via `render`
pub fn emit<T: serde::Serialize>(data: T, json: bool, render: impl FnOnce(&T)) -> Result<()> {
    if json {
        let result = OperationResult::ok(data);
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        render(&data);
    }
    Ok(())
}

/// Kind of a command failure; errors from outside the core are internal
pub fn error_kind(err: &anyhow::Error) -> ErrorKind {
    err.downcast_ref::<Error>()
        .map(Error::kind)
        .unwrap_or(ErrorKind::Internal)
}

/// Exit code for a failed command, derived from the error's status code
pub fn exit_code(kind: ErrorKind) -> u8 {
    match kind.status_code() {
        400 => 2,
        404 => 3,
        409 => 4,
        _ => 1,
    }
}

/// Report a failed command on the terminal and in the event log
pub fn report_failure(
    logger: &Option<LoggingService>,
    command: &str,
    err: &anyhow::Error,
    json: bool,
) -> ExitCode {
    let kind = error_kind(err);

    let event = LogEvent::new("command_failed").with_command(command);
    let event = match err.downcast_ref::<Error>() {
        Some(core) => event.with_core_error(core),
        None => event
            .with_error(err.to_string())
            .with_error_details(format!("{:#}", err)),
    };
    log_event(logger, event);

    if json {
        let result: OperationResult<()> = OperationResult {
            success: false,
            data: None,
            error: Some(ErrorPayload {
                kind,
                message: format!("{:#}", err),
            }),
        };
        match serde_json::to_string_pretty(&result) {
            Ok(body) => println!("{}", body),
            Err(_) => output::error(&format!("{:#}", err)),
        }
    } else {
        output::error(&format!("Error: {:#}", err));
    }

    ExitCode::from(exit_code(kind))
}
