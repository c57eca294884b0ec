//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod account;
mod doctor;
pub mod ledger;
pub mod logging;
pub mod migration;
mod status;

pub use account::{AccountService, AccountStatistics, AccountView, OperationReceipt, MIN_HOLDER_NAME_LEN};
pub use doctor::{CheckResult, DoctorResult, DoctorService, DoctorSummary};
pub use ledger::{AccountState, LedgerOutcome, LedgerService};
pub use logging::{EntryPoint, LogEntry, LogEvent, LogStats, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use status::{AccountSummary, StatusService, StatusSummary};
