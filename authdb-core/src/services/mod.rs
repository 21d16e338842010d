//! Service layer
//!
//! Schema migrations for the store and the event log, and the event log itself.

pub mod logging;
pub mod migration;

pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
