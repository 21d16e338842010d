//! CLI command implementations

pub mod add;
pub mod find;
pub mod logs;
pub mod reset;
pub mod schema;
pub mod update;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use authdb_core::{AuthDbContext, EntryPoint, FieldValue, LogEvent, LoggingService, UserField};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let data_dir = get_data_dir().ok()?;
    std::fs::create_dir_all(&data_dir).ok()?;
    match LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")) {
        Ok(logger) => Some(logger),
        Err(e) => {
            tracing::debug!(error = %e, "event log unavailable");
            None
        }
    }
}

/// Record a command run, ignoring failures (logging never breaks the app)
pub fn log_command(logger: &Option<LoggingService>, command: &str) {
    if let Some(l) = logger {
        let _ = l.log_command(command);
    }
}

/// Record a failed command with the error's kind
pub fn log_failure(logger: &Option<LoggingService>, command: &str, error: &anyhow::Error) {
    if let Some(l) = logger {
        let event = LogEvent::new("command_failed").with_command(command);
        let event = match error.downcast_ref::<authdb_core::Error>() {
            Some(core) => event.with_error(core),
            None => event.with_error_message(error.to_string()),
        };
        let _ = l.log(event);
    }
}

/// Record a successful change, listing only the columns touched
pub fn log_change(
    logger: &Option<LoggingService>,
    command: &str,
    event: &str,
    fields: &[UserField],
) {
    if let Some(l) = logger {
        let mut event = LogEvent::new(event).with_command(command);
        if !fields.is_empty() {
            event = event.with_fields(fields);
        }
        let _ = l.log(event);
    }
}

/// Data directory from AUTHDB_DIR or ~/.authdb
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("AUTHDB_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".authdb"))
        .ok_or_else(|| anyhow!("Could not find home directory; set AUTHDB_DIR"))
}

/// Open the store described by the data directory's settings
pub fn get_context() -> Result<AuthDbContext> {
    let data_dir = get_data_dir()?;

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    AuthDbContext::new(&data_dir).context("Failed to open user store")
}

/// Split `key=value`. The value is typed by the column when the key names
/// one; unknown keys pass through so the store reports them.
pub fn parse_assignment(raw: &str) -> Result<(String, FieldValue)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    let value = match key.parse::<UserField>() {
        Ok(field) => field.parse_value(value)?,
        Err(_) => FieldValue::Text(value.to_string()),
    };
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment_types_id() {
        let (key, value) = parse_assignment("id=12").unwrap();
        assert_eq!(key, "id");
        assert_eq!(value, FieldValue::Integer(12));
    }

    #[test]
    fn test_parse_assignment_keeps_equals_in_value() {
        let (key, value) = parse_assignment("reset_token=a=b").unwrap();
        assert_eq!(key, "reset_token");
        assert_eq!(value, FieldValue::Text("a=b".to_string()));
    }

    #[test]
    fn test_parse_assignment_passes_unknown_key_through() {
        let (key, _) = parse_assignment("bogus=x").unwrap();
        assert_eq!(key, "bogus");
    }

    #[test]
    fn test_parse_assignment_requires_equals() {
        assert!(parse_assignment("email").is_err());
        assert!(parse_assignment("id=abc").is_err());
    }

    #[test]
    fn test_command_and_change_events_share_one_log() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Some(LoggingService::new(dir.path(), EntryPoint::Cli, "test").unwrap());

        log_command(&logger, "update");
        log_change(&logger, "update", "user_updated", &[UserField::SessionId]);

        let reader = LoggingService::new(dir.path(), EntryPoint::Cli, "test").unwrap();
        let entries = reader.get_recent(10).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .any(|e| e.event == "user_updated" && e.fields.as_deref() == Some("session_id")));
    }
}
