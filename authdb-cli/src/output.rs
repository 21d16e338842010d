//! Output formatting utilities

use authdb_core::User;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Vertical key/value view of one user. Secrets are shown as set/unset only.
pub fn print_user(user: &User) {
    let mut table = create_table();
    table.add_row(vec!["id".to_string(), user.id.to_string()]);
    table.add_row(vec!["email".to_string(), user.email.clone()]);
    table.add_row(vec!["hashed_password".to_string(), presence(true)]);
    table.add_row(vec!["session_id".to_string(), presence(user.has_session())]);
    table.add_row(vec!["reset_token".to_string(), presence(user.has_pending_reset())]);
    println!("{}", table);
}

fn presence(set: bool) -> String {
    if set {
        "set".to_string()
    } else {
        "-".dimmed().to_string()
    }
}
