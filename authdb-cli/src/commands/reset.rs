//! Reset command - drop and recreate the users table

use anyhow::Result;
use dialoguer::Confirm;

use super::{get_context, log_change};
use crate::output;
use authdb_core::{LoggingService, UserRepository};

pub fn run(logger: &Option<LoggingService>, force: bool) -> Result<()> {
    let ctx = get_context()?;
    let count = ctx.store.count_users()?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete all {} users?", count))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    ctx.store.reset()?;
    log_change(logger, "reset", "store_reset", &[]);

    output::success(&format!("Removed {} users", count));
    Ok(())
}
