//! Add command - insert a new user

use anyhow::Result;

use super::{get_context, log_change};
use crate::output;
use authdb_core::{LoggingService, UserField, UserRepository};

pub fn run(
    logger: &Option<LoggingService>,
    email: &str,
    hashed_password: &str,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;
    let user = ctx.store.add_user(email, hashed_password)?;

    log_change(
        logger,
        "add",
        "user_added",
        &[UserField::Email, UserField::HashedPassword],
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    output::success(&format!("Added user {}", user.id));
    output::print_user(&user);
    Ok(())
}
