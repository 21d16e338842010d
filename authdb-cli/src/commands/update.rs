//! Update command - change columns of an existing user

use anyhow::Result;

use super::{get_context, log_change, parse_assignment};
use crate::output;
use authdb_core::{Criteria, FieldValue, LoggingService, UserRepository, UserUpdate};

pub fn run(
    logger: &Option<LoggingService>,
    id: i64,
    assignments: &[String],
    clear: &[String],
    json: bool,
) -> Result<()> {
    let mut pairs = assignments
        .iter()
        .map(|raw| parse_assignment(raw))
        .collect::<Result<Vec<_>>>()?;
    pairs.extend(clear.iter().map(|key| (key.clone(), FieldValue::Null)));

    let ctx = get_context()?;
    let changed = UserUpdate::parse(pairs.iter().map(|(k, v)| (k.as_str(), v.clone())))
        .map(|update| update.fields())
        .unwrap_or_default();
    ctx.store.update_user(id, pairs)?;

    if !changed.is_empty() {
        log_change(logger, "update", "user_updated", &changed);
    }

    let user = ctx.store.find_user(&Criteria::by_id(id))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    if changed.is_empty() {
        output::warning("Nothing to update");
    } else {
        output::success(&format!("Updated user {}", id));
    }
    output::print_user(&user);
    Ok(())
}
