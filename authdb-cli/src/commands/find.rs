//! Find command - look up one user by column values

use anyhow::{bail, Result};

use super::{get_context, parse_assignment};
use crate::output;
use authdb_core::{FieldValue, UserRepository};

pub fn run(criteria: &[String], unset: &[String], json: bool) -> Result<()> {
    let mut pairs = criteria
        .iter()
        .map(|raw| parse_assignment(raw))
        .collect::<Result<Vec<_>>>()?;
    pairs.extend(unset.iter().map(|key| (key.clone(), FieldValue::Null)));

    if pairs.is_empty() {
        bail!("Give at least one KEY=VALUE criterion or --unset KEY");
    }

    let ctx = get_context()?;
    let user = ctx.store.find_user_by(pairs)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        output::print_user(&user);
    }
    Ok(())
}
