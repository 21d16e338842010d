//! Schema command - show the live users table layout

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;
use authdb_core::domain::USERS_TABLE;
use authdb_core::UserField;

/// Type as written in the schema migration, if the column is a known field
fn declared_type(column: &str) -> String {
    column
        .parse::<UserField>()
        .map(|field| field.sql_type().to_string())
        .unwrap_or_else(|_| "-".to_string())
}

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let columns = ctx.store.schema_columns()?;

    if json {
        let out = serde_json::json!({
            "table": USERS_TABLE,
            "columns": columns,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", USERS_TABLE.bold());
    let mut table = output::create_table();
    table.set_header(vec!["Column", "Type", "Declared", "Nullable"]);
    for column in columns {
        let declared = declared_type(&column.name);
        table.add_row(vec![
            column.name,
            column.data_type,
            declared,
            if column.nullable { "yes" } else { "no" }.to_string(),
        ]);
    }
    println!("{}", table);
    Ok(())
}
