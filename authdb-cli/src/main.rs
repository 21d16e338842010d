//! authdb CLI - inspect and edit the user store from a terminal

use std::process::ExitCode;

use anyhow::Result;
use authdb_core::LoggingService;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{add, find, logs, reset, schema, update};

/// authdb - user-account store for authentication flows
#[derive(Parser)]
#[command(name = "authdb", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a user (the password must already be hashed)
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        hashed_password: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find the first user matching every KEY=VALUE criterion
    Find {
        /// Criteria such as email=a@x.com or id=3
        criteria: Vec<String>,
        /// Match users where this column is unset
        #[arg(long)]
        unset: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update columns of one user
    Update {
        /// User id
        id: i64,
        /// Assignments such as session_id=abc
        assignments: Vec<String>,
        /// Set this column to NULL
        #[arg(long)]
        clear: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete every user and recreate the table
    Reset {
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Show the users table layout
    Schema {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Add { .. } => "add",
            Commands::Find { .. } => "find",
            Commands::Update { .. } => "update",
            Commands::Reset { .. } => "reset",
            Commands::Schema { .. } => "schema",
            Commands::Logs { .. } => "logs",
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,authdb::sql=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let logger = commands::get_logger();
    let command = cli.command.name();
    commands::log_command(&logger, command);

    match run(cli, &logger) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            commands::log_failure(&logger, command, &e);
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, logger: &Option<LoggingService>) -> Result<()> {
    match cli.command {
        Commands::Add { email, hashed_password, json } => {
            add::run(logger, &email, &hashed_password, json)
        }
        Commands::Find { criteria, unset, json } => find::run(&criteria, &unset, json),
        Commands::Update { id, assignments, clear, json } => {
            update::run(logger, id, &assignments, &clear, json)
        }
        Commands::Reset { force } => reset::run(logger, force),
        Commands::Schema { json } => schema::run(json),
        Commands::Logs { command } => logs::run(command),
    }
}
