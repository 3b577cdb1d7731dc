// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod commands;
mod error;

use std::io::Write;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use dorm_lottery_api::{BedSelectionCoordinator, CoordinatorConfig, DEFAULT_LOCK_TIMEOUT};
use dorm_lottery_persistence::Persistence;
use serde_json::Value;
use tracing::info;

use crate::commands::{Commands, execute};
use crate::error::CliError;

/// Dorm lottery - room type lottery and bed selection
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long, global = true)]
    database: Option<String>,

    /// Upper bound on waiting for a bed lock, in milliseconds.
    #[arg(long, global = true, default_value_t = default_lock_timeout_ms())]
    lock_timeout_ms: u64,

    /// The authenticated account issuing the command.
    #[arg(long = "as", global = true, value_name = "ACCOUNT_ID")]
    actor: Option<i64>,

    #[command(subcommand)]
    command: Commands,
}

fn default_lock_timeout_ms() -> u64 {
    u64::try_from(DEFAULT_LOCK_TIMEOUT.as_millis()).unwrap_or(u64::MAX)
}

fn open_persistence(database: Option<&str>) -> Result<Persistence, CliError> {
    let persistence: Persistence = if let Some(db_path) = database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };
    Ok(persistence)
}

fn run(args: Args) -> Result<Value, CliError> {
    let persistence: Persistence = open_persistence(args.database.as_deref())?;
    let config: CoordinatorConfig =
        CoordinatorConfig::with_lock_timeout(Duration::from_millis(args.lock_timeout_ms));
    let coordinator: BedSelectionCoordinator =
        BedSelectionCoordinator::new(Arc::new(Mutex::new(persistence)), config);

    execute(&coordinator, args.actor, args.command)
}

fn main() -> ExitCode {
    let args: Args = Args::parse();

    // Logs go to stderr so stdout carries only JSON
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(args) {
        Ok(output) => {
            let rendered: String =
                serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string());
            let mut stdout: std::io::StdoutLock<'_> = std::io::stdout().lock();
            if writeln!(stdout, "{rendered}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            let rendered: String = serde_json::to_string_pretty(&err.to_response())
                .unwrap_or_else(|_| err.message.clone());
            let mut stderr: std::io::StderrLock<'_> = std::io::stderr().lock();
            let _ = writeln!(stderr, "{rendered}");
            ExitCode::from(err.exit_code)
        }
    }
}

#[cfg(test)]
mod tests;
