// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdlscout — check which page-description languages a network printer speaks.
//
// Entry point. Initialises logging, parses arguments and runs either a
// capability session or a model-database command.

mod cli;
mod output;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pdlscout_core::types::Verdict;
use pdlscout_probe::{CapabilitySession, ModelDatabase};

use cli::{CheckArgs, Cli, Command, DbCommand};
use output::Console;

/// Exit status when safe mode found no evidence of support. Non-zero so
/// scripts can tell it from a confirmed printer; older tooling exited 0 here.
const ABORT_EXIT: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }
    let console = Console::new(!cli.no_color);

    match cli.command {
        Command::Check(args) => check(args, &console).await,
        Command::Db(command) => {
            database(command);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn check(args: CheckArgs, console: &Console) -> Result<ExitCode> {
    let config = args.session_config();
    config.validate().context("invalid session configuration")?;

    tracing::debug!(?config, "session configuration");

    let mut session = CapabilitySession::new(config);
    let report = session.run(|probe| console.probe(probe)).await;

    if report.verdict != Verdict::Skipped {
        console.summary(&report);
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("cannot serialise session report")?
        );
    }

    match report.verdict {
        Verdict::Abort => {
            println!();
            console.notice("Quitting as we are in safe mode.");
            Ok(ExitCode::from(ABORT_EXIT))
        }
        Verdict::Continue => {
            println!();
            Ok(ExitCode::SUCCESS)
        }
        Verdict::Skipped => Ok(ExitCode::SUCCESS),
    }
}

fn database(command: DbCommand) {
    match command {
        DbCommand::List { mode, db } => {
            let database = ModelDatabase::open(db.db_dir);
            for entry in database.load(mode) {
                println!("{entry}");
            }
        }
        DbCommand::Add { mode, model, db } => {
            let database = ModelDatabase::open(db.db_dir);
            if database.add(mode, &model) {
                println!("added '{}' to {}", model.trim(), database.path(mode).display());
            } else {
                println!("'{}' not added (empty or already known)", model.trim());
            }
        }
        DbCommand::Match { mode, model, db } => {
            let database = ModelDatabase::open(db.db_dir);
            let matches = database.matches(mode, &model);
            if matches.is_empty() {
                println!("no {mode} entry identifies '{model}'");
            }
            for entry in matches {
                println!("{entry}");
            }
        }
    }
}
