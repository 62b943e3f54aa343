// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface definition.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use pdlscout_core::config::{DEFAULT_DB_DIR, DEFAULT_TIMEOUT_SECS, ProbePorts, SessionConfig};
use pdlscout_core::types::Mode;

#[derive(Parser, Debug)]
#[command(name = "pdlscout")]
#[command(version)]
#[command(about = "Identify a network printer and check which page-description languages it speaks", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true, help = "Enable debug logging on stderr")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Probe a printer over IPP, HTTP and SNMP
    Check(CheckArgs),
    /// Inspect or extend the model database
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[arg(help = "Printer host name or IP address")]
    pub target: String,

    #[arg(short, long, help = "Language to verify: ps, pjl or pcl")]
    pub mode: Mode,

    #[arg(long, help = "Verify support before continuing; quit when nothing is found")]
    pub safe: bool,

    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECS, help = "Base timeout per probe in seconds (IPP uses twice this)")]
    pub timeout: u64,

    #[command(flatten)]
    pub db: DbLocation,

    #[arg(long, default_value_t = ProbePorts::default().ipp, help = "IPP port")]
    pub ipp_port: u16,

    #[arg(long, default_value_t = ProbePorts::default().http, help = "Web interface port")]
    pub http_port: u16,

    #[arg(long, default_value_t = ProbePorts::default().snmp, help = "SNMP port")]
    pub snmp_port: u16,

    #[arg(long, help = "Print the session report as JSON")]
    pub json: bool,
}

impl CheckArgs {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            target: self.target.clone(),
            mode: self.mode,
            safe: self.safe,
            timeout: Duration::from_secs(self.timeout),
            db_dir: self.db.db_dir.clone(),
            ports: ProbePorts {
                ipp: self.ipp_port,
                http: self.http_port,
                snmp: self.snmp_port,
            },
        }
    }
}

#[derive(Args, Debug)]
pub struct DbLocation {
    #[arg(long, env = "PDLSCOUT_DB_DIR", default_value = DEFAULT_DB_DIR, help = "Directory holding <mode>.dat model databases")]
    pub db_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// List the known models for a language
    List {
        #[arg(short, long)]
        mode: Mode,
        #[command(flatten)]
        db: DbLocation,
    },
    /// Add a model string unless an existing entry already identifies it
    Add {
        #[arg(short, long)]
        mode: Mode,
        model: String,
        #[command(flatten)]
        db: DbLocation,
    },
    /// Show which entries identify a model string
    Match {
        #[arg(short, long)]
        mode: Mode,
        model: String,
        #[command(flatten)]
        db: DbLocation,
    },
}
