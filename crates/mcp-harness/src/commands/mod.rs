//! CLI command dispatch and execution

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod config_cmd;
mod list;
mod run;

/// fileio-mcp-harness - integration harness for the fileio-mcp tool server
#[derive(Parser, Debug)]
#[command(
    name = "fileio-mcp-harness",
    version,
    about = "Integration harness for the fileio-mcp tool server",
    long_about = "Starts a fileio-mcp server over stdio, runs one protocol call per case \
                  against disposable directories, and reports PASS/FAIL/SKIP per case"
)]
pub struct Cli {
    /// Path to a TOML config file (default: ./fileio-harness.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the case catalog against a server
    Run(run::RunArgs),

    /// List the registered cases
    List(list::ListArgs),

    /// Show the effective configuration and discovered server command
    Config(config_cmd::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command, returning the process exit code
    pub fn execute(self) -> Result<i32> {
        let config = self.config.as_deref();
        match self.command {
            Commands::Run(args) => run::execute(config, args),
            Commands::List(args) => list::execute(args).map(|()| 0),
            Commands::Config(args) => config_cmd::execute(config, args).map(|()| 0),
        }
    }
}
