//! Run command implementation

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use fileio_mcp_client::{LineTransport, StdioTransport};
use fileio_mcp_harness::cases;
use fileio_mcp_harness::config::resolve_config;
use fileio_mcp_harness::discovery::discover_server;
use fileio_mcp_harness::orchestrator::{Orchestrator, RunOptions};
use fileio_mcp_harness::report::{ConsoleReporter, JsonReporter, Reporter};
use fileio_mcp_harness::safety::EnvironmentGate;

/// Run the case catalog against a server
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Only run cases whose name contains this substring
    #[arg(long)]
    filter: Option<String>,

    /// Keep the test directory after the run
    #[arg(long)]
    keep_test_dir: bool,

    /// Run cases that change ownership or other privileged state
    #[arg(long)]
    run_dangerous: bool,

    /// Server executable to launch (skips discovery)
    #[arg(long)]
    server_bin: Option<PathBuf>,

    /// Working directory of the server process
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the run command
pub fn execute(config_path: Option<&Path>, args: RunArgs) -> Result<i32> {
    let mut cfg = resolve_config(config_path)?.harness;

    if args.filter.is_some() {
        cfg.run.filter = args.filter;
    }
    if args.keep_test_dir {
        cfg.run.keep_test_dir = true;
    }
    if args.run_dangerous {
        cfg.run.run_dangerous = true;
    }
    if args.server_bin.is_some() {
        cfg.server.command = args.server_bin;
    }
    if args.workdir.is_some() {
        cfg.server.workdir = args.workdir;
    }

    let workdir = match cfg.server.workdir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let workdir = std::fs::canonicalize(&workdir).unwrap_or(workdir);
    let (command, origin) = discover_server(&cfg.server, &workdir);
    tracing::info!(command = %command, origin = origin.as_str(), "server command");

    let options = RunOptions {
        protocol_version: cfg.server.protocol_version.clone(),
        server_workdir: workdir,
        keep_workspace: cfg.run.keep_test_dir,
        temp_parent: cfg.run.temp_parent.clone(),
        filter: cfg.run.filter.clone(),
    };
    let mut orchestrator = Orchestrator::new(
        Box::new(EnvironmentGate::from_config(&cfg.run)),
        options,
    );
    orchestrator.register_all(cases::catalog());

    let timeout = Duration::from_millis(cfg.server.shutdown_timeout_ms);
    let connect = move || {
        StdioTransport::spawn(command, timeout).map(|t| Box::new(t) as Box<dyn LineTransport>)
    };

    let mut reporter: Box<dyn Reporter> = if args.json {
        Box::new(JsonReporter::stdout())
    } else {
        Box::new(ConsoleReporter::stdout())
    };
    let summary = orchestrator.run(connect, reporter.as_mut());

    Ok(summary.exit_code())
}
