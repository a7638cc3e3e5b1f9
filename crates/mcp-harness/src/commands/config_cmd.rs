//! Config command implementation

use std::path::Path;

use anyhow::Result;
use clap::Args;
use fileio_mcp_harness::config::resolve_config;
use fileio_mcp_harness::discovery::discover_server;
use fileio_mcp_harness::safety::{EnvironmentGate, SafetyGate};
use serde_json::json;

/// Show effective configuration
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the config command
pub fn execute(config_path: Option<&Path>, args: ConfigArgs) -> Result<()> {
    let resolved = resolve_config(config_path)?;
    let cfg = &resolved.harness;

    let workdir = match cfg.server.workdir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let (command, origin) = discover_server(&cfg.server, &workdir);
    let dangerous_allowed = EnvironmentGate::from_config(&cfg.run).is_dangerous_allowed();
    let source = resolved
        .source
        .as_ref()
        .map(|p| p.display().to_string());

    if args.json {
        let output = json!({
            "config": cfg,
            "source": source,
            "serverCommand": {
                "program": command.program,
                "args": command.args,
                "workdir": command.workdir,
                "origin": origin.as_str(),
            },
            "dangerousAllowed": dangerous_allowed,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let source = source.unwrap_or_else(|| "defaults".to_string());
        println!("Configuration (from {source}):");
        println!("  protocol_version: {}", cfg.server.protocol_version);
        println!("  shutdown_timeout_ms: {}", cfg.server.shutdown_timeout_ms);
        println!("  workdir: {}", workdir.display());
        println!("  keep_test_dir: {}", cfg.run.keep_test_dir);
        println!("  run_dangerous: {}", cfg.run.run_dangerous);
        println!("  ignore_sandbox: {}", cfg.run.ignore_sandbox);
        if let Some(ref filter) = cfg.run.filter {
            println!("  filter: {filter}");
        }
        println!();
        println!("Server command ({}):", origin.as_str());
        println!("  {command}");
        println!();
        let status = if dangerous_allowed { "enabled" } else { "disabled" };
        println!("Dangerous cases: {status}");
    }

    Ok(())
}
