//! List command implementation

use anyhow::Result;
use clap::Args;
use fileio_mcp_harness::cases;
use serde_json::json;

/// List the registered cases
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the list command
pub fn execute(args: ListArgs) -> Result<()> {
    let catalog = cases::catalog();

    if args.json {
        let output: Vec<_> = catalog
            .iter()
            .map(|case| {
                json!({
                    "name": case.name,
                    "tool": case.tool,
                    "dangerous": case.dangerous,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for case in &catalog {
            let marker = if case.dangerous { " [dangerous]" } else { "" };
            println!("{} ({}){marker}", case.name, case.tool);
        }
        println!();
        println!("{} cases", catalog.len());
    }

    Ok(())
}
