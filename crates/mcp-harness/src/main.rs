//! fileio-mcp-harness - integration harness for the fileio-mcp tool server
//!
//! Launches the server over stdio, runs the case catalog one protocol call
//! at a time, and exits 0 only when no case failed.

use clap::Parser;

mod commands;

use commands::Cli;

fn main() {
    fileio_mcp_harness::logging::init();
    let cli = Cli::parse();

    match cli.execute() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
