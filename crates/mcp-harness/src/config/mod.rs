//! Configuration resolution for fileio-mcp-harness.
//!
//! The entry point is [`resolve_config`], which layers environment variables
//! over an optional `fileio-harness.toml` and compiled-in defaults.
//!
//! See [`resolve`] for the full priority chain and [`types`] for all config types.

mod resolve;
mod types;

pub use resolve::{DEFAULT_CONFIG_FILE, ResolvedConfig, resolve_config, resolve_config_in};
pub use types::{HarnessConfig, RunConfig, ServerConfig};
