//! Integration harness for the fileio-mcp tool server.
//!
//! The harness launches the server as a child process, speaks the stdio
//! protocol through [`fileio_mcp_client`], and runs an ordered catalog of
//! cases. Each case prepares files in its own directory, issues exactly one
//! tool call, and asserts on the normalized result.

pub mod assert;
pub mod cases;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod report;
pub mod safety;
pub mod workspace;

#[doc(inline)]
pub use error::{AssertionFailure, WorkspaceError};
#[doc(inline)]
pub use orchestrator::{
    CaseContext, CaseRecord, Counts, Orchestrator, Outcome, RunOptions, RunState, RunSummary,
    TestCase,
};
#[doc(inline)]
pub use report::{ConsoleReporter, JsonReporter, Reporter};
#[doc(inline)]
pub use safety::{EnvironmentGate, SafetyGate, SandboxProbe};
#[doc(inline)]
pub use workspace::Workspace;
