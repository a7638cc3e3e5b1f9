//! fileio-mcp-client library crate.
//!
//! Blocking JSON-RPC client for a tool-serving process reached over stdio:
//! newline framing, the child-process transport, the request/response
//! session, and normalization of tool results.

pub mod envelope;
pub mod error;
pub mod framing;
pub mod normalize;
pub mod session;
pub mod transport;

#[doc(inline)]
pub use error::ClientError;
#[doc(inline)]
pub use normalize::{ContentEntry, ToolResult, extract};
#[doc(inline)]
pub use session::{DEFAULT_PROTOCOL_VERSION, Session};
#[doc(inline)]
pub use transport::{
    ChildState, LineTransport, MockTransport, MockTransportHandle, ServerCommand, StdioTransport,
};
