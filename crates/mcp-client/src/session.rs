//! Protocol session over a [`LineTransport`].
//!
//! The session assigns request identifiers, writes one request at a time and
//! reads lines until the response carrying that identifier shows up. Anything
//! else the server prints on stdout in the meantime is skipped.

use serde_json::{Value, json};

use crate::envelope::{Notification, Reply, Request, Response};
use crate::error::ClientError;
use crate::transport::LineTransport;

/// Protocol revision sent in the `initialize` request.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2025-11-25";

/// A single long-lived request/response session with one server.
pub struct Session {
    transport: Box<dyn LineTransport>,
    next_id: u64,
    closed: bool,
}

impl Session {
    pub fn new(transport: Box<dyn LineTransport>) -> Self {
        Self {
            transport,
            next_id: 1,
            closed: false,
        }
    }

    /// Perform the `initialize` handshake and send the `initialized` notification.
    ///
    /// Returns the server's `initialize` result.
    ///
    /// # Errors
    ///
    /// [`ClientError::HandshakeFailure`] if the server answers with an error;
    /// transport failures propagate unchanged.
    pub fn initialize(&mut self, protocol_version: &str) -> Result<Value, ClientError> {
        let params = json!({
            "protocolVersion": protocol_version,
            "capabilities": {},
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
        });
        let result = self.call("initialize", params).map_err(|e| match e {
            ClientError::RemoteError { error, .. } => ClientError::HandshakeFailure { error },
            other => other,
        })?;
        self.notify("initialized", json!({}))?;
        let server_info = result.get("serverInfo").cloned().unwrap_or_default();
        tracing::debug!(protocol_version, server = %server_info, "handshake complete");
        Ok(result)
    }

    /// Send a request and block until its matching response arrives.
    ///
    /// # Errors
    ///
    /// [`ClientError::RemoteError`] if the response carries `error`; transport
    /// failures (including end-of-stream) propagate unchanged.
    pub fn call(&mut self, method: &str, params: Value) -> Result<Value, ClientError> {
        let id = self.next_id;
        self.next_id += 1;

        let line = Request::new(id, method, &params).to_line()?;
        tracing::debug!(id, method, "sending request");
        self.transport.write_line(&line)?;

        loop {
            let raw = self.transport.read_line()?;
            let Some(response) = Response::parse(&raw) else {
                tracing::debug!(line = %raw, "skipping non-response line");
                continue;
            };
            if !response.matches(id) {
                tracing::debug!(
                    expected = id,
                    got = %response.id,
                    "skipping response with foreign id"
                );
                continue;
            }
            return match response.reply {
                Reply::Result(result) => Ok(result),
                Reply::Error(error) => Err(ClientError::RemoteError {
                    method: method.to_string(),
                    error,
                }),
            };
        }
    }

    /// Send a notification. Nothing is read back.
    ///
    /// # Errors
    ///
    /// Only transport-level write failures.
    pub fn notify(&mut self, method: &str, params: Value) -> Result<(), ClientError> {
        let line = Notification::new(method, &params).to_line()?;
        tracing::debug!(method, "sending notification");
        self.transport.write_line(&line)
    }

    /// `tools/call` with `{name, arguments}`; returns the raw `result`.
    ///
    /// # Errors
    ///
    /// Same as [`Session::call`].
    pub fn tool_call(&mut self, name: &str, arguments: Value) -> Result<Value, ClientError> {
        self.call(
            "tools/call",
            json!({
                "name": name,
                "arguments": arguments,
            }),
        )
    }

    /// Identifier of the most recent request, or 0 before the first one.
    pub fn last_request_id(&self) -> u64 {
        self.next_id - 1
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_alive(&mut self) -> bool {
        !self.closed && self.transport.is_alive()
    }

    /// Ask the server to shut down, then terminate the transport.
    ///
    /// The `shutdown` request is written but its reply is not awaited, and a
    /// failed write is ignored. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if self.transport.is_alive() {
            let id = self.next_id;
            self.next_id += 1;
            let params = json!({});
            match Request::new(id, "shutdown", &params).to_line() {
                Ok(line) => {
                    if let Err(e) = self.transport.write_line(&line) {
                        tracing::debug!(error = %e, "shutdown request not delivered");
                    }
                }
                Err(e) => tracing::debug!(error = %e, "shutdown request not encoded"),
            }
        }
        self.transport.shutdown();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, MockTransportHandle};

    fn session() -> (Session, MockTransportHandle) {
        let (mock, handle) = MockTransport::new();
        (Session::new(Box::new(mock)), handle)
    }

    #[test]
    fn call_returns_matching_result() {
        let (mut session, handle) = session();
        handle.push_json(&json!({"jsonrpc": "2.0", "id": 1, "result": {"ok": true}}));
        let result = session.call("ping", json!({})).unwrap();
        assert_eq!(result, json!({"ok": true}));
        assert_eq!(session.last_request_id(), 1);
    }

    #[test]
    fn call_skips_garbage_and_foreign_ids() {
        let (mut session, handle) = session();
        handle.push_line("server booting...");
        handle.push_line("{\"truncated\":");
        handle.push_json(&json!({"jsonrpc": "2.0", "id": 0, "result": "stray"}));
        handle.push_json(&json!({"jsonrpc": "2.0", "method": "notifications/message"}));
        handle.push_json(&json!({"jsonrpc": "2.0", "id": 1, "result": "mine"}));
        assert_eq!(session.call("x", json!({})).unwrap(), json!("mine"));
    }

    #[test]
    fn call_surfaces_remote_error() {
        let (mut session, handle) = session();
        handle.push_json(&json!({"id": 1, "error": {"code": -32000, "message": "boom"}}));
        match session.call("tools/call", json!({})).unwrap_err() {
            ClientError::RemoteError { method, error } => {
                assert_eq!(method, "tools/call");
                assert_eq!(error["message"], "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn call_reports_stream_closed() {
        let (mut session, handle) = session();
        handle.set_stderr("panic in server");
        let err = session.call("x", json!({})).unwrap_err();
        assert!(
            matches!(err, ClientError::StreamClosed { ref stderr } if stderr == "panic in server")
        );
    }

    #[test]
    fn ids_strictly_increase() {
        let (mut session, handle) = session();
        handle.respond_with(|line| {
            let req: Value = serde_json::from_str(line).unwrap();
            vec![json!({"id": req["id"], "result": req["id"]}).to_string()]
        });
        for expected in 1..=25u64 {
            let result = session.call("echo", json!({})).unwrap();
            assert_eq!(result, json!(expected));
        }
        let ids: Vec<u64> = handle
            .written_json()
            .iter()
            .map(|v| v["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, (1..=25).collect::<Vec<_>>());
    }

    #[test]
    fn initialize_sends_handshake_then_notification() {
        let (mut session, handle) = session();
        handle.push_json(&json!({"id": 1, "result": {"protocolVersion": "2025-11-25"}}));
        session.initialize(DEFAULT_PROTOCOL_VERSION).unwrap();

        let written = handle.written_json();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0]["method"], "initialize");
        assert_eq!(written[0]["params"]["protocolVersion"], "2025-11-25");
        assert_eq!(written[0]["params"]["capabilities"], json!({}));
        assert_eq!(written[1]["method"], "initialized");
        assert!(written[1].get("id").is_none());
    }

    #[test]
    fn initialize_returns_server_reply() {
        let reply = json!({
            "protocolVersion": "2025-06-18",
            "serverInfo": {"name": "fileio-mcp", "version": "1.2.3"}
        });
        {
            let (mut session, handle) = session();
            handle.push_json(&json!({"id": 1, "result": reply}));
            assert_eq!(session.initialize("2025-06-18").unwrap(), reply);
        }
        {
            let (mut session, handle) = session();
            handle.push_json(&json!({"id": 1, "result": {"protocolVersion": "2025-06-18"}}));
            let result = session.initialize("2025-06-18").unwrap();
            assert!(result.get("serverInfo").is_none());
        }
    }

    #[test]
    fn initialize_error_is_handshake_failure() {
        let (mut session, handle) = session();
        handle.push_json(&json!({"id": 1, "error": {"message": "unsupported protocol"}}));
        let err = session.initialize("1999-01-01").unwrap_err();
        assert!(matches!(err, ClientError::HandshakeFailure { .. }), "{err}");
        assert_eq!(err.remote_message(), "unsupported protocol");
    }

    #[test]
    fn notify_does_not_read() {
        let (mut session, handle) = session();
        session.notify("initialized", json!({})).unwrap();
        assert_eq!(handle.written().len(), 1);
        assert_eq!(session.last_request_id(), 0);
    }

    #[test]
    fn tool_call_wraps_name_and_arguments() {
        let (mut session, handle) = session();
        handle.push_json(&json!({"id": 1, "result": {"content": []}}));
        session
            .tool_call("fileio_read_lines", json!({"path": "/tmp/x"}))
            .unwrap();
        let sent = &handle.written_json()[0];
        assert_eq!(sent["method"], "tools/call");
        assert_eq!(sent["params"]["name"], "fileio_read_lines");
        assert_eq!(sent["params"]["arguments"]["path"], "/tmp/x");
    }

    #[test]
    fn shutdown_sends_request_without_waiting_and_is_idempotent() {
        let (mut session, handle) = session();
        session.shutdown();
        session.shutdown();
        let written = handle.written_json();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0]["method"], "shutdown");
        assert_eq!(handle.shutdown_count(), 1);
        assert!(session.is_closed());
    }

    #[test]
    fn drop_shuts_down_transport() {
        let (session, handle) = session();
        drop(session);
        assert_eq!(handle.shutdown_count(), 1);
        assert!(!handle.is_alive());
    }

    #[test]
    fn shutdown_tolerates_closed_stdin() {
        let (mut session, handle) = session();
        handle.close_stdin();
        session.shutdown();
        assert_eq!(handle.shutdown_count(), 1);
    }
}
