//! Session behaviour against a scripted transport that misbehaves the way
//! real servers do: stale replies, chatter on stdout, and early exit.

use fileio_mcp_client::{ClientError, MockTransport, Session, extract};
use serde_json::{Value, json};

fn request_id(line: &str) -> Option<u64> {
    serde_json::from_str::<Value>(line).ok()?.get("id")?.as_u64()
}

#[test]
fn result_always_belongs_to_the_request_just_sent() {
    let (mock, handle) = MockTransport::new();
    // Before every real answer, replay a reply for the previous id and one
    // for a future id. Only the exact match may be returned.
    handle.respond_with(|line| {
        let Some(id) = request_id(line) else {
            return Vec::new();
        };
        vec![
            json!({"jsonrpc": "2.0", "id": id.saturating_sub(1), "result": "stale"}).to_string(),
            json!({"jsonrpc": "2.0", "id": id + 1, "result": "future"}).to_string(),
            "log: handling request".to_string(),
            json!({"jsonrpc": "2.0", "id": id, "result": {"answered": id}}).to_string(),
        ]
    });

    let mut session = Session::new(Box::new(mock));
    for n in 1..=10u64 {
        let result = session.call("probe", json!({})).unwrap();
        assert_eq!(result, json!({"answered": n}));
        assert_eq!(session.last_request_id(), n);
    }
}

#[test]
fn identifiers_are_never_reused_across_calls_notifications_and_errors() {
    let (mock, handle) = MockTransport::new();
    handle.respond_with(|line| match request_id(line) {
        Some(id) if id % 2 == 0 => {
            vec![json!({"id": id, "error": {"code": -32000, "message": "even"}}).to_string()]
        }
        Some(id) => vec![json!({"id": id, "result": {}}).to_string()],
        None => Vec::new(),
    });

    let mut session = Session::new(Box::new(mock));
    for _ in 0..6 {
        let _ = session.call("m", json!({}));
        session.notify("note", json!({})).unwrap();
    }
    session.shutdown();

    let ids: Vec<u64> = handle
        .written()
        .iter()
        .filter_map(|l| request_id(l))
        .collect();
    assert_eq!(ids, (1..=7).collect::<Vec<_>>());
}

#[test]
fn tool_call_result_feeds_the_normalizer() {
    let (mock, handle) = MockTransport::new();
    handle.push_json(&json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": {"content": [{"type": "text", "text": "[\"l2\",\"l3\",\"l4\"]"}]}
    }));
    let mut session = Session::new(Box::new(mock));
    let result = session
        .tool_call("fileio_read_lines", json!({"path": "/x", "start_line": 2, "line_count": 999}))
        .unwrap();
    assert_eq!(extract(&result).unwrap(), json!(["l2", "l3", "l4"]));
}

#[test]
fn early_exit_surfaces_stream_closed_with_stderr() {
    let (mock, handle) = MockTransport::new();
    handle.push_line("starting up");
    handle.set_stderr("error: unknown protocol version");
    let mut session = Session::new(Box::new(mock));
    match session.initialize("2025-11-25").unwrap_err() {
        ClientError::StreamClosed { stderr } => {
            assert!(stderr.contains("unknown protocol version"))
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn write_failure_is_transport_closed() {
    let (mock, handle) = MockTransport::new();
    handle.close_stdin();
    let mut session = Session::new(Box::new(mock));
    let err = session.call("m", json!({})).unwrap_err();
    assert!(err.is_transport());
    assert!(matches!(err, ClientError::TransportClosed { .. }));
}

#[test]
fn result_with_null_error_member_is_accepted() {
    let (mock, handle) = MockTransport::new();
    handle.respond_with(|line| {
        let Some(id) = request_id(line) else {
            return Vec::new();
        };
        vec![json!({"jsonrpc": "2.0", "id": id, "result": {"n": id}, "error": null}).to_string()]
    });

    let mut session = Session::new(Box::new(mock));
    assert_eq!(session.call("ping", json!({})).unwrap(), json!({"n": 1}));
    assert_eq!(session.call("ping", json!({})).unwrap(), json!({"n": 2}));
}
