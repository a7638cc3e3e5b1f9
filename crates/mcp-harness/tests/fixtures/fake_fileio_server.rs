//! Scripted stand-in for the fileio-mcp server, used by the integration tests.
//!
//! Reads newline-delimited JSON-RPC from stdin and answers on stdout.
//!
//! # Supported methods
//!
//! - `initialize`: accepts the known protocol revisions, rejects others
//! - `initialized` / `notifications/initialized`: accepted, no response
//! - `tools/call`: see below
//! - `shutdown`: answers with a `null` result
//!
//! # Tools
//!
//! - `fileio_write_file`, `fileio_read_lines`: real implementations
//! - `fileio_get_basename`: answers with a `json` content entry
//! - `fileio_get_current_directory`: answers with a `text` entry
//! - `crash`: exits with code 42
//!
//! # Environment switches
//!
//! - `FAKE_FILEIO_NOISE=1`: before every response, print garbage, a
//!   notification, and responses carrying foreign or string ids
//! - `FAKE_FILEIO_STDERR=1`: log every request to stderr
//! - `FAKE_FILEIO_REJECT_INIT=1`: answer `initialize` with an error
//! - `FAKE_FILEIO_IGNORE_SIGTERM=1`: ignore SIGTERM and keep running after
//!   stdin closes, so only a kill stops the process

use serde_json::{Map, Value, json};
use std::io::{BufRead, BufReader, Write};

const SUPPORTED_VERSIONS: &[&str] = &["2025-11-25", "2025-06-18", "2025-03-26"];

fn flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| v == "1")
}

fn main() {
    let ignore_term = flag("FAKE_FILEIO_IGNORE_SIGTERM");
    #[cfg(unix)]
    if ignore_term {
        // SAFETY: installing SIG_IGN for SIGTERM before any threads exist.
        unsafe {
            libc::signal(libc::SIGTERM, libc::SIG_IGN);
        }
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let reader = BufReader::new(stdin.lock());
    let mut writer = stdout.lock();

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let msg: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(_) => continue,
        };

        if flag("FAKE_FILEIO_STDERR") {
            eprintln!("fake-fileio-mcp: received {line}");
        }

        handle_message(&msg, &mut writer);
    }

    if ignore_term {
        loop {
            std::thread::sleep(std::time::Duration::from_secs(60));
        }
    }
}

fn handle_message(msg: &Value, writer: &mut impl Write) {
    let method = msg.get("method").and_then(|v| v.as_str());
    let Some(id) = msg.get("id").cloned() else {
        // Notifications have no response
        return;
    };

    if flag("FAKE_FILEIO_NOISE") {
        write_noise(writer, &id);
    }

    let reply = match method {
        Some("initialize") => initialize(msg),
        Some("tools/call") => {
            let name = msg
                .pointer("/params/name")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            let arguments = msg
                .pointer("/params/arguments")
                .cloned()
                .unwrap_or(json!({}));
            call_tool(name, &arguments)
        }
        Some("shutdown") => Ok(Value::Null),
        Some(unknown) => Err((-32601, format!("Method not found: {unknown}"))),
        None => return,
    };

    let resp = match reply {
        Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
        Err((code, message)) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": code, "message": message}
        }),
    };
    write_msg(writer, &resp);
}

fn write_noise(writer: &mut impl Write, id: &Value) {
    let _ = writeln!(writer, "fake-fileio-mcp: this is not JSON");
    write_msg(
        writer,
        &json!({"jsonrpc": "2.0", "method": "notifications/message", "params": {"level": "info"}}),
    );
    write_msg(writer, &json!({"jsonrpc": "2.0", "id": 999_999, "result": {"stray": true}}));
    if let Some(n) = id.as_u64() {
        write_msg(
            writer,
            &json!({"jsonrpc": "2.0", "id": n.to_string(), "result": {"stringly": true}}),
        );
        write_msg(
            writer,
            &json!({"jsonrpc": "2.0", "id": n + 1, "error": {"code": -1, "message": "future"}}),
        );
    }
    write_msg(writer, &json!({"jsonrpc": "2.0", "id": id}));
}

type Reply = Result<Value, (i64, String)>;

fn initialize(msg: &Value) -> Reply {
    if flag("FAKE_FILEIO_REJECT_INIT") {
        return Err((-32602, "Handshake rejected by fixture".to_string()));
    }
    let version = msg
        .pointer("/params/protocolVersion")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err((-32602, format!("Unsupported protocol version: {version}")));
    }
    Ok(json!({
        "protocolVersion": version,
        "capabilities": {"tools": {"listChanged": false}},
        "serverInfo": {"name": "fake-fileio-mcp", "version": "0.1.0"}
    }))
}

fn text(s: impl Into<String>) -> Value {
    json!({"content": [{"type": "text", "text": s.into()}]})
}

fn tool_error(message: impl Into<String>) -> (i64, String) {
    (-32000, message.into())
}

fn call_tool(name: &str, args: &Value) -> Reply {
    match name {
        "crash" => std::process::exit(42),
        "fileio_write_file" => write_file(args),
        "fileio_read_lines" => read_lines(args),
        "fileio_get_basename" => {
            let path = args.get("path").and_then(|v| v.as_str()).unwrap_or("");
            let base = std::path::Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(json!({"content": [{"type": "json", "value": base}]}))
        }
        "fileio_get_current_directory" => std::env::current_dir()
            .map(|d| text(d.to_string_lossy()))
            .map_err(|e| tool_error(format!("Failed to get current directory: {e}"))),
        other => Err(tool_error(format!("Unknown tool: {other}"))),
    }
}

fn write_file(args: &Value) -> Reply {
    let path = args
        .get("path")
        .and_then(|v| v.as_str())
        .ok_or_else(|| tool_error("Missing path"))?;
    let content = args.get("content").and_then(|v| v.as_str()).unwrap_or("");
    let append = args.get("append").and_then(|v| v.as_bool()).unwrap_or(false);
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .map_err(|e| tool_error(format!("Failed to open file {path}: {e}")))?;
    file.write_all(content.as_bytes())
        .map_err(|e| tool_error(format!("Failed to write file {path}: {e}")))?;
    Ok(text(format!("Wrote {} bytes to {path}", content.len())))
}

/// Non-negative integer argument, or `None` when absent.
fn index_arg(args: &Map<String, Value>, key: &str) -> Result<Option<usize>, (i64, String)> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| tool_error(format!("{key} must be a non-negative integer"))),
    }
}

fn read_lines(args: &Value) -> Reply {
    let empty = Map::new();
    let args = args.as_object().unwrap_or(&empty);
    let path = args
        .get("path")
        .and_then(|v| v.as_str())
        .ok_or_else(|| tool_error("Missing path"))?;
    let start_line = index_arg(args, "start_line")?;
    let end_line = index_arg(args, "end_line")?;
    let line_count = index_arg(args, "line_count")?;
    let start_offset = index_arg(args, "start_offset")?;

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(tool_error(format!("File not found: {path}")));
        }
        Err(e) => return Err(tool_error(format!("Failed to open file {path}: {e}"))),
    };
    let lines: Vec<&str> = content.lines().collect();
    let len = lines.len();

    let start = match (start_line, start_offset) {
        (Some(0), _) => return Err(tool_error("Line numbers start at 1")),
        (Some(n), _) => n - 1,
        (None, Some(offset)) => offset,
        (None, None) => 0,
    };
    let end = match (end_line, line_count) {
        (Some(0), _) => return Err(tool_error("Line numbers start at 1")),
        (Some(n), _) if n < start_line.unwrap_or(1) => {
            return Err(tool_error("end_line must be >= start_line"));
        }
        (Some(n), _) => n,
        (None, Some(count)) => start.saturating_add(count),
        (None, None) => len,
    };
    if start > len {
        return Err(tool_error(format!(
            "start_line {} exceeds file length {len}",
            start + 1
        )));
    }
    let end = end.min(len);
    if start > end {
        return Err(tool_error("start_line must be <= end_line"));
    }

    let selected: Vec<&str> = lines[start..end].to_vec();
    Ok(text(serde_json::to_string(&selected).unwrap_or_else(|_| "[]".to_string())))
}

fn write_msg(writer: &mut impl Write, msg: &Value) {
    let s = msg.to_string();
    if writeln!(writer, "{s}").and_then(|()| writer.flush()).is_err() {
        std::process::exit(0);
    }
}
