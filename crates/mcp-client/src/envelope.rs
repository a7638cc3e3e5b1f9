//! JSON-RPC 2.0 envelopes as they appear on the wire.

use serde::Serialize;
use serde_json::Value;

use crate::error::ClientError;

pub const JSONRPC_VERSION: &str = "2.0";

/// Outgoing request. Serialized as exactly one line.
#[derive(Debug, Serialize)]
pub struct Request<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: &'a Value,
}

impl<'a> Request<'a> {
    pub fn new(id: u64, method: &'a str, params: &'a Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }

    /// # Errors
    ///
    /// [`ClientError::Encode`] if serialization fails.
    pub fn to_line(&self) -> Result<String, ClientError> {
        serde_json::to_string(self).map_err(|source| ClientError::Encode {
            method: self.method.to_string(),
            source,
        })
    }
}

/// Outgoing notification: a request without `id`, never answered.
#[derive(Debug, Serialize)]
pub struct Notification<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: &'a Value,
}

impl<'a> Notification<'a> {
    pub fn new(method: &'a str, params: &'a Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
        }
    }

    /// # Errors
    ///
    /// [`ClientError::Encode`] if serialization fails.
    pub fn to_line(&self) -> Result<String, ClientError> {
        serde_json::to_string(self).map_err(|source| ClientError::Encode {
            method: self.method.to_string(),
            source,
        })
    }
}

/// Outcome half of a response envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Result(Value),
    Error(Value),
}

/// Incoming response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub id: Value,
    pub reply: Reply,
}

impl Response {
    /// Recognize a response line.
    ///
    /// Returns `None` for anything that is not a JSON object carrying an `id`
    /// and exactly one of `result` / `error`. A `"result": null` member counts
    /// as present; an `"error": null` member counts as absent. Requests and
    /// notifications sent by the server fall out here too since they carry a
    /// `method` and neither member.
    pub fn parse(line: &str) -> Option<Self> {
        let Value::Object(mut obj) = serde_json::from_str::<Value>(line).ok()? else {
            return None;
        };
        let id = obj.remove("id")?;
        let error = obj.remove("error").filter(|e| !e.is_null());
        let reply = match (obj.remove("result"), error) {
            (Some(result), None) => Reply::Result(result),
            (None, Some(error)) => Reply::Error(error),
            _ => return None,
        };
        Some(Self { id, reply })
    }

    /// Exact identifier match. `1` matches, `"1"` and `1.0` do not.
    pub fn matches(&self, id: u64) -> bool {
        self.id.as_u64() == Some(id) && !self.id.is_f64()
    }
}
