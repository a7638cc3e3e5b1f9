//! Assertion helpers for case bodies.

use fileio_mcp_client::ClientError;
use serde_json::Value;

use crate::error::AssertionFailure;

/// Fail the enclosing case with an [`AssertionFailure`] unless `cond` holds.
///
/// ```ignore
/// check!(lines == ["a", "b"], "Unexpected lines: {lines:?}");
/// ```
#[macro_export]
macro_rules! check {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::AssertionFailure::new(format!($($arg)+)).into());
        }
    };
}

/// Require a remote error whose message contains `needle` (case-insensitive).
///
/// # Errors
///
/// [`AssertionFailure`] if the call succeeded, failed at the transport
/// level, or failed with a different message.
pub fn expect_remote_error(
    outcome: Result<Value, ClientError>,
    needle: &str,
) -> Result<(), AssertionFailure> {
    match outcome {
        Ok(value) => Err(AssertionFailure::new(format!(
            "Expected error containing '{needle}', but the call succeeded with: {value}"
        ))),
        Err(err @ ClientError::RemoteError { .. }) => {
            let message = err.remote_message();
            if message.to_lowercase().contains(&needle.to_lowercase()) {
                Ok(())
            } else {
                Err(AssertionFailure::new(format!(
                    "Expected error containing '{needle}', got: {message}"
                )))
            }
        }
        Err(other) => Err(AssertionFailure::new(format!(
            "Expected error containing '{needle}', got transport failure: {other}"
        ))),
    }
}

/// Borrow `value` as an array of objects, or fail.
///
/// # Errors
///
/// [`AssertionFailure`] naming `what` when `value` is not an array.
pub fn as_records<'a>(value: &'a Value, what: &str) -> Result<Vec<&'a Value>, AssertionFailure> {
    value
        .as_array()
        .map(|items| items.iter().filter(|v| v.is_object()).collect())
        .ok_or_else(|| AssertionFailure::new(format!("Unexpected {what} payload: {value}")))
}

/// String field of a JSON object, or `""`.
pub fn str_field<'a>(record: &'a Value, key: &str) -> &'a str {
    record.get(key).and_then(Value::as_str).unwrap_or("")
}
