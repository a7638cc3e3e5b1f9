//! The per-tool case catalog.
//!
//! Every case follows the same recipe: prepare files in its own directory,
//! issue exactly one tool call, then assert on the normalized result or on
//! the filesystem. Registration order is execution order.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::error::AssertionFailure;
use crate::orchestrator::TestCase;

mod counts;
mod directories;
#[cfg(unix)]
mod links;
#[cfg(unix)]
mod metadata;
#[cfg(unix)]
mod ownership;
mod patch;
mod paths;
mod read_lines;
mod search;
mod transfer;
mod write_file;

/// All cases, in execution order.
pub fn catalog() -> Vec<TestCase> {
    let mut cases = Vec::new();
    cases.extend(write_file::cases());
    cases.extend(read_lines::cases());
    #[cfg(unix)]
    cases.extend(metadata::cases());
    cases.extend(directories::cases());
    cases.extend(search::cases());
    cases.extend(patch::cases());
    cases.extend(transfer::cases());
    #[cfg(unix)]
    cases.extend(links::cases());
    cases.extend(paths::cases());
    cases.extend(counts::cases());
    #[cfg(unix)]
    cases.extend(ownership::cases());
    cases
}

/// Path as the string form tools receive.
pub(crate) fn arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Text of a scalar JSON value without quoting strings.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Lines from a `read_lines` payload: plain strings, or objects with `content`.
pub(crate) fn lines_of(value: &Value) -> Result<Vec<String>, AssertionFailure> {
    let unexpected = || AssertionFailure::new(format!("Unexpected read_lines payload: {value}"));
    let items = value.as_array().ok_or_else(unexpected)?;
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            Value::Object(map) => map
                .get("content")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(unexpected),
            _ => Err(unexpected()),
        })
        .collect()
}

/// Index an array of result records by one of their string fields.
pub(crate) fn index_by<'a>(value: &'a Value, key: &str) -> BTreeMap<String, &'a Value> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.get(key)
                        .and_then(Value::as_str)
                        .map(|k| (k.to_string(), item))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// True if `value` is a non-empty array whose records all have `status == "ok"`.
pub(crate) fn all_ok(value: &Value) -> bool {
    value.as_array().is_some_and(|items| {
        items
            .iter()
            .all(|r| r.get("status").and_then(Value::as_str) == Some("ok"))
    })
}

/// `status` of the first result record, lowercased.
pub(crate) fn first_status(value: &Value) -> String {
    value
        .as_array()
        .and_then(|items| items.first())
        .and_then(|r| r.get("status"))
        .map(scalar_text)
        .unwrap_or_default()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique_and_tools_prefixed() {
        let catalog = catalog();
        let mut seen = HashSet::new();
        for case in &catalog {
            assert!(seen.insert(case.name.clone()), "duplicate case {}", case.name);
            assert!(case.tool.starts_with("fileio_"), "{}", case.tool);
            assert!(case.name.starts_with(&case.tool), "{} / {}", case.name, case.tool);
        }
    }

    #[test]
    fn catalog_starts_with_write_file() {
        let catalog = catalog();
        assert_eq!(catalog[0].name, "fileio_write_file_overwrite");
        assert_eq!(catalog[1].name, "fileio_write_file_append");
        assert_eq!(catalog[2].name, "fileio_read_lines_ok");
    }

    #[cfg(unix)]
    #[test]
    fn only_ownership_is_dangerous() {
        let dangerous: Vec<String> = catalog()
            .into_iter()
            .filter(|c| c.dangerous)
            .map(|c| c.name)
            .collect();
        assert_eq!(dangerous, vec!["fileio_change_ownership"]);
        assert_eq!(catalog().last().unwrap().name, "fileio_change_ownership");
    }

    #[test]
    fn start_offset_case_is_pinned() {
        assert!(
            catalog()
                .iter()
                .any(|c| c.name == "fileio_read_lines_start_offset_is_line_index")
        );
    }

    #[test]
    fn lines_of_accepts_both_shapes() {
        assert_eq!(lines_of(&json!(["a", "b"])).unwrap(), vec!["a", "b"]);
        assert_eq!(
            lines_of(&json!([{"line": 1, "content": "a"}, {"line": 2, "content": "b"}])).unwrap(),
            vec!["a", "b"]
        );
        assert!(lines_of(&json!([])).unwrap().is_empty());
        assert!(lines_of(&json!("a\nb")).is_err());
        assert!(lines_of(&json!([1, 2])).is_err());
    }

    #[test]
    fn status_helpers() {
        assert!(all_ok(&json!([{"status": "ok"}, {"status": "ok"}])));
        assert!(!all_ok(&json!([{"status": "ok"}, {"status": "error: x"}])));
        assert!(!all_ok(&json!({"status": "ok"})));
        assert_eq!(
            first_status(&json!([{"status": "Error: Directory is not empty"}])),
            "error: directory is not empty"
        );
        assert_eq!(first_status(&json!([])), "");
    }

    #[test]
    fn index_by_skips_records_without_key() {
        let value = json!([{"path": "/a", "exists": true}, {"exists": false}, {"path": "/b"}]);
        let idx = index_by(&value, "path");
        assert_eq!(idx.len(), 2);
        assert_eq!(idx["/a"]["exists"], true);
    }

    #[test]
    fn scalar_text_unquotes_strings() {
        assert_eq!(scalar_text(&json!("755")), "755");
        assert_eq!(scalar_text(&json!(2)), "2");
    }
}
