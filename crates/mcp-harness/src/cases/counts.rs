use std::fs;

use serde_json::{Value, json};

use super::{arg, scalar_text};
use crate::check;
use crate::orchestrator::{CaseContext, TestCase};

pub(super) fn cases() -> Vec<TestCase> {
    vec![
        TestCase::new("fileio_count_lines_ok", "fileio_count_lines", count_lines),
        TestCase::new(
            "fileio_count_lines_string_path_errors",
            "fileio_count_lines",
            count_lines_string_path,
        ),
        TestCase::new(
            "fileio_count_lines_missing_status",
            "fileio_count_lines",
            count_lines_missing,
        ),
        TestCase::new("fileio_count_words_ok", "fileio_count_words", count_words),
        TestCase::new(
            "fileio_count_words_missing_status",
            "fileio_count_words",
            count_words_missing,
        ),
    ]
}

/// `key` of the first record, as text.
fn first_field(value: &Value, key: &str) -> Option<String> {
    value
        .as_array()
        .and_then(|items| items.first())
        .and_then(|r| r.get(key))
        .map(scalar_text)
}

fn first_exists(value: &Value) -> Option<bool> {
    value
        .as_array()
        .and_then(|items| items.first())
        .and_then(|r| r.get("exists"))
        .and_then(Value::as_bool)
}

fn count_lines(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("c.txt");
    fs::write(&path, "a\nb\n")?;
    let value = ctx.call_value("fileio_count_lines", json!({"path": [arg(&path)]}))?;
    check!(
        first_field(&value, "lines").as_deref() == Some("2"),
        "Unexpected count_lines: {value}"
    );
    Ok(())
}

fn count_lines_string_path(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("c.txt");
    fs::write(&path, "a\n")?;
    ctx.expect_error(
        "fileio_count_lines",
        json!({"path": arg(&path)}),
        "Path must be an array of strings",
    )
}

fn count_lines_missing(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("missing.txt");
    let value = ctx.call_value("fileio_count_lines", json!({"path": [arg(&path)]}))?;
    check!(
        first_exists(&value) == Some(false),
        "Unexpected count_lines missing: {value}"
    );
    Ok(())
}

fn count_words(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("w.txt");
    fs::write(&path, "hello world\nfoo")?;
    let value = ctx.call_value("fileio_count_words", json!({"path": [arg(&path)]}))?;
    check!(
        first_field(&value, "words").as_deref() == Some("3"),
        "Unexpected count_words: {value}"
    );
    Ok(())
}

fn count_words_missing(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("missing.txt");
    let value = ctx.call_value("fileio_count_words", json!({"path": [arg(&path)]}))?;
    check!(
        first_exists(&value) == Some(false),
        "Unexpected count_words missing: {value}"
    );
    Ok(())
}
