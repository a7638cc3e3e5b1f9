//! `fileio_read_lines` cases.
//!
//! `start_line`/`end_line` are 1-based and inclusive, `line_count` counts
//! from the start, and an end past EOF is clamped. `start_offset` is applied
//! as a zero-based line index even though the tool describes it as a byte
//! offset; `fileio_read_lines_start_offset_is_line_index` pins that.

use std::fs;

use serde_json::{Value, json};

use super::{arg, lines_of};
use crate::check;
use crate::orchestrator::{CaseContext, TestCase};

const TOOL: &str = "fileio_read_lines";

pub(super) fn cases() -> Vec<TestCase> {
    vec![
        TestCase::new("fileio_read_lines_ok", TOOL, ok),
        TestCase::new("fileio_read_lines_range", TOOL, range),
        TestCase::new("fileio_read_lines_line_count", TOOL, line_count),
        TestCase::new(
            "fileio_read_lines_start_offset_is_line_index",
            TOOL,
            start_offset_is_line_index,
        ),
        TestCase::new("fileio_read_lines_empty_file_returns_empty", TOOL, empty_file),
        TestCase::new("fileio_read_lines_end_past_eof_clamps", TOOL, end_past_eof),
        TestCase::new("fileio_read_lines_count_past_eof_clamps", TOOL, count_past_eof),
        TestCase::new(
            "fileio_read_lines_start_line_beyond_eof_errors",
            TOOL,
            start_beyond_eof,
        ),
        TestCase::new("fileio_read_lines_end_before_start_errors", TOOL, end_before_start),
        TestCase::new("fileio_read_lines_negative_numbers_rejected", TOOL, negative),
        TestCase::new("fileio_read_lines_missing_errors", TOOL, missing),
    ]
}

const FOUR_LINES: &str = "l1\nl2\nl3\nl4\n";

/// Write `content` to `in.txt`, read it with `extra` arguments, return the lines.
fn read_with(
    ctx: &mut CaseContext<'_>,
    content: &str,
    extra: Value,
) -> anyhow::Result<Vec<String>> {
    let path = ctx.path("in.txt");
    fs::write(&path, content)?;
    let mut args = json!({"path": arg(&path)});
    if let (Some(args), Value::Object(extra)) = (args.as_object_mut(), extra) {
        args.extend(extra);
    }
    let value = ctx.call_value(TOOL, args)?;
    Ok(lines_of(&value)?)
}

fn ok(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let got = read_with(ctx, "a\nb\nc\n", json!({}))?;
    check!(got == ["a", "b", "c"], "Unexpected lines: {got:?}");
    Ok(())
}

fn range(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let got = read_with(ctx, FOUR_LINES, json!({"start_line": 2, "end_line": 3}))?;
    check!(got == ["l2", "l3"], "Unexpected range read: {got:?}");
    Ok(())
}

fn line_count(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let got = read_with(ctx, FOUR_LINES, json!({"start_line": 2, "line_count": 2}))?;
    check!(got == ["l2", "l3"], "Unexpected line_count read: {got:?}");
    Ok(())
}

fn start_offset_is_line_index(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let got = read_with(ctx, FOUR_LINES, json!({"start_offset": 1, "line_count": 2}))?;
    check!(got == ["l2", "l3"], "Unexpected start_offset read: {got:?}");
    Ok(())
}

fn empty_file(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let got = read_with(ctx, "", json!({}))?;
    check!(got.is_empty(), "Expected empty list, got: {got:?}");
    Ok(())
}

fn end_past_eof(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let got = read_with(ctx, "a\nb\nc\n", json!({"start_line": 2, "end_line": 999}))?;
    check!(got == ["b", "c"], "Unexpected clamp-to-EOF behavior: {got:?}");
    Ok(())
}

fn count_past_eof(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let got = read_with(ctx, "a\nb\nc\n", json!({"start_line": 2, "line_count": 999}))?;
    check!(
        got == ["b", "c"],
        "Unexpected clamp-to-EOF behavior (count): {got:?}"
    );
    Ok(())
}

fn start_beyond_eof(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("in.txt");
    fs::write(&path, "a\nb\n")?;
    ctx.expect_error(
        TOOL,
        json!({"path": arg(&path), "start_line": 5}),
        "exceeds file length",
    )
}

fn end_before_start(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("in.txt");
    fs::write(&path, "a\nb\n")?;
    ctx.expect_error(
        TOOL,
        json!({"path": arg(&path), "start_line": 2, "end_line": 1}),
        "end_line",
    )
}

fn negative(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("in.txt");
    fs::write(&path, "a\n")?;
    ctx.expect_error(
        TOOL,
        json!({"path": arg(&path), "start_line": -1}),
        "non-negative",
    )
}

fn missing(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("missing.txt");
    ctx.expect_error(TOOL, json!({"path": arg(&path)}), "not found")
}
