//! `fileio_patch_file` cases for both patch formats.

use std::fs;

use serde_json::json;

use super::arg;
use crate::check;
use crate::orchestrator::{CaseContext, TestCase};

const TOOL: &str = "fileio_patch_file";

pub(super) fn cases() -> Vec<TestCase> {
    vec![
        TestCase::new("fileio_patch_file_add_remove", TOOL, add_remove),
        TestCase::new("fileio_patch_file_unified_diff", TOOL, unified_diff),
        TestCase::new(
            "fileio_patch_file_unified_diff_empty_file_add_line",
            TOOL,
            unified_diff_empty_file,
        ),
        TestCase::new(
            "fileio_patch_file_unified_diff_add_at_end",
            TOOL,
            unified_diff_add_at_end,
        ),
        TestCase::new(
            "fileio_patch_file_add_remove_lines_empty_file_add_first_line",
            TOOL,
            add_remove_empty_file,
        ),
        TestCase::new(
            "fileio_patch_file_add_remove_lines_invalid_line_beyond_end_errors",
            TOOL,
            add_remove_beyond_end,
        ),
        TestCase::new(
            "fileio_patch_file_add_remove_lines_negative_line_rejected",
            TOOL,
            add_remove_negative_line,
        ),
    ]
}

/// Write `initial` to `patch.txt`, apply `patch`, return the new contents.
fn apply(
    ctx: &mut CaseContext<'_>,
    initial: &str,
    patch: &str,
    format: &str,
) -> anyhow::Result<String> {
    let path = ctx.path("patch.txt");
    fs::write(&path, initial)?;
    ctx.call(
        TOOL,
        json!({"path": arg(&path), "patch": patch, "format": format}),
    )?;
    Ok(fs::read_to_string(&path)?)
}

fn add_remove(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let patch = json!({"operations": [
        {"type": "add", "line": 2, "content": "inserted"},
        {"type": "remove", "line": 3},
    ]})
    .to_string();
    let text = apply(ctx, "line 1\nline 2\nline 3\n", &patch, "add_remove_lines")?;
    let lines: Vec<&str> = text.lines().collect();
    check!(
        lines == ["line 1", "inserted", "line 2"],
        "Unexpected patched content: {text:?}"
    );
    Ok(())
}

fn unified_diff(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let diff = "@@ -1,3 +1,3 @@\n line 1\n-line 2\n+line two\n line 3\n";
    let text = apply(ctx, "line 1\nline 2\nline 3\n", diff, "unified_diff")?;
    let lines: Vec<&str> = text.lines().collect();
    check!(
        lines == ["line 1", "line two", "line 3"],
        "Unexpected unified_diff patch result: {text:?}"
    );
    Ok(())
}

fn unified_diff_empty_file(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let text = apply(ctx, "", "--- a\n+++ b\n@@\n+first", "unified_diff")?;
    check!(text == "first", "Unexpected unified_diff patched content: {text:?}");
    Ok(())
}

fn unified_diff_add_at_end(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let diff = "--- a\n+++ b\n@@\n line 1\n line 2\n+line 3";
    let text = apply(ctx, "line 1\nline 2\n", diff, "unified_diff")?;
    check!(
        text == "line 1\nline 2\nline 3",
        "Unexpected unified_diff patched content: {text:?}"
    );
    Ok(())
}

fn add_remove_empty_file(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let patch = json!({"operations": [{"type": "add", "line": 1, "content": "first"}]}).to_string();
    let text = apply(ctx, "", &patch, "add_remove_lines")?;
    check!(
        text == "first",
        "Unexpected add_remove_lines patched content: {text:?}"
    );
    Ok(())
}

fn add_remove_beyond_end(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("patch.txt");
    fs::write(&path, "")?;
    let patch = json!({"operations": [{"type": "add", "line": 2, "content": "x"}]}).to_string();
    ctx.expect_error(
        TOOL,
        json!({"path": arg(&path), "patch": patch, "format": "add_remove_lines"}),
        "Invalid line number",
    )
}

fn add_remove_negative_line(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("patch.txt");
    fs::write(&path, "a\n")?;
    let patch = r#"{"operations": [{"type": "remove", "line": -1}]}"#;
    ctx.expect_error(
        TOOL,
        json!({"path": arg(&path), "patch": patch, "format": "add_remove_lines"}),
        "numeric",
    )
}
