use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde_json::{Value, json};

use super::arg;
use crate::check;
use crate::orchestrator::{CaseContext, TestCase};

pub(super) fn cases() -> Vec<TestCase> {
    vec![
        TestCase::new("fileio_find_files", "fileio_find_files", find_files),
        TestCase::new(
            "fileio_find_files_file_type_dir",
            "fileio_find_files",
            find_files_dir,
        ),
        TestCase::new(
            "fileio_find_files_missing_root_errors",
            "fileio_find_files",
            find_files_missing_root,
        ),
        TestCase::new("fileio_find_in_files", "fileio_find_in_files", find_in_files),
        TestCase::new(
            "fileio_find_in_files_case_insensitive",
            "fileio_find_in_files",
            find_in_files_case_insensitive,
        ),
        TestCase::new(
            "fileio_find_in_files_whole_word",
            "fileio_find_in_files",
            find_in_files_whole_word,
        ),
    ]
}

fn file_names(value: &Value) -> BTreeSet<String> {
    value
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter_map(|p| Path::new(p).file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect()
}

fn matched_in(value: &Value, file: &Path) -> bool {
    let expected = arg(file);
    value.as_array().is_some_and(|items| {
        items
            .iter()
            .any(|m| m.get("file_path").and_then(Value::as_str) == Some(expected.as_str()))
    })
}

fn find_files(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    for (name, text) in [("a.log", "x"), ("b.log", "x"), ("c.txt", "x")] {
        fs::write(ctx.path(name), text)?;
    }
    let root = arg(ctx.dir());
    let value = ctx.call_value("fileio_find_files", json!({"root": root, "pattern": "*.log"}))?;
    check!(value.is_array(), "Unexpected find_files payload: {value}");
    let found = file_names(&value);
    check!(
        found.contains("a.log") && found.contains("b.log"),
        "Expected a.log and b.log, got: {found:?}"
    );
    Ok(())
}

fn find_files_dir(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    fs::create_dir(ctx.path("matchdir"))?;
    let root = arg(ctx.dir());
    let value = ctx.call_value(
        "fileio_find_files",
        json!({"root": root, "pattern": "matchdir", "file_type": "dir"}),
    )?;
    check!(
        file_names(&value).contains("matchdir"),
        "Expected matchdir, got: {value}"
    );
    Ok(())
}

fn find_files_missing_root(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let missing = ctx.path("nope");
    ctx.expect_error(
        "fileio_find_files",
        json!({"root": arg(&missing), "pattern": "*.txt"}),
        "not found",
    )
}

fn find_in_files(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let hay = ctx.path("hay.txt");
    fs::write(&hay, "needle\nother\n")?;
    let dir = arg(ctx.dir());
    let value = ctx.call_value(
        "fileio_find_in_files",
        json!({"path": dir, "pattern": "needle", "use_regex": false}),
    )?;
    check!(value.is_array(), "Unexpected find_in_files payload: {value}");
    check!(matched_in(&value, &hay), "Expected match in hay.txt: {value}");
    Ok(())
}

fn find_in_files_case_insensitive(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let hay = ctx.path("hay.txt");
    fs::write(&hay, "Needle\n")?;
    let dir = arg(ctx.dir());
    let value = ctx.call_value(
        "fileio_find_in_files",
        json!({"path": dir, "pattern": "needle", "use_regex": false, "case_sensitive": false}),
    )?;
    check!(matched_in(&value, &hay), "Expected case-insensitive match: {value}");
    Ok(())
}

fn find_in_files_whole_word(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let hay = ctx.path("hay.txt");
    fs::write(&hay, "testing test tested\n")?;
    let dir = arg(ctx.dir());
    let value = ctx.call_value(
        "fileio_find_in_files",
        json!({"path": dir, "pattern": "test", "use_regex": false, "whole_word": true}),
    )?;
    check!(matched_in(&value, &hay), "Expected whole-word match: {value}");
    Ok(())
}
