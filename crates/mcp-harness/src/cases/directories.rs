use std::collections::BTreeSet;
use std::fs;

use serde_json::{Value, json};

use super::arg;
use crate::check;
use crate::orchestrator::{CaseContext, TestCase};

pub(super) fn cases() -> Vec<TestCase> {
    vec![
        TestCase::new("fileio_make_directory", "fileio_make_directory", make_directory),
        TestCase::new(
            "fileio_make_directory_non_recursive_errors",
            "fileio_make_directory",
            make_directory_non_recursive,
        ),
        TestCase::new("fileio_list_directory", "fileio_list_directory", list_directory),
        TestCase::new(
            "fileio_list_directory_recursive",
            "fileio_list_directory",
            list_recursive,
        ),
        TestCase::new(
            "fileio_list_directory_include_hidden",
            "fileio_list_directory",
            list_include_hidden,
        ),
        TestCase::new(
            "fileio_list_directory_missing_returns_empty",
            "fileio_list_directory",
            list_missing,
        ),
    ]
}

/// Values of `key` across the records of a listing.
fn field_set(value: &Value, key: &str) -> BTreeSet<String> {
    value
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|r| r.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

fn make_directory(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let target = ctx.path("a/b/c");
    ctx.call(
        "fileio_make_directory",
        json!({"path": [arg(&target)], "recursive": true}),
    )?;
    check!(target.is_dir(), "Expected directory created");
    Ok(())
}

fn make_directory_non_recursive(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let target = ctx.path("missing_parent/child");
    ctx.expect_error(
        "fileio_make_directory",
        json!({"path": [arg(&target)], "recursive": false}),
        "Some directory creations failed",
    )
}

fn list_directory(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    fs::write(ctx.path("f1.txt"), "x")?;
    fs::create_dir(ctx.path("sub"))?;
    let dir = arg(ctx.dir());
    let value = ctx.call_value(
        "fileio_list_directory",
        json!({"path": dir, "recursive": false, "include_hidden": false}),
    )?;
    check!(value.is_array(), "Unexpected list_directory payload: {value}");
    let names = field_set(&value, "name");
    check!(names.contains("f1.txt"), "Expected f1.txt in list, got: {names:?}");
    check!(names.contains("sub"), "Expected sub in list, got: {names:?}");
    Ok(())
}

fn list_recursive(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    fs::create_dir(ctx.path("sub"))?;
    let nested = ctx.path("sub/nested.txt");
    fs::write(&nested, "x")?;
    let dir = arg(ctx.dir());
    let value = ctx.call_value(
        "fileio_list_directory",
        json!({"path": dir, "recursive": true, "include_hidden": false}),
    )?;
    check!(value.is_array(), "Unexpected list_directory payload: {value}");
    let paths = field_set(&value, "path");
    check!(
        paths.contains(&arg(&nested)),
        "Expected nested file in recursive listing, got: {paths:?}"
    );
    Ok(())
}

fn list_include_hidden(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    fs::write(ctx.path(".hidden"), "x")?;
    let dir = arg(ctx.dir());
    let value = ctx.call_value(
        "fileio_list_directory",
        json!({"path": dir, "recursive": false, "include_hidden": true}),
    )?;
    let names = field_set(&value, "name");
    check!(names.contains(".hidden"), "Expected .hidden in list, got: {names:?}");
    Ok(())
}

fn list_missing(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let missing = ctx.path("missing");
    let value = ctx.call_value(
        "fileio_list_directory",
        json!({"path": arg(&missing), "recursive": false, "include_hidden": false}),
    )?;
    check!(
        value == json!([]),
        "Expected empty list for missing dir, got: {value}"
    );
    Ok(())
}
