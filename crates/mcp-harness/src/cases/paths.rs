//! Path inspection and temporary-file cases.

use std::fs;
use std::path::PathBuf;

use serde_json::{Value, json};

use super::arg;
use crate::check;
use crate::orchestrator::{CaseContext, TestCase};

pub(super) fn cases() -> Vec<TestCase> {
    vec![
        TestCase::new("fileio_get_basename", "fileio_get_basename", basename),
        TestCase::new(
            "fileio_get_basename_trailing_slash",
            "fileio_get_basename",
            basename_trailing_slash,
        ),
        TestCase::new("fileio_get_dirname", "fileio_get_dirname", dirname),
        TestCase::new(
            "fileio_get_dirname_no_dir_component",
            "fileio_get_dirname",
            dirname_no_dir_component,
        ),
        TestCase::new(
            "fileio_get_canonical_path_ok",
            "fileio_get_canonical_path",
            canonical_path,
        ),
        TestCase::new(
            "fileio_get_canonical_path_missing_errors",
            "fileio_get_canonical_path",
            canonical_path_missing,
        ),
        TestCase::new(
            "fileio_get_current_directory",
            "fileio_get_current_directory",
            current_directory,
        ),
        TestCase::new(
            "fileio_create_temporary_file",
            "fileio_create_temporary",
            temporary_file,
        ),
        TestCase::new(
            "fileio_create_temporary_file_no_template",
            "fileio_create_temporary",
            temporary_file_no_template,
        ),
        TestCase::new(
            "fileio_create_temporary_dir",
            "fileio_create_temporary",
            temporary_dir,
        ),
    ]
}

fn as_path(value: &Value) -> Option<PathBuf> {
    value.as_str().map(PathBuf::from)
}

fn basename(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("a/b/c.txt");
    let value = ctx.call_value("fileio_get_basename", json!({"path": arg(&path)}))?;
    check!(value == "c.txt", "Unexpected basename: {value}");
    Ok(())
}

fn basename_trailing_slash(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let value = ctx.call_value("fileio_get_basename", json!({"path": "/usr/bin/"}))?;
    check!(value == "bin", "Unexpected basename for /usr/bin/: {value}");
    Ok(())
}

fn dirname(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("a/b/c.txt");
    let value = ctx.call_value("fileio_get_dirname", json!({"path": arg(&path)}))?;
    check!(
        as_path(&value).as_deref() == path.parent(),
        "Unexpected dirname: {value}"
    );
    Ok(())
}

fn dirname_no_dir_component(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let value = ctx.call_value("fileio_get_dirname", json!({"path": "file.txt"}))?;
    check!(value == "", "Expected empty dirname for file.txt, got: {value}");
    Ok(())
}

fn canonical_path(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("x.txt");
    fs::write(&path, "x")?;
    let expected = fs::canonicalize(&path)?;
    let value = ctx.call_value("fileio_get_canonical_path", json!({"path": arg(&path)}))?;
    check!(
        as_path(&value) == Some(expected),
        "Unexpected canonical: {value}"
    );
    Ok(())
}

fn canonical_path_missing(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("missing.txt");
    ctx.expect_error(
        "fileio_get_canonical_path",
        json!({"path": arg(&path)}),
        "not found",
    )
}

fn current_directory(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let value = ctx.call_value("fileio_get_current_directory", json!({}))?;
    let expected = ctx.server_workdir().to_path_buf();
    check!(
        as_path(&value) == Some(expected.clone()),
        "Expected cwd {}, got: {value}",
        expected.display()
    );
    Ok(())
}

fn is_file(value: &Value) -> bool {
    as_path(value).is_some_and(|p| p.is_file())
}

fn temporary_file(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let template = arg(ctx.dir());
    let value = ctx.call_value(
        "fileio_create_temporary",
        json!({"type": "file", "template": template}),
    )?;
    check!(is_file(&value), "Expected temp file, got: {value}");
    Ok(())
}

fn temporary_file_no_template(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let value = ctx.call_value("fileio_create_temporary", json!({"type": "file"}))?;
    check!(is_file(&value), "Expected temp file, got: {value}");
    // Lands outside the workspace, so the workspace cleanup will not see it.
    if let Some(path) = as_path(&value) {
        let _ = fs::remove_file(path);
    }
    Ok(())
}

fn temporary_dir(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let template = arg(ctx.dir());
    let value = ctx.call_value(
        "fileio_create_temporary",
        json!({"type": "dir", "template": template}),
    )?;
    check!(
        as_path(&value).is_some_and(|p| p.is_dir()),
        "Expected temp dir, got: {value}"
    );
    Ok(())
}
