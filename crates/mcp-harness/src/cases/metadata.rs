//! Permission, touch and stat cases.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use serde_json::{Value, json};

use super::{arg, index_by, scalar_text};
use crate::check;
use crate::error::AssertionFailure;
use crate::orchestrator::{CaseContext, TestCase};

pub(super) fn cases() -> Vec<TestCase> {
    vec![
        TestCase::new("fileio_set_permissions", "fileio_set_permissions", set_permissions),
        TestCase::new(
            "fileio_set_permissions_multiple_paths",
            "fileio_set_permissions",
            set_permissions_multiple,
        ),
        TestCase::new("fileio_set_mode_alias", "fileio_set_mode", set_mode_alias),
        TestCase::new("fileio_get_permissions", "fileio_get_permissions", get_permissions),
        TestCase::new(
            "fileio_get_permissions_multiple_paths",
            "fileio_get_permissions",
            get_permissions_multiple,
        ),
        TestCase::new("fileio_touch", "fileio_touch", touch),
        TestCase::new("fileio_stat", "fileio_stat", stat),
    ]
}

fn mode_of(path: &Path) -> std::io::Result<u32> {
    Ok(fs::metadata(path)?.permissions().mode() & 0o777)
}

fn chmod(path: &Path, mode: u32) -> std::io::Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

fn set_permissions(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("perm.txt");
    fs::write(&path, "x")?;
    ctx.call(
        "fileio_set_permissions",
        json!({"path": [arg(&path)], "mode": "700"}),
    )?;
    let mode = mode_of(&path)?;
    check!(mode == 0o700, "Expected 700, got: {mode:o}");
    Ok(())
}

fn set_permissions_multiple(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let a = ctx.path("a.txt");
    let b = ctx.path("b.txt");
    fs::write(&a, "x")?;
    fs::write(&b, "y")?;
    ctx.call(
        "fileio_set_permissions",
        json!({"path": [arg(&a), arg(&b)], "mode": "600"}),
    )?;
    check!(mode_of(&a)? == 0o600, "Expected 600 for a.txt");
    check!(mode_of(&b)? == 0o600, "Expected 600 for b.txt");
    Ok(())
}

fn set_mode_alias(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("perm2.txt");
    fs::write(&path, "x")?;
    ctx.call("fileio_set_mode", json!({"path": [arg(&path)], "mode": "644"}))?;
    let mode = mode_of(&path)?;
    check!(mode == 0o644, "Expected 644, got: {mode:o}");
    Ok(())
}

fn get_permissions(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("perm.txt");
    fs::write(&path, "x")?;
    chmod(&path, 0o755)?;
    let value = ctx.call_value("fileio_get_permissions", json!({"path": [arg(&path)]}))?;
    let mode = match &value {
        Value::Object(map) => map.get(&arg(&path)).map(scalar_text),
        Value::Array(items) => items.first().and_then(|r| r.get("mode")).map(scalar_text),
        _ => None,
    };
    let Some(mode) = mode else {
        return Err(
            AssertionFailure::new(format!("Unexpected get_permissions payload: {value}")).into(),
        );
    };
    check!(mode.ends_with("755"), "Expected 755-ish, got: {mode}");
    Ok(())
}

fn get_permissions_multiple(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let a = ctx.path("a.txt");
    let b = ctx.path("b.txt");
    fs::write(&a, "x")?;
    fs::write(&b, "y")?;
    chmod(&a, 0o700)?;
    chmod(&b, 0o644)?;
    let value = ctx.call_value(
        "fileio_get_permissions",
        json!({"path": [arg(&a), arg(&b)]}),
    )?;
    check!(value.is_object(), "Expected mapping, got: {value}");
    let mode = |p: &Path| value.get(arg(p)).map(scalar_text).unwrap_or_default();
    check!(mode(&a).ends_with("700"), "Unexpected a mode: {value}");
    check!(mode(&b).ends_with("644"), "Unexpected b mode: {value}");
    Ok(())
}

fn touch(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("touched.txt");
    ctx.call("fileio_touch", json!({"path": [arg(&path)]}))?;
    check!(path.exists(), "Expected touched file to exist");
    Ok(())
}

fn stat(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let exists = ctx.path("a.txt");
    fs::write(&exists, "hello")?;
    let missing = ctx.path("missing.txt");
    let value = ctx.call_value(
        "fileio_stat",
        json!({"path": [arg(&exists), arg(&missing)]}),
    )?;
    check!(value.is_array(), "Unexpected stat payload: {value}");
    let by_path = index_by(&value, "path");
    let flag = |p: &Path| {
        by_path
            .get(&arg(p))
            .and_then(|r| r.get("exists"))
            .and_then(Value::as_bool)
    };
    check!(flag(&exists) == Some(true), "Expected exists=true: {value}");
    check!(flag(&missing) == Some(false), "Expected exists=false: {value}");
    Ok(())
}
