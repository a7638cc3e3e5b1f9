//! Copy, move and removal cases, including glob sources.

use std::fs;

use serde_json::json;

use super::{all_ok, arg, first_status};
use crate::check;
use crate::orchestrator::{CaseContext, TestCase};

pub(super) fn cases() -> Vec<TestCase> {
    vec![
        TestCase::new("fileio_copy", "fileio_copy", copy),
        TestCase::new("fileio_copy_dir_recursive", "fileio_copy", copy_dir_recursive),
        TestCase::new(
            "fileio_copy_dir_without_recursive_errors",
            "fileio_copy",
            copy_dir_without_recursive,
        ),
        TestCase::new("fileio_copy_glob", "fileio_copy", copy_glob),
        TestCase::new(
            "fileio_copy_glob_no_match_errors",
            "fileio_copy",
            copy_glob_no_match,
        ),
        TestCase::new("fileio_move", "fileio_move", move_file),
        TestCase::new("fileio_move_glob", "fileio_move", move_glob),
        TestCase::new(
            "fileio_move_glob_no_match_errors",
            "fileio_move",
            move_glob_no_match,
        ),
        TestCase::new("fileio_remove", "fileio_remove", remove),
        TestCase::new("fileio_remove_recursive_dir", "fileio_remove", remove_recursive_dir),
        TestCase::new("fileio_remove_glob", "fileio_remove", remove_glob),
        TestCase::new(
            "fileio_remove_glob_no_match_errors",
            "fileio_remove",
            remove_glob_no_match,
        ),
        TestCase::new(
            "fileio_remove_force_missing_ok",
            "fileio_remove",
            remove_force_missing,
        ),
        TestCase::new(
            "fileio_remove_directory",
            "fileio_remove_directory",
            remove_directory,
        ),
        TestCase::new(
            "fileio_remove_directory_non_recursive_reports_error",
            "fileio_remove_directory",
            remove_directory_non_recursive,
        ),
    ]
}

fn seed(ctx: &CaseContext<'_>, files: &[(&str, &str)]) -> std::io::Result<()> {
    for (name, text) in files {
        fs::write(ctx.path(name), text)?;
    }
    Ok(())
}

fn copy(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let src = ctx.path("src.txt");
    fs::write(&src, "copyme")?;
    let dst = ctx.path("dst");
    fs::create_dir(&dst)?;
    ctx.call(
        "fileio_copy",
        json!({"source": [arg(&src)], "destination": arg(&dst)}),
    )?;
    let copied = dst.join("src.txt");
    check!(copied.exists(), "Expected copied file");
    check!(fs::read_to_string(&copied)? == "copyme", "Copied content mismatch");
    Ok(())
}

fn copy_dir_recursive(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let src = ctx.path("src");
    fs::create_dir_all(src.join("nested"))?;
    fs::write(src.join("nested/f.txt"), "x")?;
    let dst = ctx.path("dst");
    ctx.call(
        "fileio_copy",
        json!({"source": [arg(&src)], "destination": arg(&dst), "recursive": true}),
    )?;
    check!(
        dst.join("nested/f.txt").exists(),
        "Expected directory copied recursively"
    );
    Ok(())
}

fn copy_dir_without_recursive(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let src = ctx.path("src");
    fs::create_dir(&src)?;
    let dst = ctx.path("dst");
    fs::create_dir(&dst)?;
    let value = ctx.call_value(
        "fileio_copy",
        json!({"source": [arg(&src)], "destination": arg(&dst), "recursive": false}),
    )?;
    check!(
        first_status(&value).contains("error"),
        "Expected per-source error, got: {value}"
    );
    Ok(())
}

fn copy_glob(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    seed(ctx, &[("a.txt", "a"), ("b.txt", "b"), ("c.log", "c")])?;
    let dst = ctx.path("dst");
    fs::create_dir(&dst)?;
    let pattern = arg(&ctx.path("*.txt"));
    let value = ctx.call_value(
        "fileio_copy",
        json!({"source": [pattern], "destination": arg(&dst)}),
    )?;
    check!(all_ok(&value), "Unexpected copy results: {value}");
    check!(
        dst.join("a.txt").exists() && dst.join("b.txt").exists(),
        "Expected txt files copied"
    );
    check!(!dst.join("c.log").exists(), "Did not expect log file copied");
    Ok(())
}

fn copy_glob_no_match(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let dst = ctx.path("dst");
    fs::create_dir(&dst)?;
    let pattern = arg(&ctx.path("*.nope"));
    ctx.expect_error(
        "fileio_copy",
        json!({"source": [pattern], "destination": arg(&dst)}),
        "No files match pattern",
    )
}

fn move_file(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let src = ctx.path("src.txt");
    fs::write(&src, "moveme")?;
    let dst = ctx.path("moved.txt");
    ctx.call(
        "fileio_move",
        json!({"source": [arg(&src)], "destination": arg(&dst)}),
    )?;
    check!(!src.exists(), "Expected source removed");
    check!(
        dst.exists() && fs::read_to_string(&dst)? == "moveme",
        "Move result mismatch"
    );
    Ok(())
}

fn move_glob(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    seed(ctx, &[("a.txt", "a"), ("b.txt", "b"), ("c.log", "c")])?;
    let dst = ctx.path("dst");
    fs::create_dir(&dst)?;
    let pattern = arg(&ctx.path("*.txt"));
    let value = ctx.call_value(
        "fileio_move",
        json!({"source": [pattern], "destination": arg(&dst)}),
    )?;
    check!(all_ok(&value), "Unexpected move results: {value}");
    check!(
        !ctx.path("a.txt").exists() && !ctx.path("b.txt").exists(),
        "Expected txt files moved"
    );
    check!(
        dst.join("a.txt").exists() && dst.join("b.txt").exists(),
        "Expected moved files in dst"
    );
    check!(ctx.path("c.log").exists(), "Did not expect c.log moved");
    Ok(())
}

fn move_glob_no_match(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let dst = ctx.path("dst");
    fs::create_dir(&dst)?;
    let pattern = arg(&ctx.path("*.nope"));
    ctx.expect_error(
        "fileio_move",
        json!({"source": [pattern], "destination": arg(&dst)}),
        "No files match pattern",
    )
}

fn remove(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("rm.txt");
    fs::write(&path, "x")?;
    ctx.call("fileio_remove", json!({"path": [arg(&path)], "force": false}))?;
    check!(!path.exists(), "Expected file removed");
    Ok(())
}

fn remove_recursive_dir(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let dir = ctx.path("d");
    fs::create_dir_all(dir.join("nested"))?;
    fs::write(dir.join("nested/f.txt"), "x")?;
    let value = ctx.call_value(
        "fileio_remove",
        json!({"path": [arg(&dir)], "recursive": true, "force": false}),
    )?;
    check!(first_status(&value) == "ok", "Unexpected remove results: {value}");
    check!(!dir.exists(), "Expected directory removed recursively");
    Ok(())
}

fn remove_glob(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    seed(ctx, &[("a.tmp", "x"), ("b.tmp", "x"), ("c.log", "x")])?;
    let pattern = arg(&ctx.path("*.tmp"));
    let value = ctx.call_value("fileio_remove", json!({"path": [pattern], "force": false}))?;
    check!(all_ok(&value), "Unexpected rm glob results: {value}");
    check!(
        !ctx.path("a.tmp").exists() && !ctx.path("b.tmp").exists(),
        "Expected tmp files removed"
    );
    check!(ctx.path("c.log").exists(), "Did not expect log removed");
    Ok(())
}

fn remove_glob_no_match(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let pattern = arg(&ctx.path("*.nope"));
    ctx.expect_error(
        "fileio_remove",
        json!({"path": [pattern], "force": false}),
        "No files match pattern",
    )
}

fn remove_force_missing(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let missing = ctx.path("missing.txt");
    ctx.call("fileio_remove", json!({"path": [arg(&missing)], "force": true}))?;
    Ok(())
}

fn remove_directory(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let dir = ctx.path("dir");
    fs::create_dir_all(dir.join("nested"))?;
    fs::write(dir.join("nested/f.txt"), "x")?;
    ctx.call(
        "fileio_remove_directory",
        json!({"path": [arg(&dir)], "recursive": true}),
    )?;
    check!(!dir.exists(), "Expected directory removed");
    Ok(())
}

fn remove_directory_non_recursive(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let dir = ctx.path("dir");
    fs::create_dir(&dir)?;
    fs::write(dir.join("f.txt"), "x")?;
    let value = ctx.call_value(
        "fileio_remove_directory",
        json!({"path": [arg(&dir)], "recursive": false}),
    )?;
    let status = first_status(&value);
    check!(
        status.contains("not empty"),
        "Expected not-empty error status, got: {value}"
    );
    check!(dir.exists(), "Expected directory to still exist");
    Ok(())
}
