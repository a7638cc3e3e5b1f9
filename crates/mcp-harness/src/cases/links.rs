use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;

use serde_json::json;

use super::arg;
use crate::check;
use crate::orchestrator::{CaseContext, TestCase};

pub(super) fn cases() -> Vec<TestCase> {
    vec![
        TestCase::new("fileio_create_hard_link", "fileio_create_hard_link", hard_link),
        TestCase::new(
            "fileio_create_hard_link_missing_target_errors",
            "fileio_create_hard_link",
            hard_link_missing_target,
        ),
        TestCase::new(
            "fileio_create_symbolic_link",
            "fileio_create_symbolic_link",
            symbolic_link,
        ),
        TestCase::new(
            "fileio_create_symbolic_link_broken_target_ok",
            "fileio_create_symbolic_link",
            symbolic_link_broken_target,
        ),
        TestCase::new(
            "fileio_read_symbolic_link_ok",
            "fileio_read_symbolic_link",
            read_link,
        ),
        TestCase::new(
            "fileio_read_symbolic_link_relative_target",
            "fileio_read_symbolic_link",
            read_link_relative,
        ),
        TestCase::new(
            "fileio_read_symbolic_link_non_symlink_errors",
            "fileio_read_symbolic_link",
            read_link_non_symlink,
        ),
    ]
}

fn hard_link(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let target = ctx.path("target.txt");
    fs::write(&target, "x")?;
    let link = ctx.path("hard.txt");
    ctx.call(
        "fileio_create_hard_link",
        json!({"target": arg(&target), "link_path": arg(&link)}),
    )?;
    check!(link.exists(), "Expected hard link");
    let (t, l) = (fs::metadata(&target)?, fs::metadata(&link)?);
    check!(
        t.ino() == l.ino() && t.dev() == l.dev(),
        "Expected same inode"
    );
    Ok(())
}

fn hard_link_missing_target(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let target = ctx.path("missing.txt");
    let link = ctx.path("hard.txt");
    ctx.expect_error(
        "fileio_create_hard_link",
        json!({"target": arg(&target), "link_path": arg(&link)}),
        "not found",
    )
}

fn symbolic_link(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let target = ctx.path("target.txt");
    fs::write(&target, "x")?;
    let link = ctx.path("sym.txt");
    ctx.call(
        "fileio_create_symbolic_link",
        json!({"target": arg(&target), "link_path": arg(&link)}),
    )?;
    check!(link.is_symlink(), "Expected symlink");
    check!(fs::read_link(&link)? == target, "Symlink target mismatch");
    Ok(())
}

fn symbolic_link_broken_target(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let target = ctx.path("missing.txt");
    let link = ctx.path("broken.txt");
    ctx.call(
        "fileio_create_symbolic_link",
        json!({"target": arg(&target), "link_path": arg(&link)}),
    )?;
    check!(
        link.is_symlink(),
        "Expected symlink created even if target missing"
    );
    check!(
        fs::read_link(&link)? == target,
        "Broken symlink target mismatch"
    );
    Ok(())
}

fn read_link(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let target = ctx.path("t.txt");
    fs::write(&target, "x")?;
    let link = ctx.path("l.txt");
    std::os::unix::fs::symlink(&target, &link)?;
    let value = ctx.call_value("fileio_read_symbolic_link", json!({"path": arg(&link)}))?;
    check!(
        value.as_str().map(PathBuf::from) == Some(target),
        "Unexpected readlink: {value}"
    );
    Ok(())
}

fn read_link_relative(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    fs::write(ctx.path("target.txt"), "x")?;
    let link = ctx.path("link.txt");
    std::os::unix::fs::symlink("target.txt", &link)?;
    let value = ctx.call_value("fileio_read_symbolic_link", json!({"path": arg(&link)}))?;
    check!(
        value.as_str() == Some("target.txt"),
        "Expected relative target.txt, got: {value}"
    );
    Ok(())
}

fn read_link_non_symlink(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let file = ctx.path("file.txt");
    fs::write(&file, "x")?;
    ctx.expect_error(
        "fileio_read_symbolic_link",
        json!({"path": arg(&file)}),
        "not a symbolic link",
    )
}

