use std::fs;

use serde_json::json;

use super::arg;
use crate::check;
use crate::orchestrator::{CaseContext, TestCase};

pub(super) fn cases() -> Vec<TestCase> {
    vec![
        TestCase::new("fileio_write_file_overwrite", "fileio_write_file", overwrite),
        TestCase::new("fileio_write_file_append", "fileio_write_file", append),
    ]
}

fn overwrite(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("nested/out.txt");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    ctx.call(
        "fileio_write_file",
        json!({"path": arg(&path), "content": "hello\n", "append": false}),
    )?;
    check!(path.exists(), "Expected file created");
    let text = fs::read_to_string(&path)?;
    check!(text == "hello\n", "Unexpected file content: {text:?}");
    Ok(())
}

fn append(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("append.txt");
    fs::write(&path, "hello")?;
    ctx.call(
        "fileio_write_file",
        json!({"path": arg(&path), "content": " world", "append": true}),
    )?;
    let text = fs::read_to_string(&path)?;
    check!(
        text == "hello world",
        "Append did not produce expected content: {text:?}"
    );
    Ok(())
}
