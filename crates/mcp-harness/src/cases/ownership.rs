//! Ownership change, gated behind the safety gate.

use std::fs;
use std::os::unix::fs::MetadataExt;

use serde_json::json;

use super::arg;
use crate::check;
use crate::orchestrator::{CaseContext, TestCase};

pub(super) fn cases() -> Vec<TestCase> {
    vec![
        TestCase::new(
            "fileio_change_ownership",
            "fileio_change_ownership",
            change_ownership,
        )
        .dangerous(),
    ]
}

fn change_ownership(ctx: &mut CaseContext<'_>) -> anyhow::Result<()> {
    let path = ctx.path("owned.txt");
    fs::write(&path, "x")?;
    // Current ids, so no privilege is needed.
    // SAFETY: getuid/getgid have no preconditions and cannot fail.
    let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
    ctx.call(
        "fileio_change_ownership",
        json!({"path": [arg(&path)], "user": uid.to_string(), "group": gid.to_string()}),
    )?;
    let meta = fs::metadata(&path)?;
    check!(
        meta.uid() == uid && meta.gid() == gid,
        "Ownership did not match expected: {}:{}",
        meta.uid(),
        meta.gid()
    );
    Ok(())
}
