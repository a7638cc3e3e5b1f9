//! Test orchestrator.
//!
//! Owns the ordered case registry and drives a run through
//! `NotStarted → SessionStarting → Running → Summarizing → Cleanup → Done`.
//! A failing or panicking case is recorded and the run moves on. Failing to
//! start the session or complete the handshake aborts the run. The session
//! and the workspace are torn down on every path.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fileio_mcp_client::{ClientError, LineTransport, Session, extract};
use serde::Serialize;
use serde_json::Value;

use crate::assert::expect_remote_error;
use crate::error::AssertionFailure;
use crate::report::Reporter;
use crate::safety::SafetyGate;
use crate::workspace::Workspace;

/// Body of a case: set up, issue exactly one call, assert.
pub type CaseBody = Box<dyn Fn(&mut CaseContext<'_>) -> anyhow::Result<()> + Send + Sync>;

/// One registered case.
pub struct TestCase {
    pub name: String,
    pub tool: String,
    pub dangerous: bool,
    body: CaseBody,
}

impl TestCase {
    pub fn new<F>(name: impl Into<String>, tool: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut CaseContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            tool: tool.into(),
            dangerous: false,
            body: Box::new(body),
        }
    }

    /// Mark the case as gated by the [`SafetyGate`].
    pub fn dangerous(mut self) -> Self {
        self.dangerous = true;
        self
    }
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("tool", &self.tool)
            .field("dangerous", &self.dangerous)
            .finish()
    }
}

/// What a case body sees.
///
/// Each case may issue exactly one protocol call through [`CaseContext::call`]
/// or one of its wrappers. A second call fails the case.
pub struct CaseContext<'a> {
    session: &'a mut Session,
    dir: PathBuf,
    server_workdir: PathBuf,
    calls: usize,
}

impl<'a> CaseContext<'a> {
    pub fn new(session: &'a mut Session, dir: PathBuf, server_workdir: PathBuf) -> Self {
        Self {
            session,
            dir,
            server_workdir,
            calls: 0,
        }
    }

    /// This case's private directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `dir().join(rel)`, rendered as the string tools expect.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.join(rel)
    }

    /// Working directory of the tool-serving process.
    pub fn server_workdir(&self) -> &Path {
        &self.server_workdir
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Issue the case's single `tools/call` and return the raw outcome.
    ///
    /// # Errors
    ///
    /// An [`AssertionFailure`] if this is not the first call of the case.
    pub fn try_call(
        &mut self,
        tool: &str,
        arguments: Value,
    ) -> Result<Result<Value, ClientError>, AssertionFailure> {
        self.calls += 1;
        if self.calls > 1 {
            return Err(AssertionFailure::new(format!(
                "case issued more than one protocol call (second call: {tool})"
            )));
        }
        Ok(self.session.tool_call(tool, arguments))
    }

    /// Issue the case's single call; any error fails the case.
    ///
    /// # Errors
    ///
    /// Remote, transport, and one-call violations.
    pub fn call(&mut self, tool: &str, arguments: Value) -> anyhow::Result<Value> {
        Ok(self.try_call(tool, arguments)??)
    }

    /// [`CaseContext::call`] followed by result normalization.
    ///
    /// # Errors
    ///
    /// As for [`CaseContext::call`], plus [`ClientError::UnusableResult`].
    pub fn call_value(&mut self, tool: &str, arguments: Value) -> anyhow::Result<Value> {
        let result = self.call(tool, arguments)?;
        Ok(extract(&result)?)
    }

    /// Issue the case's single call and require a remote error containing `needle`.
    ///
    /// # Errors
    ///
    /// [`AssertionFailure`] when the call does not fail that way.
    pub fn expect_error(
        &mut self,
        tool: &str,
        arguments: Value,
        needle: &str,
    ) -> anyhow::Result<()> {
        let outcome = self.try_call(tool, arguments)?;
        expect_remote_error(outcome, needle)?;
        Ok(())
    }
}

/// Result of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "UPPERCASE")]
pub enum Outcome {
    Pass,
    Fail(String),
    Skip(String),
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail(_) => "FAIL",
            Self::Skip(_) => "SKIP",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseRecord {
    pub name: String,
    pub tool: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
}

/// Aggregate counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Counts {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub records: Vec<CaseRecord>,
    /// Cause of an aborted run (session could not be established).
    pub aborted: Option<String>,
    pub workspace_root: Option<PathBuf>,
    pub workspace_kept: bool,
}

impl RunSummary {
    pub fn counts(&self) -> Counts {
        let mut counts = Counts::default();
        for record in &self.records {
            match record.outcome {
                Outcome::Pass => counts.passed += 1,
                Outcome::Fail(_) => counts.failed += 1,
                Outcome::Skip(_) => counts.skipped += 1,
            }
        }
        counts
    }

    /// 0 only if the run was not aborted and no case failed.
    pub fn exit_code(&self) -> i32 {
        if self.aborted.is_some() || self.counts().failed > 0 {
            1
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    SessionStarting,
    Running,
    Summarizing,
    Cleanup,
    Done,
}

/// Knobs for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub protocol_version: String,
    pub server_workdir: PathBuf,
    pub keep_workspace: bool,
    /// Parent of the workspace root; system temp dir when `None`.
    pub temp_parent: Option<PathBuf>,
    /// Only cases whose name contains this substring run.
    pub filter: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            protocol_version: fileio_mcp_client::DEFAULT_PROTOCOL_VERSION.to_string(),
            server_workdir: PathBuf::from("."),
            keep_workspace: false,
            temp_parent: None,
            filter: None,
        }
    }
}

pub struct Orchestrator {
    cases: Vec<TestCase>,
    gate: Box<dyn SafetyGate>,
    options: RunOptions,
    state: RunState,
}

impl Orchestrator {
    pub fn new(gate: Box<dyn SafetyGate>, options: RunOptions) -> Self {
        Self {
            cases: Vec::new(),
            gate,
            options,
            state: RunState::NotStarted,
        }
    }

    /// Append a case. Registry order is execution order; names must be unique.
    pub fn register(&mut self, case: TestCase) {
        self.cases.push(case);
    }

    pub fn register_all(&mut self, cases: impl IntoIterator<Item = TestCase>) {
        self.cases.extend(cases);
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!(from = ?self.state, to = ?next, "run state");
        self.state = next;
    }

    /// Execute every selected case against a transport produced by `connect`.
    pub fn run<C>(&mut self, connect: C, reporter: &mut dyn Reporter) -> RunSummary
    where
        C: FnOnce() -> Result<Box<dyn LineTransport>, ClientError>,
    {
        let mut summary = RunSummary::default();
        self.transition(RunState::SessionStarting);

        let workspace = match Workspace::create(
            self.options.temp_parent.as_deref(),
            self.options.keep_workspace,
        ) {
            Ok(ws) => ws,
            Err(e) => {
                tracing::error!(error = %e, "workspace setup failed");
                summary.aborted = Some(e.to_string());
                return self.finish(summary, None, None, reporter);
            }
        };
        summary.workspace_root = Some(workspace.root().to_path_buf());
        summary.workspace_kept = workspace.keep();

        let mut session = match connect() {
            Ok(transport) => Session::new(transport),
            Err(e) => {
                tracing::error!(error = %e, "could not start server");
                summary.aborted = Some(e.to_string());
                return self.finish(summary, None, Some(workspace), reporter);
            }
        };
        if let Err(e) = session.initialize(&self.options.protocol_version) {
            tracing::error!(error = %e, "handshake failed");
            summary.aborted = Some(e.to_string());
            return self.finish(summary, Some(session), Some(workspace), reporter);
        }

        self.transition(RunState::Running);
        let allowed = self.gate.is_dangerous_allowed();
        for case in &self.cases {
            if let Some(ref filter) = self.options.filter {
                if !case.name.contains(filter.as_str()) {
                    continue;
                }
            }
            reporter.case_started(case);
            let started = Instant::now();
            let outcome = if case.dangerous && !allowed {
                Outcome::Skip(self.gate.skip_reason())
            } else {
                run_case(case, &mut session, &workspace, &self.options.server_workdir)
            };
            let record = CaseRecord {
                name: case.name.clone(),
                tool: case.tool.clone(),
                outcome,
                duration_ms: millis(started.elapsed()),
            };
            tracing::debug!(case = %record.name, outcome = record.outcome.label(), "case finished");
            reporter.case_finished(&record);
            summary.records.push(record);
        }

        self.finish(summary, Some(session), Some(workspace), reporter)
    }

    fn finish(
        &mut self,
        summary: RunSummary,
        session: Option<Session>,
        workspace: Option<Workspace>,
        reporter: &mut dyn Reporter,
    ) -> RunSummary {
        self.transition(RunState::Summarizing);
        reporter.summary(&summary);

        self.transition(RunState::Cleanup);
        if let Some(mut session) = session {
            session.shutdown();
        }
        if let Some(workspace) = workspace {
            let failures = workspace.release();
            if failures > 0 {
                tracing::warn!(failures, "workspace cleanup was incomplete");
            }
        }

        self.transition(RunState::Done);
        summary
    }
}

fn run_case(
    case: &TestCase,
    session: &mut Session,
    workspace: &Workspace,
    server_workdir: &Path,
) -> Outcome {
    let dir = match workspace.create_case_dir(&case.name) {
        Ok(dir) => dir,
        Err(e) => return Outcome::Fail(e.to_string()),
    };
    let mut ctx = CaseContext::new(session, dir, server_workdir.to_path_buf());
    let result = catch_unwind(AssertUnwindSafe(|| (case.body)(&mut ctx)));
    match result {
        Ok(Ok(())) if ctx.calls() == 1 => Outcome::Pass,
        Ok(Ok(())) => Outcome::Fail(format!(
            "case must issue exactly one protocol call, issued {}",
            ctx.calls()
        )),
        Ok(Err(e)) => Outcome::Fail(format!("{e:#}")),
        Err(payload) => Outcome::Fail(format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
