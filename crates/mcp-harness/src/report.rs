//! Progress and summary output.

use std::io::Write;

use crate::orchestrator::{CaseRecord, Outcome, RunSummary, TestCase};

/// Receives run events from the orchestrator.
pub trait Reporter {
    fn case_started(&mut self, case: &TestCase);
    fn case_finished(&mut self, record: &CaseRecord);
    fn summary(&mut self, summary: &RunSummary);
}

/// Human-readable progress lines followed by a summary block.
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

// Write errors on the progress stream are ignored; the exit code carries the result.
impl<W: Write> Reporter for ConsoleReporter<W> {
    fn case_started(&mut self, case: &TestCase) {
        let _ = write!(self.out, "Test: {} ({}) ... ", case.name, case.tool);
        let _ = self.out.flush();
    }

    fn case_finished(&mut self, record: &CaseRecord) {
        let _ = writeln!(self.out, "{}", outcome_line(&record.outcome));
    }

    fn summary(&mut self, summary: &RunSummary) {
        let _ = writeln!(self.out);
        if let Some(ref cause) = summary.aborted {
            let _ = writeln!(self.out, "Run aborted: {cause}");
        }
        let _ = writeln!(self.out, "Summary");
        let _ = writeln!(self.out, "=======");
        for record in &summary.records {
            let _ = writeln!(
                self.out,
                "  {:<4} {} ({})",
                record.outcome.label(),
                record.name,
                record.tool
            );
        }
        let counts = summary.counts();
        let _ = writeln!(
            self.out,
            "\n{} passed, {} failed, {} skipped ({} total)",
            counts.passed,
            counts.failed,
            counts.skipped,
            counts.total()
        );
        if let Some(ref root) = summary.workspace_root {
            if summary.workspace_kept {
                let _ = writeln!(self.out, "Test directory kept at {}", root.display());
            }
        }
        let _ = self.out.flush();
    }
}

fn outcome_line(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Pass => "PASS".to_string(),
        Outcome::Fail(reason) => format!("FAIL: {reason}"),
        Outcome::Skip(reason) => format!("SKIP ({reason})"),
    }
}

/// Silent during the run; prints the summary as one JSON document.
pub struct JsonReporter<W: Write> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl JsonReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn case_started(&mut self, _case: &TestCase) {}

    fn case_finished(&mut self, _record: &CaseRecord) {}

    fn summary(&mut self, summary: &RunSummary) {
        let doc = serde_json::json!({
            "counts": summary.counts(),
            "exit_code": summary.exit_code(),
            "aborted": summary.aborted,
            "workspace_root": summary.workspace_root,
            "workspace_kept": summary.workspace_kept,
            "cases": summary.records,
        });
        match serde_json::to_string_pretty(&doc) {
            Ok(text) => {
                let _ = writeln!(self.out, "{text}");
            }
            Err(e) => tracing::error!(error = %e, "failed to serialize summary"),
        }
        let _ = self.out.flush();
    }
}
