//! Process transport for the tool-serving child.
//!
//! [`LineTransport`] is the seam between [`crate::Session`] and whatever
//! carries its lines. [`StdioTransport`] spawns the server as a subprocess
//! and talks to it over piped stdin/stdout; [`MockTransport`] scripts the
//! same exchange in memory for tests.
//!
//! # Design notes
//!
//! Reads are blocking and one line at a time: the session never has more
//! than one request in flight, so no multiplexing is needed. Child stderr is
//! drained on a dedicated thread into a bounded tail buffer. Without that a
//! chatty child can fill its stderr pipe and stall before answering.
//!
//! Termination follows a fixed ladder: close stdin, short grace period,
//! SIGTERM, bounded wait, SIGKILL. Every step tolerates a child that already
//! exited, and the ladder runs again from [`Drop`] if nobody called
//! [`LineTransport::shutdown`].

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::ClientError;
use crate::framing::{LineReader, write_newline_delimited};

/// Number of child stderr lines retained for diagnostics.
pub const STDERR_TAIL_LINES: usize = 200;

/// Default bound on how long termination waits before force-killing.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// How long the child gets to exit on its own after stdin is closed.
const STDIN_CLOSE_GRACE: Duration = Duration::from_millis(100);

/// How long a reader waits for the stderr thread to finish after stdout EOF.
const STDERR_DRAIN_WAIT: Duration = Duration::from_millis(250);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Line-oriented, blocking channel to a tool-serving process.
pub trait LineTransport: Send {
    /// Write `line` followed by a single `\n`, then flush.
    ///
    /// # Errors
    ///
    /// [`ClientError::TransportClosed`] if stdin is unavailable or the write fails.
    fn write_line(&mut self, line: &str) -> Result<(), ClientError>;

    /// Block until the next line arrives and return it without its newline.
    ///
    /// # Errors
    ///
    /// [`ClientError::StreamClosed`] once stdout reaches end-of-stream,
    /// carrying whatever stderr output was captured.
    fn read_line(&mut self) -> Result<String, ClientError>;

    /// Whether the other end is still running.
    fn is_alive(&mut self) -> bool;

    /// Terminate the other end. Idempotent; never fails.
    fn shutdown(&mut self);
}

/// Lifecycle of the child process owned by a [`StdioTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildState {
    NotStarted,
    Running,
    Terminating,
    Exited,
}

/// Fully resolved command line for the tool-serving process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Extra environment variables layered over the inherited environment.
    pub env: BTreeMap<String, String>,
    /// Working directory for the child; inherits the harness cwd when `None`.
    pub workdir: Option<PathBuf>,
}

impl ServerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }
}

impl fmt::Display for ServerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

type StderrTail = Arc<Mutex<VecDeque<String>>>;

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
fn saturating_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Transport that runs the tool-serving process as a child subprocess.
pub struct StdioTransport {
    command: ServerCommand,
    shutdown_timeout: Duration,
    state: ChildState,
    child: Option<Child>,
    pid: Option<u32>,
    stdin: Option<ChildStdin>,
    stdout: Option<LineReader<ChildStdout>>,
    stderr_tail: StderrTail,
    stderr_thread: Option<JoinHandle<()>>,
}

impl StdioTransport {
    /// Create a transport for `command` without starting it.
    pub fn new(command: ServerCommand) -> Self {
        Self {
            command,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            state: ChildState::NotStarted,
            child: None,
            pid: None,
            stdin: None,
            stdout: None,
            stderr_tail: Arc::new(Mutex::new(VecDeque::new())),
            stderr_thread: None,
        }
    }

    /// Bound the SIGTERM-to-SIGKILL wait.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Create and start a transport in one step.
    ///
    /// # Errors
    ///
    /// [`ClientError::StartFailure`] if the executable cannot be launched.
    pub fn spawn(command: ServerCommand, shutdown_timeout: Duration) -> Result<Self, ClientError> {
        let mut transport = Self::new(command).with_shutdown_timeout(shutdown_timeout);
        transport.start()?;
        Ok(transport)
    }

    /// Spawn the child with all three standard streams piped.
    ///
    /// # Errors
    ///
    /// [`ClientError::StartFailure`] if the executable cannot be launched or
    /// the transport was already started.
    pub fn start(&mut self) -> Result<(), ClientError> {
        if self.state != ChildState::NotStarted {
            return Err(ClientError::StartFailure {
                command: self.command.to_string(),
                source: std::io::Error::other("transport already started"),
            });
        }

        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.args)
            .envs(&self.command.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref dir) = self.command.workdir {
            cmd.current_dir(dir);
        }

        let start_failure = |source: std::io::Error| ClientError::StartFailure {
            command: self.command.to_string(),
            source,
        };

        let mut child = cmd.spawn().map_err(start_failure)?;
        let missing = |stream: &str| std::io::Error::other(format!("child {stream} was not piped"));
        let stdin = child.stdin.take().ok_or_else(|| start_failure(missing("stdin")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| start_failure(missing("stdout")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| start_failure(missing("stderr")))?;

        let tail = Arc::clone(&self.stderr_tail);
        let program = self.command.program.display().to_string();
        let stderr_thread = thread::Builder::new()
            .name("server-stderr".to_string())
            .spawn(move || {
                for line in BufReader::new(stderr).lines() {
                    let Ok(line) = line else { break };
                    tracing::debug!(server = %program, "server stderr: {}", line);
                    let mut tail = lock(&tail);
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            })
            .map_err(|e| {
                let _ = child.kill();
                let _ = child.wait();
                start_failure(e)
            })?;

        let pid = child.id();
        tracing::info!(command = %self.command, pid, "server process started");

        self.pid = Some(pid);
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stdout = Some(LineReader::new(stdout));
        self.stderr_thread = Some(stderr_thread);
        self.state = ChildState::Running;
        Ok(())
    }

    pub fn state(&self) -> ChildState {
        self.state
    }

    /// OS process id, once started.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn command(&self) -> &ServerCommand {
        &self.command
    }

    /// Captured stderr tail joined with newlines.
    pub fn stderr_snapshot(&self) -> String {
        lock(&self.stderr_tail)
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Give the stderr thread a moment to reach EOF so the snapshot is complete.
    fn drain_stderr(&mut self) -> String {
        if let Some(handle) = self.stderr_thread.take() {
            let deadline = Instant::now() + STDERR_DRAIN_WAIT;
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(POLL_INTERVAL);
            }
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                self.stderr_thread = Some(handle);
            }
        }
        self.stderr_snapshot()
    }

    /// Poll `try_wait` until the child exits or `timeout` elapses.
    fn wait_for_exit(child: &mut Child, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    tracing::debug!(%status, "server process exited");
                    return true;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(POLL_INTERVAL),
                Ok(None) => return false,
                Err(e) => {
                    tracing::warn!(error = %e, "error waiting for server process");
                    return false;
                }
            }
        }
    }

    #[cfg(unix)]
    fn send_terminate(child: &mut Child) {
        match libc::pid_t::try_from(child.id()) {
            // SAFETY: kill(2) on a pid we spawned and have not yet reaped.
            Ok(pid) => unsafe {
                libc::kill(pid, libc::SIGTERM);
            },
            Err(_) => {
                let _ = child.kill();
            }
        }
    }

    #[cfg(not(unix))]
    fn send_terminate(child: &mut Child) {
        let _ = child.kill();
    }
}

impl LineTransport for StdioTransport {
    fn write_line(&mut self, line: &str) -> Result<(), ClientError> {
        let stdin = self.stdin.as_mut().ok_or_else(|| ClientError::TransportClosed {
            reason: "server stdin is not available".to_string(),
        })?;
        write_newline_delimited(stdin, line).map_err(|e| ClientError::TransportClosed {
            reason: format!("failed to write to server stdin: {e}"),
        })
    }

    fn read_line(&mut self) -> Result<String, ClientError> {
        let Some(reader) = self.stdout.as_mut() else {
            return Err(ClientError::StreamClosed {
                stderr: self.stderr_snapshot(),
            });
        };
        match reader.next_line() {
            Ok(Some(line)) => Ok(line),
            Ok(None) => {
                self.stdout = None;
                Err(ClientError::StreamClosed {
                    stderr: self.drain_stderr(),
                })
            }
            Err(e) => Err(ClientError::TransportClosed {
                reason: format!("failed to read from server stdout: {e}"),
            }),
        }
    }

    fn is_alive(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    fn shutdown(&mut self) {
        if matches!(self.state, ChildState::NotStarted | ChildState::Exited) {
            return;
        }
        self.state = ChildState::Terminating;

        // EOF on stdin is the politest signal a stdio server understands.
        self.stdin.take();

        if let Some(mut child) = self.child.take() {
            if !Self::wait_for_exit(&mut child, STDIN_CLOSE_GRACE) {
                tracing::info!(pid = child.id(), "sending SIGTERM to server process");
                Self::send_terminate(&mut child);
                if !Self::wait_for_exit(&mut child, self.shutdown_timeout) {
                    tracing::warn!(
                        pid = child.id(),
                        timeout_ms = saturating_millis(self.shutdown_timeout),
                        "server process did not exit within timeout, killing"
                    );
                    let _ = child.kill();
                    let _ = child.wait();
                }
            }
        }

        self.stdout.take();
        if let Some(handle) = self.stderr_thread.take() {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
        self.state = ChildState::Exited;
        tracing::info!(command = %self.command, "server process stopped");
    }
}

impl Drop for StdioTransport {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for StdioTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdioTransport")
            .field("command", &self.command)
            .field("state", &self.state)
            .field("pid", &self.pid)
            .finish()
    }
}

// ─── MockTransport ───────────────────────────────────────────────────────────

type Responder = Box<dyn FnMut(&str) -> Vec<String> + Send>;

struct MockState {
    incoming: VecDeque<String>,
    written: Vec<String>,
    responder: Option<Responder>,
    alive: bool,
    stdin_open: bool,
    shutdowns: usize,
    stderr: String,
}

/// In-memory [`LineTransport`] for tests.
///
/// Lines queued through the paired [`MockTransportHandle`] are returned by
/// `read_line` in order; once the queue is empty `read_line` reports
/// [`ClientError::StreamClosed`]. Everything written is captured.
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

/// Test-side view of a [`MockTransport`] that outlives the session owning it.
#[derive(Clone)]
pub struct MockTransportHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> (Self, MockTransportHandle) {
        let state = Arc::new(Mutex::new(MockState {
            incoming: VecDeque::new(),
            written: Vec::new(),
            responder: None,
            alive: true,
            stdin_open: true,
            shutdowns: 0,
            stderr: String::new(),
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockTransportHandle { state },
        )
    }
}

impl LineTransport for MockTransport {
    fn write_line(&mut self, line: &str) -> Result<(), ClientError> {
        let mut state = lock(&self.state);
        if !state.stdin_open {
            return Err(ClientError::TransportClosed {
                reason: "mock stdin closed".to_string(),
            });
        }
        state.written.push(line.to_string());
        if let Some(mut responder) = state.responder.take() {
            let replies = responder(line);
            state.incoming.extend(replies);
            state.responder = Some(responder);
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, ClientError> {
        let mut state = lock(&self.state);
        state
            .incoming
            .pop_front()
            .ok_or_else(|| ClientError::StreamClosed {
                stderr: state.stderr.clone(),
            })
    }

    fn is_alive(&mut self) -> bool {
        lock(&self.state).alive
    }

    fn shutdown(&mut self) {
        let mut state = lock(&self.state);
        state.shutdowns += 1;
        state.alive = false;
        state.stdin_open = false;
    }
}

impl MockTransportHandle {
    /// Queue a raw stdout line.
    pub fn push_line(&self, line: impl Into<String>) {
        lock(&self.state).incoming.push_back(line.into());
    }

    /// Queue a JSON value as one stdout line.
    pub fn push_json(&self, value: &serde_json::Value) {
        self.push_line(value.to_string());
    }

    /// Install a closure that produces stdout lines for every line written.
    pub fn respond_with<F>(&self, responder: F)
    where
        F: FnMut(&str) -> Vec<String> + Send + 'static,
    {
        lock(&self.state).responder = Some(Box::new(responder));
    }

    /// Every line written so far.
    pub fn written(&self) -> Vec<String> {
        lock(&self.state).written.clone()
    }

    /// Written lines parsed as JSON; unparsable lines are dropped.
    pub fn written_json(&self) -> Vec<serde_json::Value> {
        self.written()
            .iter()
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect()
    }

    pub fn set_stderr(&self, stderr: impl Into<String>) {
        lock(&self.state).stderr = stderr.into();
    }

    /// Make further writes fail with `TransportClosed`.
    pub fn close_stdin(&self) {
        lock(&self.state).stdin_open = false;
    }

    pub fn is_alive(&self) -> bool {
        lock(&self.state).alive
    }

    pub fn shutdown_count(&self) -> usize {
        lock(&self.state).shutdowns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_millis_saturate() {
        assert_eq!(saturating_millis(Duration::from_millis(2000)), 2000);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn server_command_display_joins_args() {
        let cmd = ServerCommand::new("fileio-mcp").args(["serve", "--mode", "stdio"]);
        assert_eq!(cmd.to_string(), "fileio-mcp serve --mode stdio");
    }

    #[test]
    fn new_transport_is_not_started() {
        let transport = StdioTransport::new(ServerCommand::new("true"));
        assert_eq!(transport.state(), ChildState::NotStarted);
        assert!(transport.pid().is_none());
    }

    #[test]
    fn start_failure_for_missing_executable() {
        let cmd = ServerCommand::new("/nonexistent/fileio-mcp-does-not-exist");
        let err = StdioTransport::spawn(cmd, DEFAULT_SHUTDOWN_TIMEOUT).unwrap_err();
        assert!(matches!(err, ClientError::StartFailure { .. }), "{err}");
    }

    #[test]
    fn shutdown_before_start_is_noop() {
        let mut transport = StdioTransport::new(ServerCommand::new("true"));
        transport.shutdown();
        transport.shutdown();
        assert_eq!(transport.state(), ChildState::NotStarted);
    }

    #[test]
    fn write_before_start_is_transport_closed() {
        let mut transport = StdioTransport::new(ServerCommand::new("true"));
        let err = transport.write_line("{}").unwrap_err();
        assert!(matches!(err, ClientError::TransportClosed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn cat_echoes_lines_and_shuts_down() {
        let mut transport =
            StdioTransport::spawn(ServerCommand::new("cat"), Duration::from_millis(500)).unwrap();
        assert_eq!(transport.state(), ChildState::Running);
        assert!(transport.pid().is_some());

        transport.write_line(r#"{"id":1}"#).unwrap();
        assert_eq!(transport.read_line().unwrap(), r#"{"id":1}"#);
        assert!(transport.is_alive());

        transport.shutdown();
        assert_eq!(transport.state(), ChildState::Exited);
        assert!(!transport.is_alive());
        transport.shutdown();
        assert_eq!(transport.state(), ChildState::Exited);
    }

    #[cfg(unix)]
    #[test]
    fn stream_closed_carries_stderr() {
        let cmd = ServerCommand::new("sh").args(["-c", "echo boom >&2"]);
        let mut transport = StdioTransport::spawn(cmd, Duration::from_millis(500)).unwrap();
        match transport.read_line().unwrap_err() {
            ClientError::StreamClosed { stderr } => assert!(stderr.contains("boom"), "{stderr}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn stubborn_child_is_killed_after_timeout() {
        let cmd = ServerCommand::new("sh").args(["-c", "trap '' TERM; while :; do sleep 1; done"]);
        let mut transport = StdioTransport::spawn(cmd, Duration::from_millis(200)).unwrap();
        let started = Instant::now();
        transport.shutdown();
        assert_eq!(transport.state(), ChildState::Exited);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn workdir_and_env_reach_the_child() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = ServerCommand::new("sh")
            .args(["-c", "echo \"$MARKER\"; pwd"])
            .env("MARKER", "hello-env")
            .workdir(dir.path());
        let mut transport = StdioTransport::spawn(cmd, Duration::from_millis(500)).unwrap();
        assert_eq!(transport.read_line().unwrap(), "hello-env");
        let pwd = PathBuf::from(transport.read_line().unwrap());
        assert_eq!(
            pwd.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn mock_returns_queued_lines_then_stream_closed() {
        let (mut mock, handle) = MockTransport::new();
        handle.push_line("one");
        handle.set_stderr("tail");
        assert_eq!(mock.read_line().unwrap(), "one");
        match mock.read_line().unwrap_err() {
            ClientError::StreamClosed { stderr } => assert_eq!(stderr, "tail"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn mock_responder_sees_every_write() {
        let (mut mock, handle) = MockTransport::new();
        handle.respond_with(|line| vec![format!("echo:{line}")]);
        mock.write_line("a").unwrap();
        mock.write_line("b").unwrap();
        assert_eq!(mock.read_line().unwrap(), "echo:a");
        assert_eq!(mock.read_line().unwrap(), "echo:b");
        assert_eq!(handle.written(), vec!["a", "b"]);
    }

    #[test]
    fn mock_shutdown_closes_stdin() {
        let (mut mock, handle) = MockTransport::new();
        mock.shutdown();
        assert!(!handle.is_alive());
        assert_eq!(handle.shutdown_count(), 1);
        assert!(mock.write_line("x").is_err());
    }
}
