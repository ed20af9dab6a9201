//! Execution back-ends. The harness only ever sees the [`AcvpEngine`] trait;
//! [`SubprocessEngine`] runs the real subject as an external process.

use crate::config::HarnessConfig;
use crate::error::LaunchError;
use crate::invocation::Invocation;
use slhdsa_acvp_params::acvp::{LAUNCH_FAILURE_EXIT_CODE, SIGNALLED_EXIT_CODE, TIMEOUT_EXIT_CODE};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::warn;

const POLL_INITIAL: Duration = Duration::from_millis(1);
const POLL_MAX: Duration = Duration::from_millis(50);
const OUTPUT_GRACE: Duration = Duration::from_millis(100);

/// What one subject run produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InvocationResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl InvocationResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Synthetic failure for a subject that never started
    pub fn launch_failure(error: &LaunchError) -> Self {
        Self {
            exit_code: LAUNCH_FAILURE_EXIT_CODE,
            stdout: String::new(),
            stderr: error.to_string(),
        }
    }
}

/// Trait every execution back-end must implement.
pub trait AcvpEngine: Sync {
    /// Run one invocation to completion. Never fails: problems are encoded
    /// in the returned exit code and stderr.
    fn execute(&self, invocation: &Invocation) -> InvocationResult;
}

/// Runs the subject executable once per invocation, without a shell.
#[derive(Debug, Clone)]
pub struct SubprocessEngine {
    program: PathBuf,
    leading_args: Vec<String>,
    timeout: Option<Duration>,
}

impl SubprocessEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            timeout: None,
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(&config.subject)
            .with_leading_args(config.subject_args.clone())
            .with_timeout(config.timeout())
    }

    pub fn with_leading_args(mut self, args: Vec<String>) -> Self {
        self.leading_args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn leading_args(&self) -> &[String] {
        &self.leading_args
    }

    fn spawn(&self, invocation: &Invocation) -> Result<Child, LaunchError> {
        Command::new(&self.program)
            .args(&self.leading_args)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| LaunchError {
                program: self.program.clone(),
                source,
            })
    }

    fn collect(&self, mut child: Child) -> InvocationResult {
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        let stdout = child.stdout.take().map(PipeReader::spawn);
        let stderr = child.stderr.take().map(PipeReader::spawn);
        let status = wait(&mut child, deadline);

        // A descendant of the subject can keep the pipes open after the subject
        // itself is gone, so output is only awaited until the deadline plus a grace.
        let read_until = deadline.map(|deadline| deadline.max(Instant::now()) + OUTPUT_GRACE);
        let (stdout, stdout_closed) = PipeReader::finish(stdout, read_until);
        let (mut stderr, stderr_closed) = PipeReader::finish(stderr, read_until);
        if !(stdout_closed && stderr_closed) {
            warn!(
                program = %self.program.display(),
                "subject output still held open by a descendant process, stopped reading"
            );
            stderr.push_str("subject output still held open by a descendant process\n");
        }

        match status {
            Ok(Some(status)) => InvocationResult {
                exit_code: status.code().unwrap_or(SIGNALLED_EXIT_CODE),
                stdout,
                stderr,
            },
            Ok(None) => {
                let timeout = self.timeout.unwrap_or_default();
                stderr.push_str(&format!("subject timed out after {timeout:?}\n"));
                InvocationResult {
                    exit_code: TIMEOUT_EXIT_CODE,
                    stdout,
                    stderr,
                }
            }
            Err(error) => {
                stderr.push_str(&format!("failed waiting for subject: {error}\n"));
                InvocationResult {
                    exit_code: LAUNCH_FAILURE_EXIT_CODE,
                    stdout,
                    stderr,
                }
            }
        }
    }
}

/// `Ok(None)` means the deadline passed and the child was killed.
fn wait(child: &mut Child, deadline: Option<Instant>) -> io::Result<Option<ExitStatus>> {
    let Some(deadline) = deadline else {
        return child.wait().map(Some);
    };

    let mut backoff = POLL_INITIAL;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            // The child may exit between try_wait and kill; either way it is reaped below.
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(backoff.min(deadline - now));
        backoff = (backoff * 2).min(POLL_MAX);
    }
}

impl AcvpEngine for SubprocessEngine {
    fn execute(&self, invocation: &Invocation) -> InvocationResult {
        match self.spawn(invocation) {
            Ok(child) => self.collect(child),
            Err(error) => {
                warn!(key = %invocation.key, %error, "subject could not be started");
                InvocationResult::launch_failure(&error)
            }
        }
    }
}

/// Drains one pipe on its own thread so a chatty child cannot block on a full
/// buffer. Output accumulates as it arrives, so whatever was read is still
/// available if the pipe is abandoned before EOF.
struct PipeReader {
    buf: Arc<Mutex<Vec<u8>>>,
    eof: Receiver<()>,
}

impl PipeReader {
    fn spawn<R: Read + Send + 'static>(mut pipe: R) -> Self {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buf);
        let (tx, eof) = mpsc::channel();
        thread::spawn(move || {
            let mut chunk = [0u8; 4096];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => sink
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .extend_from_slice(&chunk[..n]),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
            let _ = tx.send(());
        });
        Self { buf, eof }
    }

    /// Output read so far, and whether the pipe reached EOF by `until`.
    /// With no `until` this waits for EOF unconditionally.
    fn finish(reader: Option<Self>, until: Option<Instant>) -> (String, bool) {
        let Some(reader) = reader else {
            return (String::new(), true);
        };
        let closed = match until {
            None => reader.eof.recv().is_ok(),
            Some(until) => reader
                .eof
                .recv_timeout(until.saturating_duration_since(Instant::now()))
                .is_ok(),
        };
        let bytes = reader.buf.lock().unwrap_or_else(PoisonError::into_inner);
        (String::from_utf8_lossy(&bytes).into_owned(), closed)
    }
}
