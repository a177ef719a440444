//! External command runner
//!
//! The driver never touches `tokio::process` directly; everything goes
//! through [`CommandRunner`] so tests can substitute a recording double.

use std::collections::{BTreeMap, VecDeque};
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::{ExecError, Result};

/// A single external process invocation.
///
/// Arguments keep their insertion order; the env mapping is ordered so
/// invocations are fully deterministic and comparable in tests.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub stdin: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Merge environment variables into the invocation.
    pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Feed the given bytes to the process on standard input.
    pub fn stdin(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(bytes.into());
        self
    }

    /// Bound the process lifetime. Without a timeout the process runs until
    /// completion or until the invocation future is dropped.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }
}

/// Executes invocations and returns captured standard output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: Invocation) -> Result<Vec<u8>>;
}

/// Runs invocations as real child processes.
///
/// Children are spawned with `kill_on_drop`, so cancelling (dropping) an
/// operation future terminates the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: Invocation) -> Result<Vec<u8>> {
        let program = invocation.program.clone();

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .envs(&invocation.env)
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(program = %program, args = ?invocation.args, "spawning");

        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: program.clone(),
            source,
        })?;

        if let Some(bytes) = invocation.stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(&bytes)
                    .await
                    .map_err(|source| ExecError::Io {
                        program: program.clone(),
                        source,
                    })?;
                // Dropping the pipe closes the child's stdin
            }
        }

        let collect = child.wait_with_output();
        let output = match invocation.timeout {
            Some(limit) => tokio::time::timeout(limit, collect)
                .await
                .map_err(|_| ExecError::Timeout {
                    program: program.clone(),
                    seconds: limit.as_secs(),
                })?,
            None => collect.await,
        }
        .map_err(|source| ExecError::Io {
            program: program.clone(),
            source,
        })?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(ExecError::NonZeroExit {
                program,
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Test double that records every invocation and replies with queued
/// responses (empty stdout when the queue is exhausted).
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<Invocation>>,
    responses: Mutex<VecDeque<Result<Vec<u8>>>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response with the given stdout.
    pub fn respond_ok(&self, stdout: impl Into<Vec<u8>>) {
        self.responses
            .lock()
            .expect("runner mutex poisoned")
            .push_back(Ok(stdout.into()));
    }

    /// Queue a failure response.
    pub fn respond_err(&self, err: ExecError) {
        self.responses
            .lock()
            .expect("runner mutex poisoned")
            .push_back(Err(err));
    }

    /// All invocations recorded so far, in order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().expect("runner mutex poisoned").clone()
    }

    /// The most recent invocation, if any.
    pub fn last_call(&self) -> Option<Invocation> {
        self.calls
            .lock()
            .expect("runner mutex poisoned")
            .last()
            .cloned()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, invocation: Invocation) -> Result<Vec<u8>> {
        self.calls
            .lock()
            .expect("runner mutex poisoned")
            .push(invocation);
        self.responses
            .lock()
            .expect("runner mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
