//! Compile and run workers.
//!
//! The playground never compiles in-process. A [`Compiler`] turns source files
//! into an artifact or diagnostics, a [`Runner`] executes an artifact and
//! streams its output. The process-backed implementations speak JSON over
//! stdio:
//!
//! ```text
//! compiler stdin   {"files": [["main.mbt", "fn main { ... }"]], "debug": false}
//! compiler stdout  {"kind": "success", "artifact": "..."}
//!                  {"kind": "error", "diagnostics": [{"message": "...", "line": 1}]}
//! runner stdin     the artifact, verbatim
//! runner stdout    program output, one chunk per line
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Output chunks buffered between a runner process and the pane.
const CHUNK_BUFFER: usize = 64;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("no {0} command configured")]
    NotConfigured(&'static str),
    #[error("cannot start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("worker IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{program} exited with {code:?}: {stderr}")]
    Exited {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("malformed worker message: {0}")]
    Protocol(#[from] serde_json::Error),
    #[error("worker {0} pipe unavailable")]
    MissingPipe(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileRequest {
    /// `(path, content)` pairs.
    pub files: Vec<(String, String)>,
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CompileResult {
    Success { artifact: String },
    Error { diagnostics: Vec<Diagnostic> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
            line: None,
            column: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(col)) => write!(f, "{line}:{col}: ")?,
            (Some(line), None) => write!(f, "{line}: ")?,
            _ => {}
        }
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{severity}: {}", self.message)
    }
}

pub trait Compiler: Send + Sync {
    fn compile(
        &self,
        request: CompileRequest,
    ) -> impl Future<Output = Result<CompileResult, WorkerError>> + Send;
}

pub trait Runner: Send + Sync {
    /// Start executing `artifact`. Output chunks arrive on the receiver until
    /// the program ends.
    fn run(
        &self,
        artifact: String,
    ) -> impl Future<Output = Result<mpsc::Receiver<String>, WorkerError>> + Send;
}

// ============================================================================
// Process-backed workers
// ============================================================================

#[derive(Debug, Clone)]
struct WorkerCommand {
    program: String,
    args: Vec<String>,
}

impl WorkerCommand {
    fn parse(command: &[String], role: &'static str) -> Result<Self, WorkerError> {
        let (program, args) = command
            .split_first()
            .ok_or(WorkerError::NotConfigured(role))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn spawn(&self) -> Result<Child, WorkerError> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| WorkerError::Spawn {
                program: self.program.clone(),
                source,
            })
    }
}

/// Feed `payload` to the child's stdin from a separate task, then close it.
fn feed_stdin(child: &mut Child, payload: Vec<u8>) -> Result<(), WorkerError> {
    let mut stdin = child.stdin.take().ok_or(WorkerError::MissingPipe("stdin"))?;
    tokio::spawn(async move {
        if let Err(e) = stdin.write_all(&payload).await {
            debug!(error = %e, "worker closed stdin early");
        }
    });
    Ok(())
}

/// Compiler that runs one process per request.
#[derive(Debug, Clone)]
pub struct ProcessCompiler {
    command: WorkerCommand,
}

impl ProcessCompiler {
    pub fn from_command(command: &[String]) -> Result<Self, WorkerError> {
        Ok(Self {
            command: WorkerCommand::parse(command, "compiler")?,
        })
    }
}

impl Compiler for ProcessCompiler {
    async fn compile(&self, request: CompileRequest) -> Result<CompileResult, WorkerError> {
        let payload = serde_json::to_vec(&request)?;
        let mut child = self.command.spawn()?;
        feed_stdin(&mut child, payload)?;

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(WorkerError::Exited {
                program: self.command.program.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

/// Runner that executes each artifact in a fresh process.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    command: WorkerCommand,
}

impl ProcessRunner {
    pub fn from_command(command: &[String]) -> Result<Self, WorkerError> {
        Ok(Self {
            command: WorkerCommand::parse(command, "runner")?,
        })
    }
}

impl Runner for ProcessRunner {
    async fn run(&self, artifact: String) -> Result<mpsc::Receiver<String>, WorkerError> {
        let mut child = self.command.spawn()?;
        feed_stdin(&mut child, artifact.into_bytes())?;
        let stdout = child.stdout.take().ok_or(WorkerError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(WorkerError::MissingPipe("stderr"))?;

        let (tx, rx) = mpsc::channel(CHUNK_BUFFER);
        tokio::spawn(pump_lines(stdout, tx.clone()));
        tokio::spawn(pump_lines(stderr, tx));

        let program = self.command.program.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if !status.success() => {
                    debug!(%program, code = ?status.code(), "program exited with failure")
                }
                Ok(_) => {}
                Err(e) => warn!(%program, error = %e, "waiting for runner failed"),
            }
        });
        Ok(rx)
    }
}

async fn pump_lines(stream: impl AsyncRead + Unpin, tx: mpsc::Sender<String>) {
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(line).await.is_err() {
                    // Nobody is listening any more.
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "runner output ended with error");
                break;
            }
        }
    }
}
