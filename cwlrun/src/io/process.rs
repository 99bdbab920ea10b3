//! Child-process launching with dual-sink stdio capture and cancellation.
//!
//! Stdout and stderr are drained on dedicated threads while the child runs,
//! so a chatty tool cannot deadlock on a full pipe. Every byte lands in the
//! in-memory buffers; when redirection targets are configured the same bytes
//! are also written to those files.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

use crate::error::ToolError;

const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Externally owned cancellation signal for a running launch.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request termination of the launch holding this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One fully specified child-process launch.
#[derive(Debug)]
pub struct LaunchRequest {
    pub argv: Vec<String>,
    pub working_dir: PathBuf,
    /// Appended to the inherited host environment; wins on duplicate names.
    pub environment: BTreeMap<String, String>,
    /// File attached to the child's standard input.
    pub stdin_path: Option<PathBuf>,
    /// Files that additionally receive every stdout/stderr byte.
    pub stdout_tee: Option<PathBuf>,
    pub stderr_tee: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub cancel: CancelToken,
}

/// Captured outcome of a completed child process.
#[derive(Debug)]
pub struct LaunchOutput {
    /// Literal exit code; `None` when the process died without one.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Spawn and wait for the requested process.
///
/// The wait loop checks the cancel token and the deadline between bounded
/// waits; when either fires the child is killed and the call returns a
/// cancellation error instead of waiting for natural exit.
#[instrument(skip_all, fields(program = request.argv.first().map(String::as_str).unwrap_or("")))]
pub fn launch(request: &LaunchRequest) -> Result<LaunchOutput, ToolError> {
    let Some((program, args)) = request.argv.split_first() else {
        return Err(ToolError::execution("empty command", None, None));
    };

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(&request.working_dir)
        .envs(request.environment.iter())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    match &request.stdin_path {
        Some(path) => {
            let file = File::open(path).map_err(|err| {
                ToolError::io(format!("cannot open stdin file {}", path.display()), err)
            })?;
            cmd.stdin(Stdio::from(file));
        }
        None => {
            cmd.stdin(Stdio::null());
        }
    }

    let stdout_sink = open_tee(&request.stdout_tee)?;
    let stderr_sink = open_tee(&request.stderr_tee)?;

    debug!("spawning child process");
    let mut child = cmd.spawn().map_err(|err| {
        ToolError::execution(format!("cannot start {program}"), None, Some(err))
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ToolError::execution("stdout was not piped", None, None))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ToolError::execution("stderr was not piped", None, None))?;

    let stdout_handle = thread::spawn(move || drain(stdout, stdout_sink));
    let stderr_handle = thread::spawn(move || drain(stderr, stderr_sink));

    // Join the readers before propagating a cancellation: killing the child
    // closes the pipes, so both threads finish promptly.
    let wait_result = wait_with_cancel(&mut child, request);
    let stdout = join_reader(stdout_handle)?;
    let stderr = join_reader(stderr_handle)?;
    let status = wait_result?;

    debug!(exit_code = ?status.code(), "child process finished");
    Ok(LaunchOutput {
        exit_code: status.code(),
        stdout,
        stderr,
    })
}

fn wait_with_cancel(child: &mut Child, request: &LaunchRequest) -> Result<ExitStatus, ToolError> {
    let deadline = request
        .timeout
        .map(|timeout| (Instant::now() + timeout, timeout));
    loop {
        if request.cancel.is_cancelled() {
            kill_child(child)?;
            return Err(ToolError::cancelled("cancellation signal received"));
        }
        if let Some((at, timeout)) = deadline {
            if Instant::now() >= at {
                kill_child(child)?;
                return Err(ToolError::cancelled(format!("timed out after {timeout:?}")));
            }
        }
        match child
            .wait_timeout(CANCEL_POLL)
            .map_err(|err| ToolError::io("cannot wait for child process", err))?
        {
            Some(status) => return Ok(status),
            None => continue,
        }
    }
}

fn kill_child(child: &mut Child) -> Result<(), ToolError> {
    warn!("terminating child process");
    child
        .kill()
        .map_err(|err| ToolError::io("cannot kill child process", err))?;
    child
        .wait()
        .map_err(|err| ToolError::io("cannot reap killed child process", err))?;
    Ok(())
}

fn open_tee(path: &Option<PathBuf>) -> Result<Option<File>, ToolError> {
    match path {
        Some(path) => File::create(path)
            .map(Some)
            .map_err(|err| {
                ToolError::io(
                    format!("cannot create redirection file {}", path.display()),
                    err,
                )
            }),
        None => Ok(None),
    }
}

/// Read a stream to completion, copying every chunk to `sink` when present.
fn drain<R: Read>(mut reader: R, mut sink: Option<File>) -> std::io::Result<Vec<u8>> {
    let mut collected = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        collected.extend_from_slice(&chunk[..n]);
        if let Some(file) = sink.as_mut() {
            file.write_all(&chunk[..n])?;
        }
    }
    Ok(collected)
}

fn join_reader(handle: thread::JoinHandle<std::io::Result<Vec<u8>>>) -> Result<String, ToolError> {
    match handle.join() {
        Ok(Ok(bytes)) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Ok(Err(err)) => Err(ToolError::io("cannot read child output", err)),
        Err(_) => Err(ToolError::execution(
            "output reader thread panicked",
            None,
            None,
        )),
    }
}
