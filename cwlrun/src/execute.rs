//! Orchestration of a single tool execution.
//!
//! One `execute` call means one child process: requirements are applied
//! first (they may select a container backend and populate the
//! environment), the argument vector is rendered, the process runs, and
//! declared outputs are harvested. The context's temporary directory is
//! removed on every exit path.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::core::render::render_command_line;
use crate::core::tool::{ToolDescriptor, is_expression};
use crate::core::value::InputValue;
use crate::error::ToolError;
use crate::io::config::ExecutorConfig;
use crate::io::container::wrap_command;
use crate::io::context::ExecutionContext;
use crate::io::outputs::resolve_outputs;
use crate::io::process::{CancelToken, LaunchRequest, launch};
use crate::io::requirements::{HostProber, RuntimeProber, apply_requirements};

/// Options for one `execute` call.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Working directory override; process cwd when unset.
    pub working_dir: Option<PathBuf>,
    /// Wall-clock budget for the child process.
    pub timeout: Option<Duration>,
    /// External cancellation signal observed while the child runs.
    pub cancel: CancelToken,
}

/// Outcome of a successful execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteResult {
    /// Literal exit code, even when success came from a declared code.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Output id → first matched artifact path.
    pub output_files: BTreeMap<String, PathBuf>,
}

/// Single-tool execution engine.
///
/// Holds no state between calls; concurrent `execute` calls from separate
/// threads each own their context. Callers that point two calls at the same
/// working directory are responsible for the resulting output races.
pub struct Executor {
    config: ExecutorConfig,
    prober: Box<dyn RuntimeProber>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            config,
            prober: Box::new(HostProber),
        }
    }

    /// Replace the runtime availability probe. Tests use scripted probes.
    pub fn with_prober(config: ExecutorConfig, prober: Box<dyn RuntimeProber>) -> Self {
        Self { config, prober }
    }

    /// Execute one tool against one input set.
    #[instrument(skip_all, fields(tool = tool.id.as_deref().unwrap_or("<unnamed>")))]
    pub fn execute(
        &self,
        tool: &ToolDescriptor,
        inputs: &IndexMap<String, InputValue>,
        options: &ExecuteOptions,
    ) -> Result<ExecuteResult, ToolError> {
        reject_expression_redirections(tool)?;

        let mut ctx = ExecutionContext::new(options.working_dir.as_deref())?;

        apply_requirements(tool, &self.config, self.prober.as_ref(), &mut ctx)?;

        let argv = render_command_line(tool, inputs)?;
        let argv = match &ctx.container {
            Some(container) => wrap_command(&argv, &ctx, container),
            None => argv,
        };
        debug!(argv = ?argv, "command line ready");

        let request = LaunchRequest {
            argv,
            working_dir: ctx.working_dir().to_path_buf(),
            environment: ctx.environment.clone(),
            stdin_path: tool
                .stdin
                .as_deref()
                .map(|target| resolve_stdin(ctx.working_dir(), target)),
            stdout_tee: tool
                .stdout
                .as_deref()
                .map(|name| ctx.output_dir().join(name)),
            stderr_tee: tool
                .stderr
                .as_deref()
                .map(|name| ctx.output_dir().join(name)),
            timeout: options.timeout,
            cancel: options.cancel.clone(),
        };

        let output = launch(&request)?;

        let exit_code = output.exit_code.ok_or_else(|| {
            ToolError::execution("child process terminated without an exit code", None, None)
        })?;
        if !tool.is_success_code(exit_code) {
            return Err(ToolError::execution(
                format!(
                    "process exited with undeclared code {exit_code}{}",
                    stderr_excerpt(&output.stderr)
                ),
                Some(exit_code),
                None,
            ));
        }
        if exit_code != 0 {
            info!(exit_code, "non-zero exit accepted by declared success codes");
        }

        let output_files = resolve_outputs(tool, ctx.output_dir())?;

        Ok(ExecuteResult {
            exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
            output_files,
        })
    }
}

fn reject_expression_redirections(tool: &ToolDescriptor) -> Result<(), ToolError> {
    for (field, target) in [
        ("stdin", &tool.stdin),
        ("stdout", &tool.stdout),
        ("stderr", &tool.stderr),
    ] {
        if let Some(target) = target {
            if is_expression(target) {
                return Err(ToolError::descriptor(format!(
                    "{field} expressions are not supported"
                )));
            }
        }
    }
    Ok(())
}

fn resolve_stdin(working_dir: &Path, target: &str) -> PathBuf {
    let path = Path::new(target);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    }
}

fn stderr_excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        let excerpt: String = trimmed.chars().take(200).collect();
        format!(": {excerpt}")
    }
}
