//! Per-call execution workspace.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::error::ToolError;
use crate::io::container::ContainerConfig;

/// Process-scoped workspace for one execution.
///
/// Owns a fresh temporary directory for the lifetime of the call; dropping
/// the context removes it on every exit path, success or failure.
#[derive(Debug)]
pub struct ExecutionContext {
    working_dir: PathBuf,
    temp: TempDir,
    output_dir: PathBuf,
    /// Environment entries accumulated by requirement processing.
    pub environment: BTreeMap<String, String>,
    /// Container selection, when a container requirement is active.
    pub container: Option<ContainerConfig>,
}

impl ExecutionContext {
    /// Create a context rooted at `working_dir` (process cwd when `None`).
    ///
    /// Claims a private temporary directory and creates
    /// `<workingDir>/output/` if absent.
    pub fn new(working_dir: Option<&Path>) -> Result<Self, ToolError> {
        let working_dir = match working_dir {
            Some(dir) => fs::canonicalize(dir).map_err(|err| {
                ToolError::io(
                    format!("cannot resolve working directory {}", dir.display()),
                    err,
                )
            })?,
            None => env::current_dir().map_err(|err| {
                ToolError::io("cannot determine current working directory", err)
            })?,
        };

        let temp = TempDir::with_prefix("cwlrun-")
            .map_err(|err| ToolError::io("cannot create temporary directory", err))?;

        let output_dir = working_dir.join("output");
        fs::create_dir_all(&output_dir).map_err(|err| {
            ToolError::io(
                format!("cannot create output directory {}", output_dir.display()),
                err,
            )
        })?;

        debug!(
            working_dir = %working_dir.display(),
            temp_dir = %temp.path().display(),
            "execution context ready"
        );

        Ok(Self {
            working_dir,
            temp,
            output_dir,
            environment: BTreeMap::new(),
            container: None,
        })
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Scratch space owned exclusively by this call.
    pub fn temp_dir(&self) -> &Path {
        self.temp.path()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
