//! Typed error taxonomy for tool execution.
//!
//! Every failure the engine can produce carries a stable classification tag
//! (see [`ToolError::code`]) and, where a host operation failed underneath,
//! the original error as an inspectable source. Nothing is retried
//! internally; every error surfaces to the caller on first occurrence.

use std::io;

use thiserror::Error;

/// Error surfaced by the execution engine, classified by failure domain.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool descriptor is malformed or missing required fields.
    #[error("invalid tool descriptor: {message}")]
    Descriptor { message: String },

    /// An unsupported or malformed value was encountered while building the
    /// argument vector.
    #[error("cannot render command line: {message}")]
    Render { message: String },

    /// A required execution backend is disabled or not present on the host.
    #[error("execution environment unavailable: {message}")]
    Environment { message: String },

    /// The child process could not be started, or exited with a code not
    /// declared as a success outcome.
    #[error("execution failed: {message}")]
    Execution {
        message: String,
        /// Literal exit code when the process ran far enough to produce one.
        exit_code: Option<i32>,
        #[source]
        source: Option<io::Error>,
    },

    /// The caller's cancellation or timeout signal fired before the child
    /// exited on its own.
    #[error("execution cancelled: {message}")]
    Cancelled { message: String },

    /// A declared output binding could not be resolved.
    #[error("cannot resolve outputs: {message}")]
    Resolution {
        message: String,
        #[source]
        source: Option<glob::PatternError>,
    },

    /// A host filesystem operation failed outside process execution proper.
    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
    },
}

impl ToolError {
    pub(crate) fn descriptor(message: impl Into<String>) -> Self {
        ToolError::Descriptor {
            message: message.into(),
        }
    }

    pub(crate) fn render(message: impl Into<String>) -> Self {
        ToolError::Render {
            message: message.into(),
        }
    }

    pub(crate) fn environment(message: impl Into<String>) -> Self {
        ToolError::Environment {
            message: message.into(),
        }
    }

    pub(crate) fn execution(
        message: impl Into<String>,
        exit_code: Option<i32>,
        source: Option<io::Error>,
    ) -> Self {
        ToolError::Execution {
            message: message.into(),
            exit_code,
            source,
        }
    }

    pub(crate) fn cancelled(message: impl Into<String>) -> Self {
        ToolError::Cancelled {
            message: message.into(),
        }
    }

    pub(crate) fn resolution(
        message: impl Into<String>,
        source: Option<glob::PatternError>,
    ) -> Self {
        ToolError::Resolution {
            message: message.into(),
            source,
        }
    }

    pub(crate) fn io(message: impl Into<String>, source: io::Error) -> Self {
        ToolError::Io {
            message: message.into(),
            source,
        }
    }

    /// Stable classification tag for logs and machine consumers.
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::Descriptor { .. } => "descriptor",
            ToolError::Render { .. } => "render",
            ToolError::Environment { .. } => "environment",
            ToolError::Execution { .. } => "execution",
            ToolError::Cancelled { .. } => "cancelled",
            ToolError::Resolution { .. } => "resolution",
            ToolError::Io { .. } => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ToolError::descriptor("x").code(), "descriptor");
        assert_eq!(ToolError::render("x").code(), "render");
        assert_eq!(ToolError::environment("x").code(), "environment");
        assert_eq!(ToolError::execution("x", Some(1), None).code(), "execution");
        assert_eq!(ToolError::cancelled("x").code(), "cancelled");
        assert_eq!(ToolError::resolution("x", None).code(), "resolution");
    }

    #[test]
    fn io_source_is_preserved() {
        let cause = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err = ToolError::io("cannot read file", cause);
        let source = std::error::Error::source(&err).expect("source");
        assert!(source.to_string().contains("gone"));
    }
}
