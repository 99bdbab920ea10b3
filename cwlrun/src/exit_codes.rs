//! Stable exit codes for cwlrun CLI commands.

use crate::error::ToolError;

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid descriptor, inputs, or output binding.
pub const INVALID: i32 = 1;
/// A required container backend is disabled or missing on the host.
pub const UNAVAILABLE: i32 = 2;
/// The tool process failed, was cancelled, or the host interfered.
pub const FAILED: i32 = 3;

/// Exit code for a classified engine error.
pub fn for_error(err: &ToolError) -> i32 {
    match err {
        ToolError::Descriptor { .. } | ToolError::Render { .. } | ToolError::Resolution { .. } => {
            INVALID
        }
        ToolError::Environment { .. } => UNAVAILABLE,
        ToolError::Execution { .. } | ToolError::Cancelled { .. } | ToolError::Io { .. } => FAILED,
    }
}
