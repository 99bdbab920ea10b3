//! Command-line synthesis and sandboxed execution of CWL CommandLineTools.
//!
//! Given a validated tool descriptor and a concrete set of input values,
//! the engine renders a deterministic argument vector, runs it natively or
//! inside a container runtime (Docker or Singularity/Apptainer), and
//! harvests declared output artifacts from the output directory. The
//! architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (descriptor model, requirement
//!   records, binding rendering). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (context lifecycle, runtime
//!   probing, process launching, output globbing, document loading).
//!
//! [`execute`] coordinates core logic with I/O to run one tool invocation
//! per call.

pub mod core;
pub mod error;
pub mod execute;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::error::ToolError;
pub use crate::execute::{ExecuteOptions, ExecuteResult, Executor};
pub use crate::io::process::CancelToken;
