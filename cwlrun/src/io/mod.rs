//! Side-effecting operations: filesystem, runtime probing, process
//! execution, output globbing.

pub mod config;
pub mod container;
pub mod context;
pub mod descriptor;
pub mod outputs;
pub mod process;
pub mod requirements;
