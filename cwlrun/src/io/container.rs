//! Container run-command construction for sandboxed execution.
//!
//! Wrapping is a pure transform: runtime probing happens during requirement
//! processing, and nothing is executed here. Both dialects bind-mount the
//! working and output directories onto their identical in-container paths so
//! relative semantics survive inside the sandbox.

use std::path::Path;

use crate::io::context::ExecutionContext;

/// Supported container backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerBackend {
    Docker,
    Singularity,
}

impl ContainerBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            ContainerBackend::Docker => "docker",
            ContainerBackend::Singularity => "singularity",
        }
    }
}

/// Exactly-one image acquisition policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Pull by reference from a registry.
    Pull(String),
    /// Load from an image archive.
    Load(String),
    /// Build from a definition file.
    Build(String),
    /// Import a filesystem archive.
    Import(String),
    /// Use an image already present on the host, by explicit id.
    ImageId(String),
}

impl ImageSource {
    /// Token passed to the runtime to select the image.
    pub fn reference(&self) -> &str {
        match self {
            ImageSource::Pull(reference)
            | ImageSource::Load(reference)
            | ImageSource::Build(reference)
            | ImageSource::Import(reference)
            | ImageSource::ImageId(reference) => reference,
        }
    }
}

/// Container selection produced by requirement processing.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    pub backend: ContainerBackend,
    /// Runtime binary resolved by the availability probe: `docker`, or
    /// `singularity` with an `apptainer` fallback.
    pub runtime_binary: String,
    pub image: ImageSource,
    /// Extra `host:container` bind specs beyond the working/output mounts.
    pub binds: Vec<String>,
    /// Extra environment entries applied only inside the container.
    pub env: Vec<(String, String)>,
    /// Output directory override inside the container.
    pub output_directory: Option<String>,
}

/// Wrap an argument vector for execution inside the configured container.
pub fn wrap_command(
    argv: &[String],
    ctx: &ExecutionContext,
    config: &ContainerConfig,
) -> Vec<String> {
    match config.backend {
        ContainerBackend::Docker => wrap_docker(argv, ctx, config),
        ContainerBackend::Singularity => wrap_singularity(argv, ctx, config),
    }
}

/// Docker dialect: `run --rm`, repeated `-v`/`-e`, `-w` for the working
/// directory. `--rm` gives auto-remove teardown; no container id is kept.
fn wrap_docker(argv: &[String], ctx: &ExecutionContext, config: &ContainerConfig) -> Vec<String> {
    let mut command = vec![
        config.runtime_binary.clone(),
        "run".to_string(),
        "--rm".to_string(),
    ];

    command.push("-v".to_string());
    command.push(identity_bind(ctx.working_dir()));
    command.push("-v".to_string());
    command.push(identity_bind(ctx.output_dir()));
    for bind in &config.binds {
        command.push("-v".to_string());
        command.push(bind.clone());
    }

    command.push("-w".to_string());
    command.push(path_token(ctx.working_dir()));

    for (name, value) in &ctx.environment {
        command.push("-e".to_string());
        command.push(format!("{name}={value}"));
    }
    for (name, value) in &config.env {
        command.push("-e".to_string());
        command.push(format!("{name}={value}"));
    }

    command.push(config.image.reference().to_string());
    command.extend(argv.iter().cloned());
    command
}

/// Singularity/Apptainer dialect: `exec`, one comma-joined `--bind` list,
/// repeated `--env`, `--pwd` for the working directory.
fn wrap_singularity(
    argv: &[String],
    ctx: &ExecutionContext,
    config: &ContainerConfig,
) -> Vec<String> {
    let mut command = vec![config.runtime_binary.clone(), "exec".to_string()];

    let mut binds = vec![
        identity_bind(ctx.working_dir()),
        identity_bind(ctx.output_dir()),
    ];
    binds.extend(config.binds.iter().cloned());
    command.push("--bind".to_string());
    command.push(binds.join(","));

    command.push("--pwd".to_string());
    command.push(path_token(ctx.working_dir()));

    for (name, value) in &ctx.environment {
        command.push("--env".to_string());
        command.push(format!("{name}={value}"));
    }
    for (name, value) in &config.env {
        command.push("--env".to_string());
        command.push(format!("{name}={value}"));
    }

    command.push(config.image.reference().to_string());
    command.extend(argv.iter().cloned());
    command
}

/// Host path mounted onto the identical container path.
fn identity_bind(path: &Path) -> String {
    format!("{0}:{0}", path.display())
}

fn path_token(path: &Path) -> String {
    path.display().to_string()
}
