//! Declarative requirement application.
//!
//! Requirements are applied to the execution context in declaration order,
//! stopping at the first failure. Application is non-transactional: a
//! partially mutated context is fine because the caller discards it on
//! failure.

use std::process::{Command, Stdio};

use serde_json::Value;
use tracing::{debug, warn};

use crate::core::requirement::{
    DockerRequirement, EnvVarRequirement, Requirement, ResourceRequirement,
    SingularityRequirement,
};
use crate::core::tool::{ToolDescriptor, is_expression};
use crate::error::ToolError;
use crate::io::config::ExecutorConfig;
use crate::io::container::{ContainerBackend, ContainerConfig, ImageSource};
use crate::io::context::ExecutionContext;

/// Availability probe for container runtimes.
///
/// A seam between requirement processing and the host, so tests can script
/// probe outcomes without Docker installed.
pub trait RuntimeProber {
    /// Whether `binary --version` succeeds on this host.
    fn probe(&self, binary: &str) -> bool;
}

/// Probes the real host path.
pub struct HostProber;

impl RuntimeProber for HostProber {
    fn probe(&self, binary: &str) -> bool {
        Command::new(binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

/// Apply every requirement record to the context.
pub fn apply_requirements(
    tool: &ToolDescriptor,
    config: &ExecutorConfig,
    prober: &dyn RuntimeProber,
    ctx: &mut ExecutionContext,
) -> Result<(), ToolError> {
    for requirement in &tool.requirements {
        match requirement {
            Requirement::DockerRequirement(docker) => {
                apply_docker(docker, config, prober, ctx)?;
            }
            Requirement::SingularityRequirement(singularity) => {
                apply_singularity(singularity, config, prober, ctx)?;
            }
            Requirement::EnvVarRequirement(env_vars) => apply_env_vars(env_vars, ctx)?,
            Requirement::ResourceRequirement(resources) => check_resources(resources, config)?,
        }
    }
    Ok(())
}

fn apply_docker(
    requirement: &DockerRequirement,
    config: &ExecutorConfig,
    prober: &dyn RuntimeProber,
    ctx: &mut ExecutionContext,
) -> Result<(), ToolError> {
    if !config.docker_enabled {
        return Err(ToolError::environment("Docker is required but disabled"));
    }

    let image = if let Some(id) = none_if_empty(&requirement.docker_image_id) {
        ImageSource::ImageId(id)
    } else if let Some(reference) = none_if_empty(&requirement.docker_pull) {
        ImageSource::Pull(reference)
    } else if let Some(path) = none_if_empty(&requirement.docker_load) {
        ImageSource::Load(path)
    } else if let Some(path) = none_if_empty(&requirement.docker_file) {
        ImageSource::Build(path)
    } else if let Some(path) = none_if_empty(&requirement.docker_import) {
        ImageSource::Import(path)
    } else {
        return Err(ToolError::descriptor(
            "DockerRequirement must set one of dockerPull, dockerLoad, dockerFile, \
             dockerImport or dockerImageId",
        ));
    };

    if !prober.probe("docker") {
        return Err(ToolError::environment(
            "Docker is required but not available on this host",
        ));
    }
    debug!(image = image.reference(), "docker runtime selected");

    install_container(
        ctx,
        ContainerConfig {
            backend: ContainerBackend::Docker,
            runtime_binary: "docker".to_string(),
            image,
            binds: Vec::new(),
            env: Vec::new(),
            output_directory: none_if_empty(&requirement.docker_output_directory),
        },
    );
    Ok(())
}

fn apply_singularity(
    requirement: &SingularityRequirement,
    config: &ExecutorConfig,
    prober: &dyn RuntimeProber,
    ctx: &mut ExecutionContext,
) -> Result<(), ToolError> {
    if !config.singularity_enabled {
        return Err(ToolError::environment(
            "Singularity is required but disabled",
        ));
    }

    let image = if let Some(id) = none_if_empty(&requirement.singularity_image_id) {
        ImageSource::ImageId(id)
    } else if let Some(reference) = none_if_empty(&requirement.singularity_pull) {
        ImageSource::Pull(reference)
    } else if let Some(path) = none_if_empty(&requirement.singularity_load) {
        ImageSource::Load(path)
    } else if let Some(path) = none_if_empty(&requirement.singularity_file) {
        ImageSource::Build(path)
    } else if let Some(path) = none_if_empty(&requirement.singularity_import) {
        ImageSource::Import(path)
    } else {
        return Err(ToolError::descriptor(
            "SingularityRequirement must set one of singularityPull, singularityLoad, \
             singularityFile, singularityImport or singularityImageId",
        ));
    };

    let runtime_binary = if prober.probe("singularity") {
        "singularity"
    } else if prober.probe("apptainer") {
        "apptainer"
    } else {
        return Err(ToolError::environment(
            "Singularity is required but neither singularity nor apptainer is available",
        ));
    };
    debug!(runtime = runtime_binary, image = image.reference(), "singularity runtime selected");

    install_container(
        ctx,
        ContainerConfig {
            backend: ContainerBackend::Singularity,
            runtime_binary: runtime_binary.to_string(),
            image,
            binds: Vec::new(),
            env: Vec::new(),
            output_directory: none_if_empty(&requirement.singularity_output_directory),
        },
    );
    Ok(())
}

/// At most one container config is active per execution; a later container
/// requirement overwrites an earlier one (last wins).
fn install_container(ctx: &mut ExecutionContext, config: ContainerConfig) {
    if let Some(previous) = &ctx.container {
        warn!(
            previous = previous.backend.as_str(),
            selected = config.backend.as_str(),
            "multiple container requirements in one descriptor: last one wins"
        );
    }
    ctx.container = Some(config);
}

fn apply_env_vars(
    requirement: &EnvVarRequirement,
    ctx: &mut ExecutionContext,
) -> Result<(), ToolError> {
    for entry in &requirement.env_def {
        match &entry.value {
            Value::String(text) if is_expression(text) => {
                return Err(ToolError::descriptor(format!(
                    "environment variable {} uses an expression value, which is not supported",
                    entry.name
                )));
            }
            Value::String(text) => {
                ctx.environment.insert(entry.name.clone(), text.clone());
            }
            _ => {
                return Err(ToolError::descriptor(format!(
                    "environment variable {} must have a literal string value",
                    entry.name
                )));
            }
        }
    }
    Ok(())
}

fn check_resources(
    requirement: &ResourceRequirement,
    config: &ExecutorConfig,
) -> Result<(), ToolError> {
    if let Some(cores_min) = requirement.cores_min {
        if cores_min > f64::from(config.max_cores) {
            return Err(ToolError::environment(format!(
                "required cores ({cores_min}) exceed the configured maximum ({})",
                config.max_cores
            )));
        }
    }
    if let Some(ram_min) = requirement.ram_min {
        if ram_min > config.max_ram_mib as f64 {
            return Err(ToolError::environment(format!(
                "required RAM ({ram_min} MiB) exceeds the configured maximum ({} MiB)",
                config.max_ram_mib
            )));
        }
    }
    Ok(())
}

fn none_if_empty(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::core::requirement::EnvironmentDef;
    use crate::test_support::tool;

    /// Scripted probe that records which binaries were asked for.
    struct FakeProber {
        available: Vec<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeProber {
        fn with(available: &[&'static str]) -> Self {
            Self {
                available: available.to_vec(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl RuntimeProber for FakeProber {
        fn probe(&self, binary: &str) -> bool {
            self.calls.borrow_mut().push(binary.to_string());
            self.available.contains(&binary)
        }
    }

    fn context() -> (tempfile::TempDir, ExecutionContext) {
        let temp = tempfile::tempdir().expect("tempdir");
        let ctx = ExecutionContext::new(Some(temp.path())).expect("context");
        (temp, ctx)
    }

    fn docker_pull(reference: &str) -> Requirement {
        Requirement::DockerRequirement(DockerRequirement {
            docker_pull: Some(reference.to_string()),
            ..DockerRequirement::default()
        })
    }

    #[test]
    fn disabled_docker_fails_before_any_probe() {
        let mut descriptor = tool("echo");
        descriptor.requirements.push(docker_pull("alpine:3.20"));
        let config = ExecutorConfig {
            docker_enabled: false,
            ..ExecutorConfig::default()
        };
        let prober = FakeProber::with(&["docker"]);
        let (_temp, mut ctx) = context();

        let err = apply_requirements(&descriptor, &config, &prober, &mut ctx).unwrap_err();
        assert_eq!(err.code(), "environment");
        assert!(prober.calls.borrow().is_empty());
    }

    #[test]
    fn docker_requirement_without_image_source_is_a_descriptor_error() {
        let mut descriptor = tool("echo");
        descriptor
            .requirements
            .push(Requirement::DockerRequirement(DockerRequirement::default()));
        let prober = FakeProber::with(&["docker"]);
        let (_temp, mut ctx) = context();

        let err =
            apply_requirements(&descriptor, &ExecutorConfig::default(), &prober, &mut ctx)
                .unwrap_err();
        assert_eq!(err.code(), "descriptor");
        assert!(err.to_string().contains("dockerPull"));
    }

    #[test]
    fn unavailable_docker_is_an_environment_error() {
        let mut descriptor = tool("echo");
        descriptor.requirements.push(docker_pull("alpine:3.20"));
        let prober = FakeProber::with(&[]);
        let (_temp, mut ctx) = context();

        let err =
            apply_requirements(&descriptor, &ExecutorConfig::default(), &prober, &mut ctx)
                .unwrap_err();
        assert_eq!(err.code(), "environment");
        assert_eq!(*prober.calls.borrow(), vec!["docker".to_string()]);
    }

    #[test]
    fn singularity_probe_falls_back_to_apptainer() {
        let mut descriptor = tool("echo");
        descriptor
            .requirements
            .push(Requirement::SingularityRequirement(SingularityRequirement {
                singularity_pull: Some("docker://alpine".to_string()),
                ..SingularityRequirement::default()
            }));
        let prober = FakeProber::with(&["apptainer"]);
        let (_temp, mut ctx) = context();

        apply_requirements(&descriptor, &ExecutorConfig::default(), &prober, &mut ctx)
            .expect("apply");
        let container = ctx.container.as_ref().expect("container");
        assert_eq!(container.runtime_binary, "apptainer");
        assert_eq!(
            *prober.calls.borrow(),
            vec!["singularity".to_string(), "apptainer".to_string()]
        );
    }

    #[test]
    fn second_container_requirement_wins() {
        let mut descriptor = tool("echo");
        descriptor.requirements.push(docker_pull("alpine:3.20"));
        descriptor.requirements.push(docker_pull("debian:12"));
        let prober = FakeProber::with(&["docker"]);
        let (_temp, mut ctx) = context();

        apply_requirements(&descriptor, &ExecutorConfig::default(), &prober, &mut ctx)
            .expect("apply");
        let container = ctx.container.as_ref().expect("container");
        assert_eq!(container.image.reference(), "debian:12");
    }

    #[test]
    fn image_id_takes_precedence_over_pull() {
        let mut descriptor = tool("echo");
        descriptor
            .requirements
            .push(Requirement::DockerRequirement(DockerRequirement {
                docker_pull: Some("alpine:3.20".to_string()),
                docker_image_id: Some("sha256:abcdef".to_string()),
                ..DockerRequirement::default()
            }));
        let prober = FakeProber::with(&["docker"]);
        let (_temp, mut ctx) = context();

        apply_requirements(&descriptor, &ExecutorConfig::default(), &prober, &mut ctx)
            .expect("apply");
        let container = ctx.container.as_ref().expect("container");
        assert_eq!(container.image, ImageSource::ImageId("sha256:abcdef".to_string()));
    }

    #[test]
    fn env_entries_merge_with_later_entries_winning() {
        let mut descriptor = tool("echo");
        descriptor
            .requirements
            .push(Requirement::EnvVarRequirement(EnvVarRequirement {
                env_def: vec![
                    EnvironmentDef {
                        name: "MODE".to_string(),
                        value: Value::String("first".to_string()),
                    },
                    EnvironmentDef {
                        name: "MODE".to_string(),
                        value: Value::String("second".to_string()),
                    },
                ],
            }));
        let prober = FakeProber::with(&[]);
        let (_temp, mut ctx) = context();

        apply_requirements(&descriptor, &ExecutorConfig::default(), &prober, &mut ctx)
            .expect("apply");
        assert_eq!(ctx.environment.get("MODE").map(String::as_str), Some("second"));
    }

    #[test]
    fn expression_env_value_fails_naming_the_variable() {
        let mut descriptor = tool("echo");
        descriptor
            .requirements
            .push(Requirement::EnvVarRequirement(EnvVarRequirement {
                env_def: vec![EnvironmentDef {
                    name: "OUTDIR".to_string(),
                    value: Value::String("$(runtime.outdir)".to_string()),
                }],
            }));
        let prober = FakeProber::with(&[]);
        let (_temp, mut ctx) = context();

        let err =
            apply_requirements(&descriptor, &ExecutorConfig::default(), &prober, &mut ctx)
                .unwrap_err();
        assert_eq!(err.code(), "descriptor");
        assert!(err.to_string().contains("OUTDIR"));
    }

    #[test]
    fn non_string_env_value_fails_naming_the_variable() {
        let mut descriptor = tool("echo");
        descriptor
            .requirements
            .push(Requirement::EnvVarRequirement(EnvVarRequirement {
                env_def: vec![EnvironmentDef {
                    name: "THREADS".to_string(),
                    value: Value::Number(4.into()),
                }],
            }));
        let prober = FakeProber::with(&[]);
        let (_temp, mut ctx) = context();

        let err =
            apply_requirements(&descriptor, &ExecutorConfig::default(), &prober, &mut ctx)
                .unwrap_err();
        assert!(err.to_string().contains("THREADS"));
    }

    #[test]
    fn resource_minimums_within_ceilings_pass() {
        let mut descriptor = tool("echo");
        descriptor
            .requirements
            .push(Requirement::ResourceRequirement(ResourceRequirement {
                cores_min: Some(2.0),
                ram_min: Some(1024.0),
                ..ResourceRequirement::default()
            }));
        let prober = FakeProber::with(&[]);
        let (_temp, mut ctx) = context();

        apply_requirements(&descriptor, &ExecutorConfig::default(), &prober, &mut ctx)
            .expect("apply");
    }

    #[test]
    fn resource_minimums_over_ceilings_fail() {
        let mut descriptor = tool("echo");
        descriptor
            .requirements
            .push(Requirement::ResourceRequirement(ResourceRequirement {
                cores_min: Some(16.0),
                ..ResourceRequirement::default()
            }));
        let prober = FakeProber::with(&[]);
        let (_temp, mut ctx) = context();

        let err =
            apply_requirements(&descriptor, &ExecutorConfig::default(), &prober, &mut ctx)
                .unwrap_err();
        assert_eq!(err.code(), "environment");
        assert!(err.to_string().contains("cores"));
    }
}
