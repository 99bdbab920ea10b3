//! Typed requirement records.
//!
//! CWL documents carry requirements as open key-value records discriminated
//! by a `class` string. Here they are a closed tagged union, so an
//! unrecognized class fails when the document is deserialized instead of
//! deep inside execution.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declarative execution modifier, discriminated by its `class` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "class")]
pub enum Requirement {
    DockerRequirement(DockerRequirement),
    SingularityRequirement(SingularityRequirement),
    EnvVarRequirement(EnvVarRequirement),
    ResourceRequirement(ResourceRequirement),
}

/// Request to run the tool inside a Docker container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerRequirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_pull: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_load: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_import: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_image_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_output_directory: Option<String>,
}

/// Request to run the tool inside a Singularity/Apptainer container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingularityRequirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singularity_pull: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singularity_load: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singularity_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singularity_import: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singularity_image_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singularity_output_directory: Option<String>,
}

/// Environment variables to define for the tool process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarRequirement {
    pub env_def: Vec<EnvironmentDef>,
}

/// Single environment entry. `value` must resolve to a literal string;
/// expression values are rejected at apply time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentDef {
    pub name: String,
    pub value: Value,
}

/// Minimum resource declaration, admission-checked against configured
/// ceilings. Nothing is reserved or throttled during execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cores_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cores_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmpdir_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmpdir_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outdir_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outdir_max: Option<f64>,
}
