//! Tool descriptor model.
//!
//! The engine consumes descriptors that have already been parsed and checked
//! against the minimum validity contract (see `io::descriptor`). Field names
//! follow the CWL wire format (camelCase).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::requirement::Requirement;
use crate::core::value::InputValue;

/// The `class` discriminator this engine executes.
pub const TOOL_CLASS: &str = "CommandLineTool";

/// A single declarative command-line tool definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub cwl_version: String,
    pub class: String,
    pub base_command: BaseCommand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default)]
    pub inputs: IndexMap<String, InputParameter>,
    #[serde(default)]
    pub outputs: IndexMap<String, OutputParameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<Requirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<Binding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub success_codes: Vec<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub temporary_fail_codes: Vec<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permanent_fail_codes: Vec<i32>,
}

impl ToolDescriptor {
    /// Whether `code` is a declared success outcome. Zero always is.
    pub fn is_success_code(&self, code: i32) -> bool {
        code == 0 || self.success_codes.contains(&code)
    }
}

/// Base command: a single token or an ordered token list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BaseCommand {
    Single(String),
    Tokens(Vec<String>),
}

impl BaseCommand {
    pub fn is_empty(&self) -> bool {
        match self {
            BaseCommand::Single(token) => token.is_empty(),
            BaseCommand::Tokens(tokens) => tokens.is_empty(),
        }
    }
}

/// Declared input parameter.
///
/// The `type` field is opaque to the engine; rendering dispatches on the
/// concrete shape of the supplied value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputParameter {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<InputValue>,
    #[serde(rename = "inputBinding", default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<Binding>,
}

/// Declared output parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputParameter {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(rename = "outputBinding", default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<OutputBinding>,
}

/// Declarative rule mapping a parameter or static argument to its
/// command-line representation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    /// Sort key within the shared position space of arguments and inputs.
    #[serde(default)]
    pub position: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Prefix and value as two tokens (the default) or concatenated as one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separate: Option<bool>,
    /// Accepted for document fidelity; list rendering is not supported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_separator: Option<String>,
    /// Literal value source. Deferred expressions are rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<Value>,
    /// Accepted for document fidelity; no shell is involved in execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell_quote: Option<bool>,
}

impl Binding {
    /// Effective separate flag; unset means true.
    pub fn separate_tokens(&self) -> bool {
        self.separate.unwrap_or(true)
    }
}

/// How to locate an output artifact after execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputBinding {
    /// Literal glob pattern, or an ordered list of patterns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glob: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_contents: Option<bool>,
    /// Deferred expression slot; rejected when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_eval: Option<Value>,
}

/// Whether a string uses CWL deferred-expression syntax (`$(...)` / `${...}`).
pub fn is_expression(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed.starts_with("$(") || trimmed.starts_with("${")
}
