//! Descriptor and input loading: the parsing boundary in front of the
//! engine.
//!
//! The engine itself never reads raw documents; it consumes descriptors that
//! passed the minimum validity contract enforced here: the CommandLineTool
//! class discriminator, a cwlVersion, and a non-empty base command of the
//! correct shape. Unknown requirement classes already fail during
//! deserialization.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;

use crate::core::tool::{BaseCommand, TOOL_CLASS, ToolDescriptor};
use crate::core::value::InputValue;
use crate::error::ToolError;

/// Load and validate a tool descriptor from JSON or YAML.
///
/// `.json` parses as JSON and `.yaml`/`.yml` as YAML; any other extension
/// tries YAML first and falls back to JSON.
pub fn load_tool(path: &Path) -> Result<ToolDescriptor, ToolError> {
    let contents = read(path)?;
    let tool: ToolDescriptor = parse(path, &contents)?;
    validate_tool(&tool)?;
    Ok(tool)
}

/// Load an input id → value mapping from JSON or YAML.
pub fn load_inputs(path: &Path) -> Result<IndexMap<String, InputValue>, ToolError> {
    let contents = read(path)?;
    parse(path, &contents)
}

/// Minimum validity contract guaranteed before the engine sees a descriptor.
pub fn validate_tool(tool: &ToolDescriptor) -> Result<(), ToolError> {
    if tool.cwl_version.is_empty() {
        return Err(ToolError::descriptor("cwlVersion is required"));
    }
    if tool.class != TOOL_CLASS {
        return Err(ToolError::descriptor(format!(
            "class must be {TOOL_CLASS:?}, got {:?}",
            tool.class
        )));
    }
    match &tool.base_command {
        BaseCommand::Single(token) if token.is_empty() => {
            Err(ToolError::descriptor("baseCommand must not be empty"))
        }
        BaseCommand::Tokens(tokens)
            if tokens.is_empty() || tokens.iter().any(String::is_empty) =>
        {
            Err(ToolError::descriptor(
                "baseCommand must be a non-empty list of non-empty strings",
            ))
        }
        _ => Ok(()),
    }
}

fn read(path: &Path) -> Result<String, ToolError> {
    fs::read_to_string(path)
        .map_err(|err| ToolError::io(format!("cannot read {}", path.display()), err))
}

fn parse<T: serde::de::DeserializeOwned>(path: &Path, contents: &str) -> Result<T, ToolError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match extension.as_str() {
        "json" => serde_json::from_str(contents)
            .map_err(|err| parse_error(path, "JSON", &err)),
        "yaml" | "yml" => serde_yaml::from_str(contents)
            .map_err(|err| parse_error(path, "YAML", &err)),
        _ => serde_yaml::from_str(contents).or_else(|_| {
            serde_json::from_str(contents).map_err(|err| parse_error(path, "JSON", &err))
        }),
    }
}

fn parse_error(path: &Path, format: &str, err: &dyn std::fmt::Display) -> ToolError {
    ToolError::descriptor(format!(
        "cannot parse {} as {format}: {err}",
        path.display()
    ))
}
