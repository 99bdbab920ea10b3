//! Descriptor builders shared by unit and integration tests.

use indexmap::IndexMap;
use serde_json::Value;

use crate::core::tool::{
    BaseCommand, Binding, InputParameter, OutputBinding, OutputParameter, ToolDescriptor,
};
use crate::core::value::InputValue;

/// Minimal valid descriptor around a single-token base command.
pub fn tool(base: &str) -> ToolDescriptor {
    ToolDescriptor {
        cwl_version: "v1.2".to_string(),
        class: "CommandLineTool".to_string(),
        base_command: BaseCommand::Single(base.to_string()),
        id: None,
        label: None,
        doc: None,
        inputs: IndexMap::new(),
        outputs: IndexMap::new(),
        requirements: Vec::new(),
        arguments: Vec::new(),
        stdin: None,
        stdout: None,
        stderr: None,
        success_codes: Vec::new(),
        temporary_fail_codes: Vec::new(),
        permanent_fail_codes: Vec::new(),
    }
}

/// Input parameter bound at `position` with no prefix.
pub fn positional_input(position: i32) -> InputParameter {
    InputParameter {
        binding: Some(Binding {
            position,
            ..Binding::default()
        }),
        ..InputParameter::default()
    }
}

/// Input parameter bound at `position` behind `prefix`.
pub fn prefixed_input(position: i32, prefix: &str) -> InputParameter {
    InputParameter {
        binding: Some(Binding {
            position,
            prefix: Some(prefix.to_string()),
            ..Binding::default()
        }),
        ..InputParameter::default()
    }
}

/// Output parameter bound to a literal glob pattern.
pub fn glob_output(pattern: &str) -> OutputParameter {
    OutputParameter {
        binding: Some(OutputBinding {
            glob: Some(Value::String(pattern.to_string())),
            ..OutputBinding::default()
        }),
        ..OutputParameter::default()
    }
}

/// Input map from literal entries, in the given order.
pub fn inputs(entries: &[(&str, InputValue)]) -> IndexMap<String, InputValue> {
    entries
        .iter()
        .map(|(id, value)| ((*id).to_string(), value.clone()))
        .collect()
}
