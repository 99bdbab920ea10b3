//! Command-line synthesis: descriptor plus resolved inputs to a flat
//! argument vector.
//!
//! Rendering is pure and deterministic. Fragments are tagged with their
//! declared position and stable-sorted, so ties resolve to declaration
//! order: static arguments first (in list order), then bound inputs (in
//! descriptor order). Arguments and inputs share one position space.

use indexmap::IndexMap;
use serde_json::Value;

use crate::core::tool::{BaseCommand, Binding, InputParameter, ToolDescriptor, is_expression};
use crate::core::value::InputValue;
use crate::error::ToolError;

/// Rendered fragment tagged with its sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArgument {
    pub sort_key: i32,
    pub tokens: Vec<String>,
}

/// Build the flat argument vector for one invocation.
///
/// Fails without producing a partial vector; the error names the offending
/// argument or input.
pub fn render_command_line(
    tool: &ToolDescriptor,
    inputs: &IndexMap<String, InputValue>,
) -> Result<Vec<String>, ToolError> {
    let mut vector = base_tokens(tool)?;

    let mut fragments: Vec<RenderedArgument> = Vec::new();
    for (index, argument) in tool.arguments.iter().enumerate() {
        fragments.push(render_argument(index, argument)?);
    }
    for (id, parameter) in &tool.inputs {
        let Some(binding) = &parameter.binding else {
            continue;
        };
        if let Some(fragment) = render_input(id, parameter, binding, inputs)? {
            fragments.push(fragment);
        }
    }

    // Vec::sort_by_key is stable; declaration order survives key ties.
    fragments.sort_by_key(|fragment| fragment.sort_key);

    for fragment in fragments {
        vector.extend(
            fragment
                .tokens
                .into_iter()
                .filter(|token| !token.is_empty()),
        );
    }
    Ok(vector)
}

fn base_tokens(tool: &ToolDescriptor) -> Result<Vec<String>, ToolError> {
    if tool.base_command.is_empty() {
        return Err(ToolError::descriptor("base command must not be empty"));
    }
    Ok(match &tool.base_command {
        BaseCommand::Single(token) => vec![token.clone()],
        BaseCommand::Tokens(tokens) => tokens.clone(),
    })
}

/// Render one static argument: a literal `valueFrom`, a bare prefix, or both.
fn render_argument(index: usize, argument: &Binding) -> Result<RenderedArgument, ToolError> {
    let value = match &argument.value_from {
        Some(Value::String(text)) if is_expression(text) => {
            return Err(ToolError::render(format!(
                "argument {index}: valueFrom expressions are not supported"
            )));
        }
        Some(Value::String(text)) => Some(text.clone()),
        Some(other) => {
            return Err(ToolError::render(format!(
                "argument {index}: valueFrom must be a literal string, got {}",
                json_kind(other)
            )));
        }
        None => None,
    };

    let tokens = match (effective_prefix(argument), value) {
        (Some(prefix), Some(value)) => combine(prefix, &value, argument.separate_tokens()),
        (Some(prefix), None) => vec![prefix.to_string()],
        (None, Some(value)) => vec![value],
        (None, None) => {
            return Err(ToolError::render(format!(
                "argument {index} carries neither a prefix nor a value"
            )));
        }
    };

    Ok(RenderedArgument {
        sort_key: argument.position,
        tokens,
    })
}

/// Render one bound input. Returns `None` when the binding is suppressed
/// (a false boolean contributes nothing).
fn render_input(
    id: &str,
    parameter: &InputParameter,
    binding: &Binding,
    inputs: &IndexMap<String, InputValue>,
) -> Result<Option<RenderedArgument>, ToolError> {
    if let Some(value_from) = &binding.value_from {
        reject_non_literal(id, value_from)?;
    }

    let value = match inputs.get(id).or(parameter.default.as_ref()) {
        Some(value) => value,
        None => {
            return Err(ToolError::descriptor(format!(
                "missing required input: {id}"
            )));
        }
    };

    // A false boolean suppresses the whole binding; a true one keeps only
    // the prefix (or nothing, when the binding has none).
    let rendered = match value {
        InputValue::Bool(false) => return Ok(None),
        InputValue::Bool(true) => None,
        InputValue::Str(text) => Some(text.clone()),
        InputValue::Int(number) => Some(number.to_string()),
        InputValue::Float(number) => Some(number.to_string()),
        InputValue::File(file) => {
            if file.class != "File" {
                return Err(ToolError::render(format!(
                    "unsupported record class {:?} for input {id}",
                    file.class
                )));
            }
            match &file.path {
                Some(path) => Some(path.clone()),
                None => {
                    return Err(ToolError::render(format!(
                        "File input {id} is missing a path"
                    )));
                }
            }
        }
        InputValue::Other(_) => {
            return Err(ToolError::render(format!(
                "unsupported value shape for input {id}: {}",
                value.kind_name()
            )));
        }
    };

    let tokens = match (effective_prefix(binding), rendered) {
        (Some(prefix), Some(value)) => combine(prefix, &value, binding.separate_tokens()),
        (Some(prefix), None) => vec![prefix.to_string()],
        (None, Some(value)) => vec![value],
        (None, None) => Vec::new(),
    };

    Ok(Some(RenderedArgument {
        sort_key: binding.position,
        tokens,
    }))
}

fn reject_non_literal(id: &str, value_from: &Value) -> Result<(), ToolError> {
    match value_from {
        Value::String(text) if is_expression(text) => Err(ToolError::render(format!(
            "input {id}: valueFrom expressions are not supported"
        ))),
        Value::String(_) => Ok(()),
        other => Err(ToolError::render(format!(
            "input {id}: valueFrom must be a literal string, got {}",
            json_kind(other)
        ))),
    }
}

fn combine(prefix: &str, value: &str, separate: bool) -> Vec<String> {
    if separate {
        vec![prefix.to_string(), value.to_string()]
    } else {
        vec![format!("{prefix}{value}")]
    }
}

fn effective_prefix(binding: &Binding) -> Option<&str> {
    binding.prefix.as_deref().filter(|prefix| !prefix.is_empty())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
