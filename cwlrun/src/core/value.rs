//! Closed input-value model.
//!
//! The set of accepted shapes is closed so that rendering can match
//! exhaustively; anything else lands in [`InputValue::Other`] and surfaces
//! as a typed render failure naming the concrete shape, never a silent
//! default-case fallthrough.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Concrete input value supplied for one tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    File(FileRef),
    /// Any other JSON shape. Kept so the offending value can be named in
    /// the render error.
    Other(Value),
}

impl InputValue {
    /// Human-readable name of the concrete shape, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            InputValue::Bool(_) => "boolean",
            InputValue::Int(_) => "integer",
            InputValue::Float(_) => "number",
            InputValue::Str(_) => "string",
            InputValue::File(_) => "File record",
            InputValue::Other(Value::Null) => "null",
            InputValue::Other(Value::Array(_)) => "array",
            InputValue::Other(Value::Object(_)) => "object",
            InputValue::Other(_) => "unsupported scalar",
        }
    }
}

/// File-like record: a `class` marker plus the `path` substituted on the
/// command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl FileRef {
    /// A `File`-classed record pointing at `path`.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            class: "File".to_string(),
            path: Some(path.into()),
            location: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> InputValue {
        serde_json::from_str(raw).expect("parse input value")
    }

    #[test]
    fn scalars_take_their_natural_variant() {
        assert_eq!(parse("true"), InputValue::Bool(true));
        assert_eq!(parse("42"), InputValue::Int(42));
        assert_eq!(parse("2.5"), InputValue::Float(2.5));
        assert_eq!(parse(r#""hello""#), InputValue::Str("hello".to_string()));
    }

    #[test]
    fn class_marked_objects_parse_as_file_records() {
        let value = parse(r#"{"class": "File", "path": "data/reads.fq"}"#);
        assert_eq!(value, InputValue::File(FileRef::file("data/reads.fq")));
    }

    #[test]
    fn file_record_path_is_optional_at_parse_time() {
        let value = parse(r#"{"class": "File"}"#);
        match value {
            InputValue::File(file) => assert!(file.path.is_none()),
            other => panic!("expected File record, got {}", other.kind_name()),
        }
    }

    #[test]
    fn unmarked_objects_and_arrays_fall_through_to_other() {
        assert_eq!(parse(r#"{"path": "x"}"#).kind_name(), "object");
        assert_eq!(parse("[1, 2]").kind_name(), "array");
        assert_eq!(parse("null").kind_name(), "null");
    }
}
