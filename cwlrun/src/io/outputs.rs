//! Output artifact resolution by glob matching.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::core::tool::{ToolDescriptor, is_expression};
use crate::error::ToolError;

/// Match declared output bindings against the output directory.
///
/// Each output binds to the first filesystem match of its first productive
/// pattern; an output whose patterns match nothing stays absent from the
/// mapping. Outputs without a binding are satisfied elsewhere (captured
/// stdout, for instance) and are skipped.
pub fn resolve_outputs(
    tool: &ToolDescriptor,
    output_dir: &Path,
) -> Result<BTreeMap<String, PathBuf>, ToolError> {
    let mut resolved = BTreeMap::new();

    for (id, output) in &tool.outputs {
        let Some(binding) = &output.binding else {
            continue;
        };
        if binding.output_eval.is_some() {
            return Err(ToolError::resolution(
                format!("output {id}: outputEval expressions are not supported"),
                None,
            ));
        }
        let patterns = glob_patterns(id, binding.glob.as_ref())?;
        if let Some(path) = first_match(id, output_dir, &patterns)? {
            resolved.insert(id.clone(), path);
        }
    }
    Ok(resolved)
}

fn glob_patterns(id: &str, glob: Option<&Value>) -> Result<Vec<String>, ToolError> {
    match glob {
        Some(Value::String(pattern)) if is_expression(pattern) => Err(ToolError::resolution(
            format!("output {id}: glob expressions are not supported"),
            None,
        )),
        Some(Value::String(pattern)) => Ok(vec![pattern.clone()]),
        Some(Value::Array(entries)) => {
            let mut patterns = Vec::with_capacity(entries.len());
            for entry in entries {
                match entry {
                    Value::String(pattern) if is_expression(pattern) => {
                        return Err(ToolError::resolution(
                            format!("output {id}: glob expressions are not supported"),
                            None,
                        ));
                    }
                    Value::String(pattern) => patterns.push(pattern.clone()),
                    _ => {
                        return Err(ToolError::resolution(
                            format!("output {id}: glob entries must be literal strings"),
                            None,
                        ));
                    }
                }
            }
            Ok(patterns)
        }
        _ => Err(ToolError::resolution(
            format!("output {id}: glob must be a literal string or a list of literal strings"),
            None,
        )),
    }
}

fn first_match(
    id: &str,
    output_dir: &Path,
    patterns: &[String],
) -> Result<Option<PathBuf>, ToolError> {
    for pattern in patterns {
        let full = output_dir.join(pattern);
        let full = full.to_str().ok_or_else(|| {
            ToolError::resolution(format!("output {id}: glob path is not valid UTF-8"), None)
        })?;
        let entries = glob::glob(full).map_err(|err| {
            ToolError::resolution(
                format!("output {id}: malformed glob pattern {pattern:?}"),
                Some(err),
            )
        })?;
        for entry in entries {
            match entry {
                Ok(path) => {
                    debug!(output = id, path = %path.display(), "output resolved");
                    return Ok(Some(path));
                }
                Err(err) => {
                    return Err(ToolError::io(
                        format!("output {id}: cannot read glob match"),
                        err.into_error(),
                    ));
                }
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::test_support::{glob_output, tool};

    fn output_dir_with(files: &[&str]) -> tempfile::TempDir {
        let temp = tempfile::tempdir().expect("tempdir");
        for name in files {
            fs::write(temp.path().join(name), "content").expect("write output file");
        }
        temp
    }

    #[test]
    fn literal_glob_resolves_to_the_absolute_path() {
        let dir = output_dir_with(&["output.txt"]);
        let mut descriptor = tool("echo");
        descriptor
            .outputs
            .insert("result".to_string(), glob_output("output.txt"));

        let resolved = resolve_outputs(&descriptor, dir.path()).expect("resolve");
        let path = resolved.get("result").expect("result bound");
        assert!(path.is_absolute());
        assert_eq!(path, &dir.path().join("output.txt"));
    }

    #[test]
    fn zero_matches_leave_the_output_absent() {
        let dir = output_dir_with(&[]);
        let mut descriptor = tool("echo");
        descriptor
            .outputs
            .insert("result".to_string(), glob_output("output.txt"));

        let resolved = resolve_outputs(&descriptor, dir.path()).expect("resolve");
        assert!(resolved.is_empty());
    }

    #[test]
    fn wildcard_binds_the_first_match_in_enumeration_order() {
        let dir = output_dir_with(&["b.log", "a.log"]);
        let mut descriptor = tool("echo");
        descriptor
            .outputs
            .insert("logs".to_string(), glob_output("*.log"));

        let resolved = resolve_outputs(&descriptor, dir.path()).expect("resolve");
        assert_eq!(resolved["logs"], dir.path().join("a.log"));
    }

    #[test]
    fn pattern_list_uses_the_first_productive_pattern() {
        let dir = output_dir_with(&["fallback.txt"]);
        let mut descriptor = tool("echo");
        let mut output = glob_output("preferred.txt");
        output.binding.as_mut().expect("binding").glob = Some(serde_json::json!([
            "preferred.txt",
            "fallback.txt"
        ]));
        descriptor.outputs.insert("result".to_string(), output);

        let resolved = resolve_outputs(&descriptor, dir.path()).expect("resolve");
        assert_eq!(resolved["result"], dir.path().join("fallback.txt"));
    }

    #[test]
    fn outputs_without_bindings_are_skipped() {
        let dir = output_dir_with(&[]);
        let mut descriptor = tool("echo");
        descriptor.outputs.insert(
            "captured".to_string(),
            crate::core::tool::OutputParameter::default(),
        );

        let resolved = resolve_outputs(&descriptor, dir.path()).expect("resolve");
        assert!(resolved.is_empty());
    }

    #[test]
    fn malformed_pattern_is_fatal_with_a_cause() {
        let dir = output_dir_with(&[]);
        let mut descriptor = tool("echo");
        descriptor
            .outputs
            .insert("bad".to_string(), glob_output("a[invalid"));

        let err = resolve_outputs(&descriptor, dir.path()).unwrap_err();
        assert_eq!(err.code(), "resolution");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn non_literal_glob_shape_is_a_resolution_error() {
        let dir = output_dir_with(&[]);
        let mut descriptor = tool("echo");
        let mut output = glob_output("x");
        output.binding.as_mut().expect("binding").glob = Some(serde_json::json!({"glob": "x"}));
        descriptor.outputs.insert("bad".to_string(), output);

        let err = resolve_outputs(&descriptor, dir.path()).unwrap_err();
        assert_eq!(err.code(), "resolution");
    }

    #[test]
    fn glob_expression_is_rejected() {
        let dir = output_dir_with(&[]);
        let mut descriptor = tool("echo");
        descriptor
            .outputs
            .insert("bad".to_string(), glob_output("$(inputs.name)"));

        let err = resolve_outputs(&descriptor, dir.path()).unwrap_err();
        assert_eq!(err.code(), "resolution");
        assert!(err.to_string().contains("expression"));
    }

    #[test]
    fn output_eval_is_rejected() {
        let dir = output_dir_with(&["output.txt"]);
        let mut descriptor = tool("echo");
        let mut output = glob_output("output.txt");
        output.binding.as_mut().expect("binding").output_eval =
            Some(Value::String("$(self[0].contents)".to_string()));
        descriptor.outputs.insert("bad".to_string(), output);

        let err = resolve_outputs(&descriptor, dir.path()).unwrap_err();
        assert_eq!(err.code(), "resolution");
        assert!(err.to_string().contains("outputEval"));
    }
}
