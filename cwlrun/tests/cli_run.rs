//! CLI tests for the compiled `cwlrun` binary.
//!
//! Spawns the binary and verifies exit codes and printed payloads for the
//! run, render, and validate commands.

use std::fs;
use std::path::Path;
use std::process::Command;

use cwlrun::core::tool::Binding;
use cwlrun::core::value::InputValue;
use cwlrun::exit_codes;
use cwlrun::io::config::{ExecutorConfig, write_config};
use cwlrun::test_support::{inputs, positional_input, prefixed_input, tool};

fn write_json<T: serde::Serialize>(path: &Path, value: &T) {
    let payload = serde_json::to_string_pretty(value).expect("serialize");
    fs::write(path, payload).expect("write json");
}

fn cwlrun() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cwlrun"))
}

#[cfg(unix)]
#[test]
fn run_executes_a_tool_and_prints_the_result() {
    let temp = tempfile::tempdir().expect("tempdir");
    let tool_path = temp.path().join("echo.json");
    let inputs_path = temp.path().join("inputs.json");

    let mut descriptor = tool("echo");
    descriptor
        .inputs
        .insert("message".to_string(), positional_input(1));
    write_json(&tool_path, &descriptor);
    write_json(
        &inputs_path,
        &inputs(&[("message", InputValue::Str("Hello, CWL!".to_string()))]),
    );

    let output = cwlrun()
        .arg("run")
        .arg(&tool_path)
        .arg("--inputs")
        .arg(&inputs_path)
        .arg("--workdir")
        .arg(temp.path())
        .output()
        .expect("cwlrun run");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let payload: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("result payload");
    assert_eq!(payload["exit_code"], 0);
    assert!(
        payload["stdout"]
            .as_str()
            .expect("stdout field")
            .contains("Hello, CWL!")
    );
}

#[test]
fn render_prints_the_vector_without_executing() {
    let temp = tempfile::tempdir().expect("tempdir");
    let tool_path = temp.path().join("grep.json");
    let inputs_path = temp.path().join("inputs.json");

    let mut descriptor = tool("grep");
    descriptor.arguments.push(Binding {
        position: 0,
        value_from: Some(serde_json::Value::String("-n".to_string())),
        ..Binding::default()
    });
    descriptor
        .inputs
        .insert("pattern".to_string(), positional_input(1));
    descriptor
        .inputs
        .insert("invert".to_string(), prefixed_input(0, "-v"));
    write_json(&tool_path, &descriptor);
    write_json(
        &inputs_path,
        &inputs(&[
            ("pattern", InputValue::Str("test".to_string())),
            ("invert", InputValue::Bool(true)),
        ]),
    );

    let output = cwlrun()
        .arg("render")
        .arg(&tool_path)
        .arg("--inputs")
        .arg(&inputs_path)
        .output()
        .expect("cwlrun render");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let vector: Vec<String> = serde_json::from_slice(&output.stdout).expect("vector payload");
    assert_eq!(vector, vec!["grep", "-n", "-v", "test"]);
}

#[test]
fn validate_accepts_a_minimal_descriptor() {
    let temp = tempfile::tempdir().expect("tempdir");
    let tool_path = temp.path().join("ok.json");
    write_json(&tool_path, &tool("true"));

    let status = cwlrun()
        .arg("validate")
        .arg(&tool_path)
        .status()
        .expect("cwlrun validate");
    assert_eq!(status.code(), Some(exit_codes::OK));
}

#[test]
fn validate_rejects_a_wrong_class() {
    let temp = tempfile::tempdir().expect("tempdir");
    let tool_path = temp.path().join("wf.json");
    let mut descriptor = tool("true");
    descriptor.class = "Workflow".to_string();
    write_json(&tool_path, &descriptor);

    let status = cwlrun()
        .arg("validate")
        .arg(&tool_path)
        .status()
        .expect("cwlrun validate");
    assert_eq!(status.code(), Some(exit_codes::INVALID));
}

#[test]
fn run_maps_a_disabled_backend_to_the_unavailable_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let tool_path = temp.path().join("sandboxed.json");
    let config_path = temp.path().join("config.toml");

    let mut descriptor = tool("echo");
    descriptor.requirements.push(
        serde_json::from_value(serde_json::json!({
            "class": "DockerRequirement",
            "dockerPull": "alpine:3.20"
        }))
        .expect("requirement"),
    );
    write_json(&tool_path, &descriptor);
    write_config(
        &config_path,
        &ExecutorConfig {
            docker_enabled: false,
            ..ExecutorConfig::default()
        },
    )
    .expect("write config");

    let status = cwlrun()
        .arg("run")
        .arg(&tool_path)
        .arg("--workdir")
        .arg(temp.path())
        .arg("--config")
        .arg(&config_path)
        .status()
        .expect("cwlrun run");
    assert_eq!(status.code(), Some(exit_codes::UNAVAILABLE));
}
