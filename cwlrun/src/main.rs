//! Execute CWL CommandLineTool descriptions from the command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;

use cwlrun::core::render::render_command_line;
use cwlrun::core::value::InputValue;
use cwlrun::error::ToolError;
use cwlrun::execute::{ExecuteOptions, Executor};
use cwlrun::exit_codes;
use cwlrun::io::config::{ExecutorConfig, load_config};
use cwlrun::io::descriptor::{load_inputs, load_tool};
use cwlrun::logging;

#[derive(Parser)]
#[command(
    name = "cwlrun",
    version,
    about = "Execute CWL CommandLineTool descriptions"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a tool against an input set and print the result as JSON.
    Run {
        /// Tool descriptor file (JSON or YAML).
        tool: PathBuf,
        /// Input values file (JSON or YAML mapping of input id to value).
        #[arg(short, long)]
        inputs: Option<PathBuf>,
        /// Working directory for the tool process.
        #[arg(short, long)]
        workdir: Option<PathBuf>,
        /// Kill the tool after this many seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Executor configuration file (TOML).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the argument vector a tool would run, without executing it.
    Render {
        /// Tool descriptor file (JSON or YAML).
        tool: PathBuf,
        /// Input values file (JSON or YAML mapping of input id to value).
        #[arg(short, long)]
        inputs: Option<PathBuf>,
    },
    /// Check that a descriptor parses and meets the minimum contract.
    Validate {
        /// Tool descriptor file (JSON or YAML).
        tool: PathBuf,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            tool,
            inputs,
            workdir,
            timeout_secs,
            config,
        } => cmd_run(
            &tool,
            inputs.as_deref(),
            workdir,
            timeout_secs,
            config.as_deref(),
        ),
        Command::Render { tool, inputs } => cmd_render(&tool, inputs.as_deref()),
        Command::Validate { tool } => cmd_validate(&tool),
    }
}

fn cmd_run(
    tool_path: &Path,
    inputs_path: Option<&Path>,
    workdir: Option<PathBuf>,
    timeout_secs: Option<u64>,
    config_path: Option<&Path>,
) -> Result<i32> {
    let config = match config_path {
        Some(path) => load_config(path).context("load executor config")?,
        None => ExecutorConfig::default(),
    };

    let outcome = (|| {
        let tool = load_tool(tool_path)?;
        let inputs = load_optional_inputs(inputs_path)?;
        let options = ExecuteOptions {
            working_dir: workdir,
            timeout: timeout_secs.map(Duration::from_secs),
            ..ExecuteOptions::default()
        };
        Executor::new(config).execute(&tool, &inputs, &options)
    })();

    match outcome {
        Ok(result) => {
            let mut payload =
                serde_json::to_string_pretty(&result).context("serialize execute result")?;
            payload.push('\n');
            print!("{payload}");
            Ok(exit_codes::OK)
        }
        Err(err) => Ok(report(err)),
    }
}

fn cmd_render(tool_path: &Path, inputs_path: Option<&Path>) -> Result<i32> {
    let outcome = (|| {
        let tool = load_tool(tool_path)?;
        let inputs = load_optional_inputs(inputs_path)?;
        render_command_line(&tool, &inputs)
    })();

    match outcome {
        Ok(argv) => {
            let payload = serde_json::to_string(&argv).context("serialize argument vector")?;
            println!("{payload}");
            Ok(exit_codes::OK)
        }
        Err(err) => Ok(report(err)),
    }
}

fn cmd_validate(tool_path: &Path) -> Result<i32> {
    match load_tool(tool_path) {
        Ok(_) => {
            println!("{} is a valid CommandLineTool", tool_path.display());
            Ok(exit_codes::OK)
        }
        Err(err) => Ok(report(err)),
    }
}

fn load_optional_inputs(path: Option<&Path>) -> Result<IndexMap<String, InputValue>, ToolError> {
    match path {
        Some(path) => load_inputs(path),
        None => Ok(IndexMap::new()),
    }
}

/// Print a classified engine error and map it to a stable exit code.
fn report(err: ToolError) -> i32 {
    let code = exit_codes::for_error(&err);
    eprintln!("error[{}]: {:#}", err.code(), anyhow::Error::new(err));
    code
}
