use std::process::Command;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{Tool, ToolError, args_schema, parse_args};

/// Output from a shell command.
pub struct CmdOutput {
    /// Whether the command exited with status 0.
    pub success: bool,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl CmdOutput {
    /// stdout followed by stderr, trailing newline removed.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        out.push_str(&self.stderr);
        out.trim_end_matches('\n').to_string()
    }
}

/// Run a shell command via `sh -c` in a specific directory.
///
/// The directory applies to the child process only.
pub fn run_cmd_in_dir(dir_name: &str, cmd: &str) -> Result<CmdOutput, std::io::Error> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .current_dir(dir_name)
        .output()?;

    Ok(CmdOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct OpenTofuArgs {
    /// Directory to run the command in.
    pub directory_path: String,
    /// Arguments after the binary, e.g. `init` or `plan -out=tfplan`.
    pub command: String,
}

/// Runs `<binary> <command>` in the requested directory.
///
/// Success is judged by whether the command printed anything at all, not by
/// its exit status, so a quiet success reads as a failure and a noisy failure
/// reads as a success.
pub struct OpenTofu {
    binary: String,
}

impl OpenTofu {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

impl Tool for OpenTofu {
    fn name(&self) -> &'static str {
        "opentofu"
    }

    fn description(&self) -> &'static str {
        "Execute an OpenTofu command."
    }

    fn parameters(&self) -> Value {
        args_schema::<OpenTofuArgs>()
    }

    fn call(&self, arguments: &str) -> Result<String, ToolError> {
        let args: OpenTofuArgs = parse_args(arguments)?;
        let cmd = format!("{} {}", self.binary, args.command);
        info!(dir = %args.directory_path, %cmd, "opentofu: running");

        let output = run_cmd_in_dir(&args.directory_path, &cmd)?;
        let combined = output.combined();
        debug!(exit_ok = output.success, %combined, "opentofu: finished");

        if combined.is_empty() {
            Ok("OpenTofu command executed failed.".to_string())
        } else {
            Ok("OpenTofu command executed successfully.".to_string())
        }
    }
}
