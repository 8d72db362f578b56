//! Command-line arguments for tofumatic

use std::path::PathBuf;

use clap::{CommandFactory, Parser};

#[derive(Parser, Debug, Clone)]
#[command(name = "tofumatic")]
#[command(author, version, about = "Plan and apply OpenTofu changes with an LLM, one confirmed tool call at a time", long_about = None)]
pub struct Cli {
    /// API key for the chat-completion endpoint
    #[arg(long, env = "XAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "TOFUMATIC_BASE_URL", default_value = "https://api.x.ai/v1")]
    pub base_url: String,

    /// Model used to refine the request
    #[arg(long, default_value = "grok-4-0709")]
    pub prompt_model: String,

    /// Model used to plan and execute
    #[arg(short, long, default_value = "grok-code-fast-1")]
    pub model: String,

    /// OpenTofu executable
    #[arg(long, env = "TOFU_BIN", default_value = "tofu")]
    pub tofu_bin: String,

    /// Log file (appended to)
    #[arg(long, default_value = "tofumatic.log")]
    pub log_file: PathBuf,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Dotenv file read before the environment fallbacks
    #[arg(long, default_value = ".env.secure")]
    pub env_file: PathBuf,

    /// Request timeout in seconds (no timeout when unset)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Print the tool schemas and exit
    #[arg(long)]
    pub list_tools: bool,

    /// First request to run before the interactive prompt
    pub request: Option<String>,
}

impl Cli {
    /// Path of `--env-file` as given on the command line, so the file can be
    /// loaded before the full parse reads the environment. Parse errors are
    /// left for the full parse to report.
    pub fn env_file_from_args(args: &[String]) -> PathBuf {
        Self::command()
            .ignore_errors(true)
            .try_get_matches_from(args)
            .ok()
            .and_then(|matches| matches.get_one::<PathBuf>("env_file").cloned())
            .unwrap_or_else(|| PathBuf::from(".env.secure"))
    }
}
