use std::fs::OpenOptions;
use std::path::Path;
use std::rc::Rc;
use std::sync::Mutex;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{Level, info};

use tofumatic::cli::Cli;
use tofumatic::config::{self, Config};
use tofumatic::{OpenAiClient, Session, Terminal, ToolRegistry};

fn setup_logging(path: &Path, level: Level) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {})", level);
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let env_file = Cli::env_file_from_args(&args);
    let loaded = config::load_env_file(&env_file).context("Failed to read env file")?;

    let cli = Cli::parse_from(&args);
    setup_logging(&cli.log_file, config::log_level(cli.log_level.as_deref())).context("Failed to setup logging")?;
    if loaded {
        info!("Loaded environment from {}", env_file.display());
    }

    let registry = Rc::new(ToolRegistry::standard(cli.tofu_bin.as_str()).context("Failed to build tool registry")?);
    if cli.list_tools {
        for definition in registry.definitions() {
            println!("{}", serde_json::to_string_pretty(&definition.to_function_spec())?);
        }
        return Ok(());
    }

    let config = Config::from_cli(&cli).context("Failed to load configuration")?;
    info!(
        "tofumatic starting: base_url={}, refiner={}, model={}, tofu={}",
        config.base_url, config.models.refiner, config.models.planner, config.tofu_bin
    );

    let client = Rc::new(OpenAiClient::new(&config.base_url, &config.api_key, config.timeout));
    let console = Terminal::new().context("Failed to open terminal")?;
    let mut session =
        Session::new(client, registry, &config.models, console).context("Failed to assemble workflow")?;

    println!("{}", "tofumatic: describe the OpenTofu change you want. Type 'exit' to quit.".cyan());
    session.run(cli.request.clone()).context("Console failed")?;
    info!("tofumatic exiting");
    Ok(())
}
