// crates/phoneflow-cli/src/main.rs
// ============================================================================
// Module: PhoneFlow CLI Entry Point
// Description: Command dispatcher for the PhoneFlow gateway.
// Purpose: Start the HTTP gateway and validate configuration files.
// Dependencies: clap, phoneflow-config, phoneflow-gateway, thiserror, tokio, tracing
// ============================================================================

//! ## Overview
//! `phoneflow serve` loads configuration, installs the tracing subscriber,
//! and runs the gateway until Ctrl-C. `phoneflow config validate` loads and
//! validates a configuration file without starting anything. Running with no
//! subcommand prints help.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use phoneflow_config::PhoneflowConfig;
use phoneflow_gateway::GatewayServer;
use phoneflow_gateway::init_tracing;
use thiserror::Error;
use tracing::info;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "phoneflow", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the PhoneFlow HTTP gateway.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to phoneflow.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Serve from the relational store regardless of `database.enabled`.
    #[arg(long, action = ArgAction::SetTrue)]
    use_database: bool,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a PhoneFlow configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to phoneflow.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("phoneflow {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command,
        } => command_config(command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config_path = command.config.clone();
    let config = tokio::task::spawn_blocking(move || load_config(config_path.as_deref()))
        .await
        .map_err(|err| CliError::new(format!("config load join failed: {err}")))??;
    let config = apply_serve_overrides(config, &command)?;
    init_tracing(&config.logging.filter)
        .map_err(|err| CliError::new(format!("failed to initialize logging: {err}")))?;
    info!(
        bind = %config.server.bind,
        database_enabled = config.database.enabled,
        "starting phoneflow gateway"
    );

    let server = tokio::task::spawn_blocking(move || GatewayServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("gateway init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("failed to initialize gateway: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("gateway failed: {err}")))?;

    Ok(ExitCode::SUCCESS)
}

/// Applies `serve` flags on top of the loaded configuration.
fn apply_serve_overrides(
    mut config: PhoneflowConfig,
    command: &ServeCommand,
) -> CliResult<PhoneflowConfig> {
    if command.use_database {
        config.database.enabled = true;
        config.validate().map_err(|err| CliError::new(format!("invalid config: {err}")))?;
    }
    Ok(config)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let backend = if config.database.enabled { "relational" } else { "fallback" };
    write_stdout_line(&format!("config ok (backend: {backend}, bind: {})", config.server.bind))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Loads and validates configuration.
fn load_config(path: Option<&Path>) -> CliResult<PhoneflowConfig> {
    PhoneflowConfig::load(path).map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let help = Cli::command().render_help().to_string();
    write_stdout_line(&help).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
