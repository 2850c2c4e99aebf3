//! envbind-util: inspect and document the service's environment configuration.

use clap::{Parser, Subcommand};
use envbind::{AppConfig, Bind, ProcessEnv, format_bind_error, write_docs};
use std::{path::PathBuf, process::ExitCode};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "envbind-util", about = "Check and document environment configuration")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bind the configuration from the environment and print it
    Check {
        /// Load this file into the environment first instead of `.env`
        #[arg(long)]
        env_file: Option<PathBuf>,
    },
    /// Write a Markdown reference of every environment variable
    Docs {
        #[arg(long, short, default_value = "CONFIG.md")]
        output: PathBuf,
    },
    /// List the bound fields with their kind and default
    Fields,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Check { env_file } => check(env_file),
        Command::Docs { output } => docs(output),
        Command::Fields => {
            show_fields();
            ExitCode::SUCCESS
        }
    }
}

fn check(env_file: Option<PathBuf>) -> ExitCode {
    let result = match env_file {
        Some(path) => {
            if let Err(err) = dotenvy::from_path(&path) {
                eprintln!("✗ Failed to load {}: {}", path.display(), err);
                return ExitCode::FAILURE;
            }
            AppConfig::bind_from(&ProcessEnv)
        }
        None => AppConfig::from_env(),
    };

    match result {
        Ok(config) => {
            println!("Config bound successfully!");
            println!("  HTTP_PORT:        {}", config.http_port);
            println!("  HTTP_API_VERSION: {}", config.http_api_version);
            println!("  PB_PORT:          {}", config.pb_port);
            println!("  PB_API_VERSION:   {}", config.pb_api_version);
            println!("  DB_CONN_STRING:   {}", config.redacted_conn_string());
            println!("  STATSD_PREFIX:    {}", config.statsd_prefix);
            println!("  STATSD_ADDRESS:   {}", config.statsd_address);
            println!("  STATSD_INTERVAL:  {}s", config.statsd_interval.as_secs());
            println!("  STATSD_ENABLED:   {}", config.statsd_enabled);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", format_bind_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn docs(output: PathBuf) -> ExitCode {
    match write_docs(&AppConfig::fields(), &output) {
        Ok(()) => {
            println!("✓ Documentation written to {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Failed to write documentation: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn show_fields() {
    for field in AppConfig::fields() {
        let descriptor = field.descriptor;
        println!("{}:", descriptor.key);
        println!("    kind: {}", field.kind);
        println!("    required: {}", descriptor.required());
        if !descriptor.default.is_empty() {
            println!("    default: {}", descriptor.default);
        }
        if !descriptor.description.is_empty() {
            println!("    description: {}", descriptor.description);
        }
    }
}
