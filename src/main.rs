//! EduToon command line entry point

use clap::{Parser, Subcommand};
use edutoon::config::{AppConfig, ConfigError};
use edutoon::observability::init_logging_with_verbosity;
use edutoon::pipeline::EduToon;
use edutoon::server;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Learn concepts through comics
#[derive(Parser)]
#[command(name = "edutoon")]
#[command(about = "Explain a concept from Wikipedia and draw it as a three-panel comic")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "EDUTOON_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web UI
    Serve,
    /// Explain one concept and print the explanation and comic as JSON
    Explain {
        /// Concept to explain, e.g. "Ohm's law"
        concept: String,
    },
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging_with_verbosity(cli.verbose);

    info!("Starting EduToon v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve => run_server(config).await,
        Commands::Explain { concept } => explain_once(config, &concept).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_configuration(config_path: &Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    let (config, source) = AppConfig::discover(config_path.as_deref(), Path::new("."))?;

    match source {
        Some(path) => info!("Loaded configuration from: {}", path.display()),
        None => warn!("No configuration file found, using built-in defaults"),
    }

    Ok(config)
}

async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = resolve_bind_address(&config.server.host, config.server.port).await?;
    let app = Arc::new(EduToon::from_config(&config)?);

    server::serve(app, addr, shutdown_signal()).await?;
    info!("Application shutdown complete");
    Ok(())
}

async fn resolve_bind_address(
    host: &str,
    port: u16,
) -> Result<SocketAddr, Box<dyn std::error::Error>> {
    tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| format!("Could not resolve bind address {host}:{port}").into())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let (mut sigint, mut sigterm) = match (
        signal::unix::signal(signal::unix::SignalKind::interrupt()),
        signal::unix::signal(signal::unix::SignalKind::terminate()),
    ) {
        (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to install signal handlers: {}", e);
            std::future::pending::<()>().await;
            return;
        }
    };

    tokio::select! {
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

async fn explain_once(config: AppConfig, concept: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = EduToon::from_config(&config)?;

    let explanation = app.explain(concept).await?;
    let comic = app.comic(concept).await?;

    let output = serde_json::json!({
        "explanation": explanation,
        "comic": comic,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn handle_config_command(config: AppConfig, show: bool) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
    }

    for (name, present) in [
        (&config.summarizer.api_key_env, config.get_summarizer_api_key().is_some()),
        (&config.llm.api_key_env, config.get_llm_api_key().is_ok()),
        (&config.images.api_key_env, config.get_images_api_key().is_ok()),
    ] {
        if present {
            info!("{} is set", name);
        } else {
            warn!("{} is not set", name);
        }
    }

    info!("Configuration validation complete");
    Ok(())
}
