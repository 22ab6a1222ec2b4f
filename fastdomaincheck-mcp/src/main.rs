//! FastDomainCheck MCP server.
//!
//! Speaks the Model Context Protocol over stdio. Stdout carries protocol
//! frames only, so all logging goes to stderr.

mod health;
mod server;

use clap::Parser;
use fastdomaincheck_lib::{
    load_env_config, CheckConfig, ConfigManager, DomainChecker, FileConfig, WhoisRegistry,
};
use rmcp::transport::stdio;
use rmcp::ServiceExt;
use server::DomainServer;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fastdomaincheck-mcp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MCP server exposing bulk domain availability checks")]
struct Args {
    /// Enable the HTTP health check server
    #[arg(long = "health-check")]
    health_check: bool,

    /// Port for the health check server
    #[arg(long = "health-check-port", value_name = "PORT", default_value_t = 8080)]
    health_check_port: u16,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE")]
    config: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    if let Err(e) = run(args).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let checker = build_checker(args.config.as_deref())?;

    if args.health_check {
        health::spawn(args.health_check_port).await?;
    }

    let service = DomainServer::new(checker).serve(stdio()).await?;
    tracing::info!("FastDomainCheck MCP server running on stdio");
    service.waiting().await?;

    Ok(())
}

/// Config file (explicit or discovered), then environment variables.
fn build_checker(config_path: Option<&str>) -> Result<DomainChecker, Box<dyn std::error::Error>> {
    let manager = ConfigManager::new(false);
    let file_config = match config_path {
        Some(path) => manager.load_file(path)?,
        None => manager.discover_and_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "config discovery failed, using defaults");
            FileConfig::default()
        }),
    };

    let registry = file_config.registry(WhoisRegistry::builtin())?;
    let config = load_env_config(false).apply_to(file_config.apply_to(CheckConfig::default()));

    Ok(DomainChecker::with_config(config).with_registry(registry))
}
