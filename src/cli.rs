//! # Command Line Interface
//!
//! Entry point for the `gateway-discovery` binary: loads configuration, wires
//! the Kong admin client and catalog publisher into a [`DiscoveryAgent`], and
//! runs it until interrupted.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::catalog::{CatalogPublisher, HttpCatalogPublisher};
use crate::config::AgentConfig;
use crate::discovery::DiscoveryAgent;
use crate::filter::TagFilter;
use crate::gateway::{GatewayAdminClient, KongAdminClient};
use crate::observability::{init_observability, log_config_info};
use crate::{APP_NAME, VERSION};

#[derive(Parser, Debug)]
#[command(name = "gateway-discovery")]
#[command(about = "Discovers gateway APIs and publishes them to a catalog")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Run a single discovery pass and exit
    #[arg(long)]
    pub once: bool,

    /// Log level override (e.g. `debug`, `gateway_discovery=trace`)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the discovery loop (default)
    Run,

    /// Load and validate configuration, then print it with secrets redacted
    Validate,
}

/// Parse arguments and run the selected command
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AgentConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_agent(config, cli.once).await,
        Commands::Validate => validate(config),
    }
}

fn validate(mut config: AgentConfig) -> anyhow::Result<()> {
    TagFilter::new(&config.discovery.filter).context("Invalid discovery filter")?;

    redact(&mut config);
    let rendered = serde_yaml::to_string(&config).context("Failed to render configuration")?;
    println!("{}", rendered);
    println!("Configuration is valid");
    Ok(())
}

fn redact(config: &mut AgentConfig) {
    const REDACTED: &str = "<redacted>";
    if config.gateway.admin_token.is_some() {
        config.gateway.admin_token = Some(REDACTED.to_string());
    }
    if config.catalog.token.is_some() {
        config.catalog.token = Some(REDACTED.to_string());
    }
}

async fn run_agent(config: AgentConfig, once: bool) -> anyhow::Result<()> {
    init_observability(&config.observability).context("Failed to initialize observability")?;
    info!(app_name = APP_NAME, version = VERSION, "Starting gateway discovery agent");
    log_config_info(&config);

    let gateway: Arc<dyn GatewayAdminClient> =
        Arc::new(KongAdminClient::new(&config.gateway).context("Failed to create admin client")?);
    let publisher: Arc<dyn CatalogPublisher> = Arc::new(
        HttpCatalogPublisher::new(config.catalog.clone())
            .context("Failed to create catalog publisher")?,
    );

    let agent = DiscoveryAgent::new(config, gateway, publisher)
        .await
        .context("Discovery agent failed its startup checks")?;

    if once {
        let summary = agent.run_pass().await.context("Discovery pass failed")?;
        info!(
            pass_id = %summary.pass_id,
            published = summary.published,
            unchanged = summary.unchanged,
            "Single pass finished"
        );
        return Ok(());
    }

    agent
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    info!("Gateway discovery agent stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["gateway-discovery", "--config", "agent.yaml", "--once"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("agent.yaml")));
        assert!(cli.once);
        assert!(cli.command.is_none());

        let cli =
            Cli::try_parse_from(["gateway-discovery", "validate", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Validate));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_redact_hides_tokens() {
        let mut config = AgentConfig::default();
        config.gateway.admin_token = Some("secret".to_string());
        redact(&mut config);
        assert_eq!(config.gateway.admin_token.as_deref(), Some("<redacted>"));
        assert!(config.catalog.token.is_none());
    }
}
