//! Solar Dash backend server

use anyhow::Context;
use clap::Parser;
use solar_dash_core::{
    api::ApiServer,
    config::DashConfig,
    logging::init_logging,
    Engine,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "solar-dash")]
#[command(about = "Live-state backend for the Solar AI agent dashboard", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "SOLAR_DASH_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file
    #[arg(long, env = "SOLAR_DASH_ADDR")]
    addr: Option<SocketAddr>,

    /// Log level for the dashboard's own targets
    #[arg(short, long, env = "SOLAR_DASH_LOG")]
    log_level: Option<String>,

    /// Directory for rotating log files
    #[arg(long, env = "SOLAR_DASH_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<DashConfig> {
        let mut config = match &self.config {
            Some(path) => DashConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => DashConfig::default(),
        };

        if let Some(addr) = self.addr {
            config.server.addr = addr;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(dir) = &self.log_dir {
            config.logging.dir = Some(dir.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    let _log_guards = init_logging(&config.logging)?;

    info!("Starting Solar AI Agent Dashboard backend server");

    let engine = Arc::new(Engine::new(config.clone()));
    let handle = engine.start()?;

    let server = ApiServer::new(config.server.clone(), engine.clone());
    let served = server.serve(shutdown_signal()).await;

    info!("Shutting down monitoring services");
    for (task, summary) in handle.stop().await? {
        info!(
            task,
            cycles = summary.cycles,
            failures = summary.failures,
            "Task stopped"
        );
    }

    if let Err(e) = &served {
        error!("API server failed: {}", e);
    }
    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
