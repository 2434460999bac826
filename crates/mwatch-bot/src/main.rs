//! Multiplier watch bot - Entry Point

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Multiplier watch bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "MWATCH_CONFIG", default_value = "config/default.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    mwatch_telemetry::init_logging()?;

    info!("Starting mwatch bot v{}", env!("CARGO_PKG_VERSION"));
    info!(config_path = %args.config, "Loading configuration");

    let config = mwatch_bot::AppConfig::from_file(&args.config)?;
    info!(
        port = config.dashboard.port,
        driver = %config.driver.base_url,
        "Configuration loaded"
    );

    let app = mwatch_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
