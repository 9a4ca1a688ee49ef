//! APM Segments - demo service with APM transaction tracing

use apm_segments::{config::Config, server::Server, telemetry, transaction::Application};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// APM Segments - HTTP service instrumented with APM transactions
#[derive(Parser, Debug)]
#[command(name = "apm-segments")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    if let Some(level) = args.log_level {
        config.telemetry.log_level = level;
        config.validate()?;
    }

    // Initialize logging
    let _telemetry = telemetry::init_subscriber(&config.telemetry)?;

    info!("Starting APM Segments v{}", apm_segments::VERSION);
    info!("Loaded configuration from {:?}", args.config);

    // A bad name/license pair stops startup here
    let app = Application::new(&config.apm)?;

    let mut server = Server::new(config.server, app)?;
    server.run().await?;

    Ok(())
}
