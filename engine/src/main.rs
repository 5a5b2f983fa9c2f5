// Stride running coach engine
// Main entry point for the stride binary

use clap::Parser;
use stride_engine::cli::{Cli, Command};
use stride_engine::config::Config;
use stride_engine::handlers::{
    handle_doctor, handle_history, handle_plan, handle_seed, plan_request_from_args, OutputFormat,
};
use stride_engine::telemetry::{init_telemetry, init_telemetry_with_level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize basic telemetry first (before config is loaded)
    init_telemetry();

    tracing::info!("Stride Engine v{}", env!("CARGO_PKG_VERSION"));

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // Re-initialize telemetry with config-driven log level
    // (only takes effect if RUST_LOG env var is not set)
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    match cli.command {
        Command::Plan {
            message,
            distance_km,
            goal_time,
            goal_date,
            notes,
            days,
            long_run_day,
            strength,
        } => {
            let request = plan_request_from_args(
                message,
                distance_km,
                goal_time,
                goal_date,
                notes,
                days,
                long_run_day,
                strength,
            )?;
            handle_plan(request, &config, format).await
        }

        Command::Seed { count } => handle_seed(count, &config).await,

        Command::History { limit } => handle_history(limit, &config, format).await,

        Command::Doctor => handle_doctor(&config).await,
    }
}
