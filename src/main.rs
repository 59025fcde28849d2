//! quakemon: replay a saved USGS summary feed and print the resulting
//! statistics and forecast as JSON.
//!
//! Usage: `quakemon_service <feed.geojson> [config.toml]`

use std::error::Error;

use quakemon_service::config::{MonitorConfig, load_config};
use quakemon_service::logging::{self, Component};
use quakemon_service::monitor::QuakeMonitor;
use quakemon_service::replay::replay_feed_file;

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let Some(feed_path) = args.next() else {
        eprintln!("Usage: quakemon_service <feed.geojson> [config.toml]");
        std::process::exit(2);
    };

    let mut config = match args.next() {
        Some(path) => load_config(path)?,
        None => MonitorConfig::default(),
    };
    config.apply_env_overrides()?;

    logging::init_logger(config.log_level(), config.log_file.as_deref(), true);
    logging::info(
        Component::System,
        None,
        &format!(
            "Starting with history {} / forecast {}h / radius {} km",
            config.max_history, config.forecast_hours, config.cluster_radius_km
        ),
    );

    let mut monitor = QuakeMonitor::new(config);
    let summary = replay_feed_file(&mut monitor, &feed_path)?;
    logging::info(
        Component::System,
        None,
        &format!(
            "Replay done: {} accepted, {} duplicates, {} skipped",
            summary.accepted, summary.duplicates, summary.skipped
        ),
    );

    println!("{}", serde_json::to_string_pretty(&monitor.stats())?);
    Ok(())
}
