//! # Pet Scout Main Driver
//!
//! ## Purpose
//! Main entry point for the sighting board server. Loads configuration, starts
//! the background expiry sweeper, and runs the web server for handling sighting
//! and search requests.
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Create the report store
//! 4. Spawn the background expiry sweeper
//! 5. Start the web API server
//! 6. Handle shutdown signals gracefully

use clap::{Arg, Command};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use pet_scout::{
    api::ApiServer,
    config::Config,
    errors::{Result, ScoutError},
    store::ReportStore,
    sweeper, AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("pet-scout-server")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Pet Scout Team")
        .about("In-memory sighting board for crowdsourced cross-server pet scouting")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Server port")
                .value_parser(clap::value_parser!(u16)),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").unwrap();
    let mut config = Config::from_file(config_path)?;

    // CLI takes precedence over file and environment
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }

    let config = Arc::new(config);

    init_logging(&config)?;

    info!("Starting pet-scout v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", config_path);

    let store = Arc::new(ReportStore::new());
    let app_state = AppState {
        config: config.clone(),
        store: store.clone(),
    };

    let sweeper_handle = if config.sweeper.enabled {
        Some(sweeper::spawn(
            store.clone(),
            Duration::from_secs(config.sweeper.interval_seconds),
        ))
    } else {
        warn!("Background expiry sweeper is disabled; expiry is lazy only");
        None
    };

    let server = ApiServer::new(app_state);

    info!(
        "pet-scout listening on {}:{}",
        config.server.host, config.server.port
    );

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        res = server.run() => {
            if let Err(e) = res {
                error!("Server error: {}", e);
            }
            warn!("Server stopped unexpectedly");
        }
    }

    if let Some(handle) = sweeper_handle {
        handle.abort();
    }
    info!("pet-scout shut down");

    Ok(())
}

/// Initialize logging and tracing
fn init_logging(config: &Config) -> Result<()> {
    // RUST_LOG wins when set; otherwise the configured level applies
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .map_err(|_| ScoutError::Config {
            message: format!("Invalid log level: {}", config.logging.level),
        })?;

    if config.logging.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }

    Ok(())
}
