//! Uptime Monitor Binary

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uptime_monitor::config::Config;
use uptime_monitor::notify::WebhookNotifier;
use uptime_monitor::probes::Prober;
use uptime_monitor::runner::CheckRunner;
use uptime_monitor::server::{AppState, routes};
use uptime_monitor::store::FileStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    initialize_tracing();

    info!("Starting Uptime Monitor v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env();

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    info!(
        "Monitor configuration - Registry: {}, Retries: {}, Backoff: {:?}, Timeout: {:?}",
        config.store_path, config.retry_count, config.retry_backoff, config.probe_timeout
    );

    let store = Arc::new(FileStore::new(&config.store_path));
    let notifier = match WebhookNotifier::new(config.webhook_url.clone(), config.probe_timeout) {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            error!("Could not build the notification client: {}", e);
            std::process::exit(1);
        }
    };
    let prober = match Prober::new(&config) {
        Ok(prober) => Arc::new(prober),
        Err(e) => {
            error!("Could not build the probe client: {}", e);
            std::process::exit(1);
        }
    };
    let runner = Arc::new(CheckRunner::new(store, notifier, prober));

    info!(
        "Trigger server listening on {}:{}",
        config.bind_addr, config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(AppState {
                runner: Arc::clone(&runner),
            }))
            .configure(routes)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}

/// Initialize structured logging
fn initialize_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .unwrap();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
