mod config;
mod db;
mod errors;
mod extract;
mod fetch;
mod logging;
mod metrics;
mod model;
mod poll;

use config::Config;
use db::MySqlSink;
use fetch::StatusPage;
use logging::LogLevel;
use poll::Poller;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            logging::init(LogLevel::Error);
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    logging::init(config.log_level);

    info!("Starting inverter poller");
    info!("Environment variables: {}", config::variable_names().join(", "));

    let status_page = StatusPage::new(&config.web, config.http_timeout);
    info!("Status page: {}", status_page.url());
    info!(
        "Database: {}@{}/{}",
        config.mysql.username, config.mysql.server, config.mysql.database
    );

    metrics::init_metrics();

    if let Some(addr) = config.metrics_addr.clone() {
        tokio::spawn(async move {
            if let Err(e) = metrics::serve(&addr).await {
                error!("Metrics server failed: {}", e);
            }
        });
    }

    let poller = Poller::new(
        status_page,
        MySqlSink::new(&config.mysql),
        config.interval,
    );

    tokio::select! {
        _ = poller.run() => {
            error!("Poll loop terminated");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Shutting down");
}
