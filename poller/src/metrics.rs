use crate::errors::Result;
use axum::{routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use tracing::info;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref CYCLES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "poller_cycles_total",
        "Total poll cycles started"
    ))
    .unwrap();
    pub static ref FETCH_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "poller_fetch_failures_total",
        "Total failed status page requests"
    ))
    .unwrap();
    pub static ref EXTRACT_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "poller_extract_failures_total",
        "Total status pages without usable telemetry"
    ))
    .unwrap();
    pub static ref DB_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "poller_db_failures_total",
        "Total database insert failures"
    ))
    .unwrap();
    pub static ref SAMPLES_STORED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "poller_samples_stored_total",
        "Total samples written to the database"
    ))
    .unwrap();
    pub static ref SAMPLES_SKIPPED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "poller_samples_skipped_total",
        "Total samples discarded because total energy was not positive"
    ))
    .unwrap();
    pub static ref CURRENT_POWER_WATTS: Gauge = Gauge::with_opts(Opts::new(
        "poller_current_power_watts",
        "Most recently extracted current power"
    ))
    .unwrap();
    pub static ref TODAY_ENERGY_WATT_HOURS: Gauge = Gauge::with_opts(Opts::new(
        "poller_today_energy_watt_hours",
        "Most recently extracted energy yield of the day"
    ))
    .unwrap();
    pub static ref TOTAL_ENERGY_WATT_HOURS: Gauge = Gauge::with_opts(Opts::new(
        "poller_total_energy_watt_hours",
        "Most recently extracted lifetime energy yield"
    ))
    .unwrap();
    pub static ref CYCLE_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "poller_cycle_duration_seconds",
            "Time taken by one fetch-extract-store cycle"
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0])
    )
    .unwrap();
}

pub fn init_metrics() {
    REGISTRY.register(Box::new(CYCLES_TOTAL.clone())).unwrap();
    REGISTRY
        .register(Box::new(FETCH_FAILURES_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(EXTRACT_FAILURES_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(DB_FAILURES_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(SAMPLES_STORED_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(SAMPLES_SKIPPED_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(CURRENT_POWER_WATTS.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(TODAY_ENERGY_WATT_HOURS.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(TOTAL_ENERGY_WATT_HOURS.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(CYCLE_DURATION_SECONDS.clone()))
        .unwrap();
}

pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Serves `GET /metrics` until the listener fails.
pub async fn serve(addr: &str) -> Result<()> {
    let app = Router::new().route("/metrics", get(metrics_handler));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Metrics server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn metrics_handler() -> String {
    gather_metrics()
}
