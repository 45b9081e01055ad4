mod telemetry;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use clap::Parser;
use rand::Rng;
use std::sync::{Arc, Mutex};
use telemetry::{render_status_page, Inverter};
use tracing::{info, warn};

/// Serves a fake inverter `/status.html` for exercising the poller.
#[derive(Debug, Parser)]
struct Args {
    /// Listen address
    #[arg(long, env = "SIM_ADDR", default_value = "0.0.0.0:8081")]
    addr: String,

    /// Number of initial requests answered with all-zero values
    #[arg(long, env = "SIM_BOOT_REQUESTS", default_value_t = 0)]
    boot_requests: u64,

    /// Probability of answering with HTTP 500
    #[arg(long, env = "SIM_ERROR_RATE", default_value_t = 0.0)]
    error_rate: f64,

    /// Lifetime yield at start, in kWh
    #[arg(long, env = "SIM_TOTAL_KWH", default_value_t = 1234.5)]
    total_kwh: f64,
}

#[derive(Clone)]
struct AppState {
    inverter: Arc<Mutex<Inverter>>,
    error_rate: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting inverter simulator");
    info!(
        "Address: {}, boot requests: {}, error rate: {}",
        args.addr, args.boot_requests, args.error_rate
    );

    let state = AppState {
        inverter: Arc::new(Mutex::new(Inverter::new(args.total_kwh, args.boot_requests))),
        error_rate: args.error_rate.clamp(0.0, 1.0),
    };

    let app = Router::new()
        .route("/status.html", get(status_page))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&args.addr).await?;
    info!("Serving http://{}/status.html", args.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Received shutdown signal");
        })
        .await?;

    Ok(())
}

async fn status_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));
    if !authorized {
        warn!("Rejected request without basic auth");
        return (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Basic realm=\"inverter\"")],
        )
            .into_response();
    }

    let mut rng = rand::thread_rng();
    if rng.gen_bool(state.error_rate) {
        warn!("Simulating server error");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let reading = match state.inverter.lock() {
        Ok(mut inverter) => inverter.next_reading(&mut rng),
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };
    info!(
        "Serving now_p={} W today_e={:.2} kWh total_e={:.1} kWh",
        reading.now_power, reading.today_kwh, reading.total_kwh
    );

    Html(render_status_page(&reading)).into_response()
}
