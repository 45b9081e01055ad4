use crate::db::Sink;
use crate::errors::Result;
use crate::extract::extract;
use crate::fetch::Fetch;
use crate::metrics::{
    CURRENT_POWER_WATTS, CYCLES_TOTAL, CYCLE_DURATION_SECONDS, DB_FAILURES_TOTAL,
    EXTRACT_FAILURES_TOTAL, FETCH_FAILURES_TOTAL, SAMPLES_SKIPPED_TOTAL, SAMPLES_STORED_TOTAL,
    TODAY_ENERGY_WATT_HOURS, TOTAL_ENERGY_WATT_HOURS,
};
use crate::model::Sample;
use chrono::Local;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Fixed backoff after any failed cycle.
pub const RETRY_DELAY: Duration = Duration::from_secs(20);

/// Where the loop stands after a cycle; decides how long to sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Active,
    Retrying,
}

impl State {
    pub fn delay(self, interval: Duration) -> Duration {
        match self {
            State::Active => interval,
            State::Retrying => RETRY_DELAY,
        }
    }
}

pub struct Poller<F, S> {
    fetcher: F,
    sink: S,
    interval: Duration,
}

impl<F: Fetch, S: Sink> Poller<F, S> {
    pub fn new(fetcher: F, sink: S, interval: Duration) -> Self {
        Self {
            fetcher,
            sink,
            interval,
        }
    }

    /// Polls forever. One cycle completes before the next one starts.
    pub async fn run(&self) {
        info!("Initial run");

        let mut state = State::Active;
        loop {
            state = self.cycle(state).await;

            let delay = state.delay(self.interval);
            match state {
                State::Active => info!("Sleep: {:.1} minutes", delay.as_secs_f64() / 60.0),
                State::Retrying => warn!("Retry in {} seconds", delay.as_secs()),
            }
            tokio::time::sleep(delay).await;
        }
    }

    /// Runs fetch, extract and (for a plausible sample) store once.
    pub async fn cycle(&self, previous: State) -> State {
        CYCLES_TOTAL.inc();
        info!(
            state = ?previous,
            "{}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let start = Instant::now();

        let next = match self.sample().await {
            Ok(sample) if sample.is_plausible() => self.persist(&sample).await,
            Ok(sample) => {
                SAMPLES_SKIPPED_TOTAL.inc();
                warn!("Discarding sample with non-positive total energy ({})", sample);
                State::Retrying
            }
            Err(_) => State::Retrying,
        };

        CYCLE_DURATION_SECONDS.observe(start.elapsed().as_secs_f64());
        next
    }

    async fn sample(&self) -> Result<Sample> {
        let markup = self.fetcher.fetch().await.inspect_err(|_| {
            FETCH_FAILURES_TOTAL.inc();
        })?;
        let sample = extract(&markup).inspect_err(|_| {
            EXTRACT_FAILURES_TOTAL.inc();
        })?;

        info!("Fetched data: {}", sample);
        CURRENT_POWER_WATTS.set(sample.current_power as f64);
        TODAY_ENERGY_WATT_HOURS.set(sample.today_energy as f64);
        TOTAL_ENERGY_WATT_HOURS.set(sample.total_energy as f64);
        Ok(sample)
    }

    async fn persist(&self, sample: &Sample) -> State {
        match self.sink.store(sample).await {
            Ok(()) => {
                SAMPLES_STORED_TOTAL.inc();
                State::Active
            }
            Err(_) => {
                DB_FAILURES_TOTAL.inc();
                State::Retrying
            }
        }
    }
}
