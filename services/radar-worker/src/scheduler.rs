//! Polling scheduler: one pipeline cycle per station, repeated on an interval.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use radar_common::{RadarResult, StationId};

use crate::config::StationConfig;
use crate::pipeline::{CycleReport, RenderPipeline};

pub struct Scheduler {
    pipeline: Arc<RenderPipeline>,
    stations: Vec<StationConfig>,
    concurrency: usize,
    poll_interval: Duration,
}

impl Scheduler {
    pub fn new(pipeline: Arc<RenderPipeline>, stations: Vec<StationConfig>) -> Self {
        Self {
            pipeline,
            stations,
            concurrency: 4,
            poll_interval: Duration::from_secs(120),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn stations(&self) -> &[StationConfig] {
        &self.stations
    }

    /// Run one cycle for every station. Failures are logged per station and
    /// returned; one station failing never stops the others.
    pub async fn run_once(&self) -> Vec<(StationId, RadarResult<CycleReport>)> {
        let now = Utc::now();
        // Futures are built eagerly (they stay lazy until polled) so the stream
        // type carries no closure; works around rustc's higher-ranked `Send` inference.
        let cycles: Vec<_> = self
            .stations
            .iter()
            .map(|station| {
                let pipeline = self.pipeline.clone();
                async move {
                    let result = pipeline.run_cycle(station, now).await;
                    (station.id.clone(), result)
                }
            })
            .collect();
        let results: Vec<(StationId, RadarResult<CycleReport>)> = stream::iter(cycles)
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for (station, result) in &results {
            match result {
                Ok(report) => info!(
                    station = %station,
                    object = %report.object_name,
                    rendered = report.rendered(),
                    failed = report.failed(),
                    "Station cycle complete"
                ),
                Err(e) if e.is_fatal() => error!(station = %station, error = %e, "Station cycle failed"),
                Err(e) => warn!(station = %station, error = %e, "Station cycle produced nothing"),
            }
        }
        results
    }

    /// Run cycles until `shutdown` fires, sleeping `poll_interval` between them.
    pub async fn run_forever(&self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        info!(
            stations = self.stations.len(),
            interval_secs = self.poll_interval.as_secs(),
            "Starting polling loop"
        );

        let mut cycle: u64 = 0;
        loop {
            cycle += 1;
            let results = self.run_once().await;
            let failed = results.iter().filter(|(_, r)| r.is_err()).count();
            info!(cycle, stations = results.len(), failed, "Cycle finished");

            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Shutting down scheduler");
                    break;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        Ok(())
    }
}
