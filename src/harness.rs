//! Owns the shared run state: spawns workers, runs the monitor inline,
//! joins everything, prints the summary.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::config::RunConfig;
use crate::monitor::{run_monitor, StopReason};
use crate::report::{ProgressSink, RunSummary};
use crate::shared::SharedRunState;
use crate::strategy::{self, LoadStrategy};
use crate::telemetry::Telemetry;
use crate::worker::run_worker;

#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    pub reason: StopReason,
    pub summary: RunSummary,
}

pub struct Harness {
    config: RunConfig,
    shared: Arc<SharedRunState>,
}

impl Harness {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            shared: Arc::new(SharedRunState::new()),
        }
    }

    /// Handle to the shared state, for wiring up interrupt handlers.
    pub fn shared(&self) -> Arc<SharedRunState> {
        Arc::clone(&self.shared)
    }

    pub fn run(
        &self,
        telemetry: &mut dyn Telemetry,
        reporter: &mut dyn ProgressSink,
    ) -> Result<RunOutcome> {
        let config = self.config.clone();
        self.run_with(telemetry, reporter, |_| strategy::from_config(&config))
    }

    /// Runs with a caller-supplied strategy per worker. The summary goes
    /// out even when the monitor fails.
    pub fn run_with<F>(
        &self,
        telemetry: &mut dyn Telemetry,
        reporter: &mut dyn ProgressSink,
        make_strategy: F,
    ) -> Result<RunOutcome>
    where
        F: Fn(usize) -> Box<dyn LoadStrategy + Send>,
    {
        let start = Instant::now();

        let mut handles = Vec::with_capacity(self.config.workers);
        for id in 0..self.config.workers {
            let shared = Arc::clone(&self.shared);
            let strategy = make_strategy(id);
            let handle = thread::Builder::new()
                .name(format!("worker-{id}"))
                .spawn(move || run_worker(id, strategy, shared))
                .context("failed to spawn worker thread")?;
            handles.push(handle);
        }
        info!("spawned {} workers", handles.len());

        let monitor_result = run_monitor(&self.config, &self.shared, telemetry, reporter, start);

        // Hard ordering invariant: every worker must have joined (and thus
        // flushed) before the counters are read.
        for handle in handles {
            if handle.join().is_err() {
                warn!("a worker panicked; its tally was not flushed");
            }
        }
        let elapsed = start.elapsed();
        info!("all workers joined after {elapsed:?}");

        let totals = self.shared.totals();
        let peaks = self.shared.peaks();
        let total_memory_bytes = telemetry.memory().map(|m| m.total_bytes).unwrap_or(0);
        let summary = RunSummary {
            elapsed,
            peak_cpu_percent: peaks.cpu_percent,
            peak_mem_percent: peaks.mem_percent,
            total_memory_bytes,
            total_units: totals.units,
            total_bytes: totals.bytes,
            rescale_events: totals.rescales,
        };
        reporter.summary(&summary);

        let reason = monitor_result?;
        Ok(RunOutcome { reason, summary })
    }
}
