//! Samples telemetry on a fixed cadence, tracks peaks, and raises the stop
//! signal at the memory ceiling.

use std::time::Instant;

use anyhow::Result;
use log::{error, info};

use crate::config::RunConfig;
use crate::report::{ProgressEvent, ProgressSink};
use crate::shared::SharedRunState;
use crate::telemetry::{MemorySnapshot, Telemetry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    CeilingReached,
    /// Stop signal raised externally: operator interrupt, or a worker that
    /// hit allocation exhaustion.
    Interrupted,
}

fn sample(telemetry: &mut dyn Telemetry, config: &RunConfig) -> Result<(f64, MemorySnapshot)> {
    let cpu = telemetry.cpu_percent(config.poll_interval())?;
    let mem = telemetry.memory()?;
    Ok((cpu, mem))
}

/// Runs until the ceiling is reached, the stop signal is raised elsewhere,
/// or telemetry fails (terminal: stop is raised before the error returns).
pub fn run_monitor(
    config: &RunConfig,
    shared: &SharedRunState,
    telemetry: &mut dyn Telemetry,
    reporter: &mut dyn ProgressSink,
    start: Instant,
) -> Result<StopReason> {
    info!(
        "monitor started, memory ceiling {:.1}%, interval {:?}",
        config.memory_limit,
        config.poll_interval()
    );
    telemetry.prime();

    loop {
        if shared.stop_requested() {
            info!("monitor: stop signal already raised, winding down");
            return Ok(StopReason::Interrupted);
        }

        let (cpu, mem) = match sample(telemetry, config) {
            Ok(reading) => reading,
            Err(err) => {
                error!("monitor: telemetry failure, stopping the run: {err:#}");
                shared.request_stop();
                return Err(err);
            }
        };

        shared.record_sample(cpu, mem.percent);
        reporter.tick(&ProgressEvent {
            elapsed: start.elapsed(),
            cpu_percent: cpu,
            mem_percent: mem.percent,
            used_bytes: mem.used_bytes,
            total_bytes: mem.total_bytes,
        });

        if mem.percent >= config.memory_limit {
            info!(
                "monitor: memory ceiling reached ({:.1}% >= {:.1}%)",
                mem.percent, config.memory_limit
            );
            shared.request_stop();
            return Ok(StopReason::CeilingReached);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::time::Duration;

    struct ScriptedTelemetry {
        cpu: Vec<f64>,
        mem: Vec<f64>,
        calls: usize,
        fail_on: Option<usize>,
    }

    impl ScriptedTelemetry {
        fn new(cpu: Vec<f64>, mem: Vec<f64>) -> Self {
            Self {
                cpu,
                mem,
                calls: 0,
                fail_on: None,
            }
        }
    }

    impl Telemetry for ScriptedTelemetry {
        fn prime(&mut self) {}

        fn cpu_percent(&mut self, _window: Duration) -> Result<f64> {
            if self.fail_on == Some(self.calls) {
                bail!("scripted sampling failure");
            }
            let cpu = self.cpu[self.calls.min(self.cpu.len() - 1)];
            Ok(cpu)
        }

        fn memory(&mut self) -> Result<MemorySnapshot> {
            let percent = self.mem[self.calls.min(self.mem.len() - 1)];
            self.calls += 1;
            Ok(MemorySnapshot {
                percent,
                used_bytes: (percent * 1e7) as u64,
                total_bytes: 1_000_000_000,
            })
        }
    }

    #[derive(Default)]
    struct CaptureSink {
        ticks: Vec<ProgressEvent>,
    }

    impl ProgressSink for CaptureSink {
        fn tick(&mut self, event: &ProgressEvent) {
            self.ticks.push(*event);
        }

        fn summary(&mut self, _summary: &crate::report::RunSummary) {}
    }

    fn test_config() -> RunConfig {
        use clap::Parser;
        RunConfig::parse_from(["loadramp", "--interval", "0"])
    }

    #[test]
    fn stops_when_the_ceiling_is_reached() {
        let config = test_config();
        let shared = SharedRunState::new();
        let mut telemetry =
            ScriptedTelemetry::new(vec![30.0, 80.0, 60.0, 50.0], vec![10.0, 40.0, 70.0, 96.0]);
        let mut sink = CaptureSink::default();

        let reason = run_monitor(
            &config,
            &shared,
            &mut telemetry,
            &mut sink,
            Instant::now(),
        )
        .unwrap();

        assert_eq!(reason, StopReason::CeilingReached);
        assert!(shared.stop_requested());
        assert_eq!(sink.ticks.len(), 4);

        // Peaks equal the true maxima of the fed samples.
        let peaks = shared.peaks();
        assert_eq!(peaks.cpu_percent, 80.0);
        assert_eq!(peaks.mem_percent, 96.0);
    }

    #[test]
    fn external_stop_ends_the_loop_without_sampling() {
        let config = test_config();
        let shared = SharedRunState::new();
        shared.request_stop();
        let mut telemetry = ScriptedTelemetry::new(vec![0.0], vec![0.0]);
        let mut sink = CaptureSink::default();

        let reason = run_monitor(
            &config,
            &shared,
            &mut telemetry,
            &mut sink,
            Instant::now(),
        )
        .unwrap();

        assert_eq!(reason, StopReason::Interrupted);
        assert!(sink.ticks.is_empty());
    }

    #[test]
    fn telemetry_failure_raises_stop_and_returns_the_error() {
        let config = test_config();
        let shared = SharedRunState::new();
        let mut telemetry = ScriptedTelemetry::new(vec![10.0], vec![10.0]);
        telemetry.fail_on = Some(2);
        let mut sink = CaptureSink::default();

        let result = run_monitor(
            &config,
            &shared,
            &mut telemetry,
            &mut sink,
            Instant::now(),
        );

        assert!(result.is_err());
        assert!(shared.stop_requested());
        assert_eq!(sink.ticks.len(), 2);
    }

    #[test]
    fn peaks_never_decrease_over_a_run() {
        let config = test_config();
        let shared = SharedRunState::new();
        let mut telemetry = ScriptedTelemetry::new(
            vec![50.0, 20.0, 90.0, 10.0],
            vec![30.0, 10.0, 20.0, 95.0],
        );
        let mut sink = CaptureSink::default();

        run_monitor(
            &config,
            &shared,
            &mut telemetry,
            &mut sink,
            Instant::now(),
        )
        .unwrap();

        let peaks = shared.peaks();
        assert_eq!(peaks.cpu_percent, 90.0);
        assert_eq!(peaks.mem_percent, 95.0);
    }
}
