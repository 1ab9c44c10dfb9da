//! System telemetry behind a trait so tests can script samples.

use std::time::Duration;

use anyhow::{ensure, Result};
use sysinfo::System;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemorySnapshot {
    pub percent: f64,
    pub used_bytes: u64,
    pub total_bytes: u64,
}

pub trait Telemetry {
    /// Discards the sampler's first CPU reading, which is meaningless.
    fn prime(&mut self);

    /// Average system-wide CPU utilization over `window`, blocking for the
    /// window. Doubles as the monitor's polling delay.
    fn cpu_percent(&mut self, window: Duration) -> Result<f64>;

    fn memory(&mut self) -> Result<MemorySnapshot>;
}

pub struct SysinfoTelemetry {
    sys: System,
}

impl SysinfoTelemetry {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }
}

impl Default for SysinfoTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl Telemetry for SysinfoTelemetry {
    fn prime(&mut self) {
        self.sys.refresh_cpu_usage();
    }

    fn cpu_percent(&mut self, window: Duration) -> Result<f64> {
        // Usage is a delta between two refreshes.
        std::thread::sleep(window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
        self.sys.refresh_cpu_usage();
        Ok(f64::from(self.sys.global_cpu_usage()))
    }

    fn memory(&mut self) -> Result<MemorySnapshot> {
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        ensure!(total > 0, "telemetry reported zero total memory");
        let used = self.sys.used_memory();
        Ok(MemorySnapshot {
            percent: used as f64 / total as f64 * 100.0,
            used_bytes: used,
            total_bytes: total,
        })
    }
}
