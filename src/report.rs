//! Progress and summary reporting; formatting stays out of the core loops.

use std::io::{self, Write};
use std::time::Duration;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    pub elapsed: Duration,
    pub cpu_percent: f64,
    pub mem_percent: f64,
    pub used_bytes: u64,
    pub total_bytes: u64,
}

/// Final run statistics, computed after every worker has joined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub elapsed: Duration,
    pub peak_cpu_percent: f64,
    pub peak_mem_percent: f64,
    pub total_memory_bytes: u64,
    pub total_units: u64,
    pub total_bytes: u64,
    pub rescale_events: u64,
}

impl RunSummary {
    /// Peak memory in absolute terms: total physical memory × peak percent.
    pub fn estimated_peak_bytes(&self) -> u64 {
        (self.total_memory_bytes as f64 * self.peak_mem_percent / 100.0) as u64
    }

    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_units as f64 / secs
        } else {
            0.0
        }
    }
}

pub trait ProgressSink {
    fn tick(&mut self, event: &ProgressEvent);
    fn summary(&mut self, summary: &RunSummary);
}

fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{}:{:02}:{:02}", total / 3600, total / 60 % 60, total % 60)
}

pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleReporter {
    fn tick(&mut self, event: &ProgressEvent) {
        print!(
            "\r[{}] CPU: {:>5.1}% | Mem: {:>5.1}% ({:>6.1} / {:.1} GB)",
            format_elapsed(event.elapsed),
            event.cpu_percent,
            event.mem_percent,
            event.used_bytes as f64 / GIB,
            event.total_bytes as f64 / GIB,
        );
        let _ = io::stdout().flush();
    }

    fn summary(&mut self, summary: &RunSummary) {
        println!();
        println!("{}", "=".repeat(45));
        println!("              RESULT SUMMARY");
        println!("{}", "=".repeat(45));
        println!(" Execution Time    : {}", format_elapsed(summary.elapsed));
        println!(" Peak CPU Usage    : {:.1} %", summary.peak_cpu_percent);
        println!(" Peak Memory Usage : {:.1} %", summary.peak_mem_percent);
        println!(
            " Peak Memory (est) : {:.1} / {:.1} GB",
            summary.estimated_peak_bytes() as f64 / GIB,
            summary.total_memory_bytes as f64 / GIB,
        );
        println!("{}", "-".repeat(45));
        println!(" Total Units Gen   : {}", summary.total_units);
        println!(
            " Total Ballast     : {:.2} GB",
            summary.total_bytes as f64 / GIB
        );
        println!(" Scaling Resets    : {}", summary.rescale_events);
        println!(" Throughput        : {:.0} units/sec", summary.throughput());
        println!("{}", "=".repeat(45));
    }
}
