//! Run configuration. Parsed once at startup and immutable afterwards.

use std::time::Duration;

use clap::builder::RangedU64ValueParser;
use clap::{Parser, ValueEnum};

/// Which load-generation strategy each worker runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyKind {
    /// Fibonacci-style arithmetic with per-step ballast buffers.
    Arithmetic,
    /// Dense matrix multiplication, retaining retired operands.
    Matrix,
    /// Pure ballast allocation, minimal CPU.
    Alloc,
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "loadramp",
    about = "Drive CPU and memory toward a target ceiling, hold it, report peaks",
    after_help = "The ceiling check uses whole-system memory utilization, so pressure \
                  from other processes on the host counts toward the target."
)]
pub struct RunConfig {
    /// Stop the run once system memory utilization reaches this percentage.
    #[arg(long, default_value_t = 95.0)]
    pub memory_limit: f64,

    /// Monitor poll interval in seconds; doubles as the CPU sampling window.
    #[arg(long, default_value_t = 0.5)]
    pub interval: f64,

    /// Accumulator advances per worker batch between stop-signal checks.
    #[arg(long, default_value_t = 50_000)]
    pub batch_size: u64,

    /// Ballast bytes retained per accumulator advance (arithmetic strategy).
    /// Kept small: a batch commits batch-size times this much per worker
    /// before the stop signal is checked again.
    #[arg(long, default_value_t = 1024, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub advance_ballast_bytes: usize,

    /// Ballast buffer size in KiB (alloc strategy).
    #[arg(long, default_value_t = 1024, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub chunk_size_kb: usize,

    /// Square matrix dimension (matrix strategy).
    #[arg(long, default_value_t = 256, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub matrix_size: usize,

    /// Number of worker threads. Defaults to one per logical core.
    #[arg(long, default_value_t = num_cpus::get())]
    pub workers: usize,

    /// Load-generation strategy.
    #[arg(long, value_enum, default_value_t = StrategyKind::Arithmetic)]
    pub strategy: StrategyKind,

    /// Accumulator magnitude that triggers a rescale.
    #[arg(long, default_value = "1e300")]
    pub overflow_threshold: f64,

    /// Factor applied to both accumulator registers on a rescale.
    #[arg(long, default_value = "1e-150")]
    pub rescale_factor: f64,
}

impl RunConfig {
    pub fn chunk_bytes(&self) -> usize {
        self.chunk_size_kb * 1024
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval)
    }
}
