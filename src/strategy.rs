//! Load-generation strategies. Each exposes one `run_batch` call; the
//! worker re-checks the stop signal between batches.

use std::fmt;

use rand::Rng;

use crate::accumulator::FibGrowth;
use crate::config::{RunConfig, StrategyKind};
use crate::shared::Tally;

/// The allocator refused to hand out more ballast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocExhausted;

impl fmt::Display for AllocExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "allocator refused more ballast memory")
    }
}

impl std::error::Error for AllocExhausted {}

pub trait LoadStrategy {
    /// Runs one batch of work. Batch size bounds stop-signal latency.
    fn run_batch(&mut self) -> Result<Tally, AllocExhausted>;
}

pub fn from_config(config: &RunConfig) -> Box<dyn LoadStrategy + Send> {
    match config.strategy {
        StrategyKind::Arithmetic => Box::new(ArithmeticGrowth::new(
            FibGrowth::new(config.overflow_threshold, config.rescale_factor),
            config.batch_size,
            config.advance_ballast_bytes,
        )),
        StrategyKind::Matrix => Box::new(DenseCompute::new(config.matrix_size)),
        StrategyKind::Alloc => Box::new(RawAllocation::new(config.chunk_bytes())),
    }
}

// Zero-filling writes every page; merely reserving address space would not
// commit physical memory on overcommitting platforms.
fn ballast_chunk(len: usize) -> Result<Vec<u8>, AllocExhausted> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| AllocExhausted)?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Pure arithmetic load: accumulator advances plus one small retained
/// buffer per advance.
pub struct ArithmeticGrowth {
    fib: FibGrowth,
    batch_size: u64,
    chunk: usize,
    ballast: Vec<Vec<u8>>,
}

impl ArithmeticGrowth {
    pub fn new(fib: FibGrowth, batch_size: u64, chunk: usize) -> Self {
        Self {
            fib,
            batch_size,
            chunk,
            ballast: Vec::new(),
        }
    }
}

impl LoadStrategy for ArithmeticGrowth {
    fn run_batch(&mut self) -> Result<Tally, AllocExhausted> {
        let mut tally = Tally::default();
        for _ in 0..self.batch_size {
            let step = self.fib.advance();
            if step.rescaled {
                tally.rescales += 1;
            }
            let mut buf = ballast_chunk(self.chunk)?;
            // Stamp live data into the buffer so it can never be elided.
            buf[0] = (step.value.to_bits() & 0xff) as u8;
            self.ballast.push(buf);
            tally.units += 1;
            tally.bytes += self.chunk as u64;
        }
        Ok(tally)
    }
}

/// Dense matrix multiplication, retaining the retired operand each round.
pub struct DenseCompute {
    dim: usize,
    left: Vec<f32>,
    right: Vec<f32>,
    ballast: Vec<Vec<f32>>,
}

impl DenseCompute {
    pub fn new(dim: usize) -> Self {
        let mut rng = rand::rng();
        let left = (0..dim * dim).map(|_| rng.random::<f32>()).collect();
        let right = (0..dim * dim).map(|_| rng.random::<f32>()).collect();
        Self {
            dim,
            left,
            right,
            ballast: Vec::new(),
        }
    }

    fn multiply(&self) -> Result<Vec<f32>, AllocExhausted> {
        let n = self.dim;
        let mut out = Vec::new();
        out.try_reserve_exact(n * n).map_err(|_| AllocExhausted)?;
        out.resize(n * n, 0.0);
        for i in 0..n {
            for k in 0..n {
                let l = self.left[i * n + k];
                for j in 0..n {
                    out[i * n + j] += l * self.right[k * n + j];
                }
            }
        }
        Ok(out)
    }
}

impl LoadStrategy for DenseCompute {
    fn run_batch(&mut self) -> Result<Tally, AllocExhausted> {
        let product = self.multiply()?;
        // Feed the product back as the next left operand.
        let retired = std::mem::replace(&mut self.left, product);
        self.ballast.push(retired);
        Ok(Tally {
            units: 1,
            bytes: (self.dim * self.dim * std::mem::size_of::<f32>()) as u64,
            rescales: 0,
        })
    }
}

/// One retained chunk per batch, no computation.
pub struct RawAllocation {
    chunk: usize,
    ballast: Vec<Vec<u8>>,
}

impl RawAllocation {
    pub fn new(chunk: usize) -> Self {
        Self {
            chunk,
            ballast: Vec::new(),
        }
    }
}

impl LoadStrategy for RawAllocation {
    fn run_batch(&mut self) -> Result<Tally, AllocExhausted> {
        let mut buf = ballast_chunk(self.chunk)?;
        buf[0] = 1;
        self.ballast.push(buf);
        Ok(Tally {
            units: 1,
            bytes: self.chunk as u64,
            rescales: 0,
        })
    }
}
