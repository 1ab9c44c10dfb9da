//! Overflow-safe Fibonacci-style accumulator.

pub const OVERFLOW_THRESHOLD: f64 = 1e300;
pub const RESCALE_FACTOR: f64 = 1e-150;

/// Result of a single [`FibGrowth::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Advance {
    pub value: f64,
    pub rescaled: bool,
}

#[derive(Debug, Clone)]
pub struct FibGrowth {
    a: f64,
    b: f64,
    threshold: f64,
    factor: f64,
}

impl FibGrowth {
    pub fn new(threshold: f64, factor: f64) -> Self {
        Self {
            a: 1.0,
            b: 1.0,
            threshold,
            factor,
        }
    }

    /// One step: `(a, b) = (b, a + b)`, rescaling both registers when `b`
    /// crosses the threshold so the value never reaches infinity.
    pub fn advance(&mut self) -> Advance {
        let next = self.a + self.b;
        self.a = self.b;
        self.b = next;

        let mut rescaled = false;
        if self.b > self.threshold {
            self.a *= self.factor;
            self.b *= self.factor;
            rescaled = true;
        }

        Advance {
            value: self.b,
            rescaled,
        }
    }
}

impl Default for FibGrowth {
    fn default() -> Self {
        Self::new(OVERFLOW_THRESHOLD, RESCALE_FACTOR)
    }
}
