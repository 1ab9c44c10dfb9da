//! State shared between the harness, the monitor, and every worker.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// A worker's locally accumulated progress, flushed exactly once at exit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub units: u64,
    pub bytes: u64,
    pub rescales: u64,
}

impl Tally {
    pub fn absorb(&mut self, other: Tally) {
        self.units += other.units;
        self.bytes += other.bytes;
        self.rescales += other.rescales;
    }
}

/// Running maxima recorded by the monitor.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Peaks {
    pub cpu_percent: f64,
    pub mem_percent: f64,
}

pub struct SharedRunState {
    stop: AtomicBool,
    units: AtomicU64,
    bytes: AtomicU64,
    rescales: AtomicU64,
    peaks: Mutex<Peaks>,
}

impl SharedRunState {
    pub fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
            units: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            rescales: AtomicU64::new(0),
            peaks: Mutex::new(Peaks::default()),
        }
    }

    /// Raises the stop signal. Never cleared for the lifetime of a run.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    // Atomic adds: concurrent flushes at shutdown must not lose increments.
    pub fn flush_tally(&self, tally: &Tally) {
        self.units.fetch_add(tally.units, Ordering::SeqCst);
        self.bytes.fetch_add(tally.bytes, Ordering::SeqCst);
        self.rescales.fetch_add(tally.rescales, Ordering::SeqCst);
    }

    // Single writer (the monitor); the harness only reads after all joins.
    pub fn record_sample(&self, cpu_percent: f64, mem_percent: f64) {
        let mut peaks = self.peaks.lock().unwrap();
        if cpu_percent > peaks.cpu_percent {
            peaks.cpu_percent = cpu_percent;
        }
        if mem_percent > peaks.mem_percent {
            peaks.mem_percent = mem_percent;
        }
    }

    pub fn peaks(&self) -> Peaks {
        *self.peaks.lock().unwrap()
    }

    pub fn totals(&self) -> Tally {
        Tally {
            units: self.units.load(Ordering::SeqCst),
            bytes: self.bytes.load(Ordering::SeqCst),
            rescales: self.rescales.load(Ordering::SeqCst),
        }
    }
}

impl Default for SharedRunState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn stop_is_set_once_and_sticks() {
        let shared = SharedRunState::new();
        assert!(!shared.stop_requested());
        shared.request_stop();
        shared.request_stop();
        assert!(shared.stop_requested());
    }

    #[test]
    fn concurrent_flushes_are_not_lost() {
        let shared = Arc::new(SharedRunState::new());
        let tally = Tally {
            units: 7,
            bytes: 4096,
            rescales: 2,
        };
        let workers = 16;

        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || shared.flush_tally(&tally))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let totals = shared.totals();
        assert_eq!(totals.units, 7 * workers);
        assert_eq!(totals.bytes, 4096 * workers);
        assert_eq!(totals.rescales, 2 * workers);
    }

    #[test]
    fn peaks_track_the_maximum_sample() {
        let shared = SharedRunState::new();
        for (cpu, mem) in [(10.0, 20.0), (90.0, 15.0), (40.0, 75.0), (60.0, 30.0)] {
            shared.record_sample(cpu, mem);
        }
        let peaks = shared.peaks();
        assert_eq!(peaks.cpu_percent, 90.0);
        assert_eq!(peaks.mem_percent, 75.0);
    }
}
