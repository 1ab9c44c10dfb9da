//! Runs strategy batches until the stop signal is observed, then flushes
//! the local tally exactly once.

use std::sync::Arc;

use log::{debug, warn};

use crate::shared::{SharedRunState, Tally};
use crate::strategy::LoadStrategy;

pub fn run_worker(id: usize, mut strategy: Box<dyn LoadStrategy + Send>, shared: Arc<SharedRunState>) {
    debug!("worker {id} started");
    let mut tally = Tally::default();

    while !shared.stop_requested() {
        match strategy.run_batch() {
            Ok(batch) => tally.absorb(batch),
            Err(err) => {
                // Expected end-of-run condition, not a fault.
                warn!("worker {id}: {err}, requesting global stop");
                shared.request_stop();
                break;
            }
        }
    }

    // Single flush point; the join in the harness orders this before the
    // counters are read.
    shared.flush_tally(&tally);
    debug!(
        "worker {id} exiting: units={} bytes={} rescales={}",
        tally.units, tally.bytes, tally.rescales
    );
}
