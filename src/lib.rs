//! Coordinated CPU/memory pressure harness: one worker per logical core,
//! a monitor that stops the fleet at a memory ceiling, shared counters.

pub mod accumulator;
pub mod config;
pub mod harness;
pub mod monitor;
pub mod report;
pub mod shared;
pub mod strategy;
pub mod telemetry;
pub mod worker;
