use std::process::ExitCode;

use clap::Parser;
use log::error;

use loadramp::config::RunConfig;
use loadramp::harness::Harness;
use loadramp::report::ConsoleReporter;
use loadramp::telemetry::SysinfoTelemetry;

fn main() -> ExitCode {
    env_logger::init();
    let config = RunConfig::parse();

    lower_priority();

    println!("--- loadramp: CPU & memory pressure harness ---");
    println!("Workers      : {}", config.workers);
    println!("Strategy     : {:?}", config.strategy);
    println!("Memory Target: {:.1}%", config.memory_limit);
    println!("-----------------------------------------------");

    let harness = Harness::new(config);

    // Ctrl-C takes the same graceful path as reaching the ceiling: raise
    // the stop signal and let the workers drain and flush.
    let shared = harness.shared();
    if let Err(err) = ctrlc::set_handler(move || shared.request_stop()) {
        error!("failed to install interrupt handler: {err}");
    }

    let mut telemetry = SysinfoTelemetry::new();
    let mut reporter = ConsoleReporter::new();
    match harness.run(&mut telemetry, &mut reporter) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("run aborted: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Run at reduced scheduling priority so the host stays responsive.
#[cfg(unix)]
fn lower_priority() {
    unsafe {
        let _ = libc::nice(10);
    }
}

#[cfg(not(unix))]
fn lower_priority() {}
