// # cachesim - LIRS Simulator CLI
//
// Runs the LIRS replacement simulator over a reference trace. The single
// argument is a file-name prefix P: block references are read from P.trc,
// cache sizes from P.par, and the results land in P_LIRS.cuv (hit-rate
// curve) and P_LIRS.sln (stack-occupancy samples for the last size).

use clap::Parser;
use rusty_cachesim::replacement::PolicyKind;
use rusty_cachesim::sim::{cache_sizes_from_path, report, Driver, Trace};
use rusty_cachesim::{Result, SimConfig, VERSION};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Trace-driven LIRS cache replacement simulator.
#[derive(Parser, Debug)]
#[command(name = "cachesim", version, about)]
struct Cli {
    /// File-name prefix: reads <PREFIX>.trc and <PREFIX>.par, writes
    /// <PREFIX>_LIRS.cuv and <PREFIX>_LIRS.sln
    prefix: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    info!(version = VERSION, "cachesim starting");

    let trace = Trace::from_path(report::trace_path(&cli.prefix))?;
    info!(
        refs = trace.len(),
        blocks = trace.block_count(),
        "trace loaded"
    );

    let sizes = cache_sizes_from_path(report::params_path(&cli.prefix))?;
    if sizes.is_empty() {
        info!("no usable cache sizes, nothing to simulate");
        return Ok(());
    }

    let driver = Driver::new(trace, SimConfig::default());
    let sim_report = driver.run_all(PolicyKind::Lirs, &sizes)?;
    report::write_report(&cli.prefix, &sim_report)?;

    info!(
        curve = %report::curve_path(&cli.prefix, sim_report.policy).display(),
        samples = %report::samples_path(&cli.prefix, sim_report.policy).display(),
        "results written"
    );
    Ok(())
}
