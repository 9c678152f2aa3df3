//! Evolves the teleoperation model and reports the supervisor's switching
//! times and the range of each quantity.
//!
//! Run with `RUST_LOG=braid_evolution=debug` to trace rounds and jumps.

use std::error::Error;

use braid_evolution::{Configuration, EvolutionTime, Evolver, Semantics};
use braid_models::{Quantities, TO_MOVE, TO_STOP, TeleopParameters, initial_set, master_system};
use braid_solvers::flow::PointIntegrator;
use tracing::info;
use tracing_subscriber::EnvFilter;

const EXECUTION_TIME: f64 = 10.0;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let params = TeleopParameters::default();
    let system = master_system(&params)?;
    println!("{system}");

    let configuration = Configuration {
        maximum_step_size: 1.25,
        maximum_enclosure_radius: 20.05,
        ..Configuration::default()
    };
    let evolver = Evolver::new(&system, PointIntegrator::default(), configuration)?;

    info!("computing evolution");
    let orbit = evolver.orbit(
        &initial_set(&params),
        EvolutionTime::new(EXECUTION_TIME, 50),
        Semantics::Upper,
    )?;
    info!(
        branches = orbit.branches().len(),
        samples = orbit.sample_count(),
        "evolution done"
    );

    for event in [TO_STOP, TO_MOVE] {
        let times: Vec<String> = orbit
            .jump_times(event)
            .iter()
            .map(|t| format!("{t:.4}"))
            .collect();
        println!("{event}: [{}]", times.join(", "));
    }

    let q = Quantities::default();
    for variable in [
        &q.ref_s,
        &q.ref_m,
        &q.position_s,
        &q.position_m,
        &q.velocity_s,
        &q.velocity_m,
        &q.energy_tank_m,
        &q.pos_err,
    ] {
        if let Some(range) = orbit.range(variable.name(), 0.0..=EXECUTION_TIME) {
            println!("{variable}: {range}");
        }
    }

    for (branch, sample) in orbit.final_samples() {
        println!("{} ends at t={} ({})", branch.id, sample.time, branch.termination);
    }

    Ok(())
}
