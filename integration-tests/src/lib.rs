//! Shared fixtures for the end-to-end scenarios under `tests/`.

use braid_automata::CompositeAutomaton;
use braid_evolution::{Configuration, Error, EvolutionTime, HybridSet, Orbit, Semantics, evolve};
use braid_solvers::flow::{PicardSolver, PointIntegrator};

/// Time budget of the reference teleoperation run.
pub const EXECUTION_TIME: f64 = 10.0;

/// Transition budget of the reference teleoperation run.
pub const MAX_TRANSITIONS: usize = 50;

/// The evolver settings of the reference teleoperation run.
#[must_use]
pub fn reference_configuration() -> Configuration {
    Configuration {
        maximum_step_size: 1.25,
        maximum_enclosure_radius: 20.05,
        ..Configuration::default()
    }
}

/// Evolves `initial` with the point integrator and reference settings.
///
/// # Errors
///
/// Propagates any evolution error.
pub fn evolve_points(
    system: &CompositeAutomaton,
    initial: &HybridSet,
    time: EvolutionTime,
    semantics: Semantics,
) -> Result<Orbit, Error> {
    evolve(
        system,
        PointIntegrator::default(),
        reference_configuration(),
        initial,
        time,
        semantics,
    )
}

/// Evolves `initial` with the interval enclosure solver and reference settings.
///
/// # Errors
///
/// Propagates any evolution error.
pub fn evolve_enclosures(
    system: &CompositeAutomaton,
    initial: &HybridSet,
    time: EvolutionTime,
    semantics: Semantics,
) -> Result<Orbit, Error> {
    evolve(
        system,
        PicardSolver::default(),
        reference_configuration(),
        initial,
        time,
        semantics,
    )
}
