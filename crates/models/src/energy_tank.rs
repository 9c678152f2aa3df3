use std::sync::Arc;

use braid_automata::{AtomicAutomaton, Event, EventKind, MalformedModel};
use braid_core::{DifferentialAssignment, Dynamics, Expr, Guard, Variable, dot, next};

/// Location where the supervised reference evolves.
pub const MOVING: &str = "moving";

/// Location where the reference is held at zero while the tank recharges.
pub const STATIONARY: &str = "stationary";

/// Event taken when the tank runs low.
pub const TO_STOP: &str = "to_stop";

/// Event taken once the tank has recharged.
pub const TO_MOVE: &str = "to_move";

/// Builds an energy-tank supervisor automaton.
///
/// The automaton has two locations. In [`MOVING`] the tank drains at the
/// depletion rate and the reference follows its own rate. When the tank
/// falls to the low threshold, the urgent [`TO_STOP`] transition saves the
/// reference into the checkpoint and zeroes it. In [`STATIONARY`] the tank
/// recharges and the reference is frozen; at the high threshold the urgent
/// [`TO_MOVE`] transition restores the reference from the checkpoint.
///
/// ```
/// use braid_core::Variable;
/// use braid_models::EnergyTank;
///
/// let tank = EnergyTank::new(
///     "supervisor",
///     &Variable::new("energy"),
///     &Variable::new("reference"),
///     &Variable::new("saved"),
/// )
/// .thresholds(0.1, 1.0)
/// .rates(0.1, 0.2)
/// .reference_rate(1.0)
/// .build()
/// .unwrap();
///
/// assert_eq!(tank.locations().len(), 2);
/// assert_eq!(tank.transitions().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct EnergyTank {
    name: Arc<str>,
    tank: Variable,
    reference: Variable,
    checkpoint: Variable,
    low: Expr,
    high: Expr,
    depletion: Expr,
    recharge: Expr,
    reference_rate: Expr,
    moving: Vec<DifferentialAssignment>,
    stationary: Vec<DifferentialAssignment>,
}

impl EnergyTank {
    /// Starts a supervisor over the given tank, reference, and checkpoint
    /// quantities, with unit thresholds and rates left at zero.
    #[must_use]
    pub fn new(
        name: impl Into<Arc<str>>,
        tank: &Variable,
        reference: &Variable,
        checkpoint: &Variable,
    ) -> Self {
        Self {
            name: name.into(),
            tank: tank.clone(),
            reference: reference.clone(),
            checkpoint: checkpoint.clone(),
            low: Expr::zero(),
            high: Expr::literal(1.0),
            depletion: Expr::zero(),
            recharge: Expr::zero(),
            reference_rate: Expr::zero(),
            moving: Vec::new(),
            stationary: Vec::new(),
        }
    }

    /// Tank levels at which the reference stops and resumes.
    #[must_use]
    pub fn thresholds(mut self, low: impl Into<Expr>, high: impl Into<Expr>) -> Self {
        self.low = low.into();
        self.high = high.into();
        self
    }

    /// Drain rate while moving and recharge rate while stationary, both
    /// given as positive magnitudes.
    #[must_use]
    pub fn rates(mut self, depletion: impl Into<Expr>, recharge: impl Into<Expr>) -> Self {
        self.depletion = depletion.into();
        self.recharge = recharge.into();
        self
    }

    /// Rate of the reference while moving.
    #[must_use]
    pub fn reference_rate(mut self, rate: impl Into<Expr>) -> Self {
        self.reference_rate = rate.into();
        self
    }

    /// Further differential assignments active while moving.
    #[must_use]
    pub fn moving(mut self, assignments: Vec<DifferentialAssignment>) -> Self {
        self.moving.extend(assignments);
        self
    }

    /// Further differential assignments active while stationary.
    #[must_use]
    pub fn stationary(mut self, assignments: Vec<DifferentialAssignment>) -> Self {
        self.stationary.extend(assignments);
        self
    }

    /// Builds the supervisor automaton.
    ///
    /// # Errors
    ///
    /// Returns a [`MalformedModel`] if the extra assignments conflict with
    /// the supervisor's own, for example by also integrating the tank.
    pub fn build(self) -> Result<AtomicAutomaton, MalformedModel> {
        let Self {
            name,
            tank,
            reference,
            checkpoint,
            low,
            high,
            depletion,
            recharge,
            reference_rate,
            moving,
            stationary,
        } = self;

        let mut moving_dynamics = vec![
            dot(&tank).be(-depletion),
            dot(&reference).be(reference_rate),
            dot(&checkpoint).be(0.0),
        ];
        moving_dynamics.extend(moving);

        let mut stationary_dynamics = vec![
            dot(&tank).be(recharge),
            dot(&reference).be(0.0),
            dot(&checkpoint).be(0.0),
        ];
        stationary_dynamics.extend(stationary);

        AtomicAutomaton::builder(name)
            .new_mode(MOVING, Dynamics::from(moving_dynamics))
            .new_mode(STATIONARY, Dynamics::from(stationary_dynamics))
            .new_transition(
                MOVING,
                &Event::new(TO_STOP),
                STATIONARY,
                vec![next(&checkpoint).be(&reference), next(&reference).be(0.0)],
                Guard::leq(&tank, low),
                EventKind::Urgent,
            )
            .new_transition(
                STATIONARY,
                &Event::new(TO_MOVE),
                MOVING,
                vec![next(&reference).be(&checkpoint)],
                Guard::geq(&tank, high),
                EventKind::Urgent,
            )
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use braid_automata::compose;
    use braid_core::Interval;
    use braid_evolution::{Configuration, EvolutionTime, HybridSet, Semantics, evolve};
    use braid_solvers::flow::PointIntegrator;

    use approx::assert_relative_eq;

    fn quantities() -> (Variable, Variable, Variable) {
        (
            Variable::new("energy"),
            Variable::new("reference"),
            Variable::new("saved"),
        )
    }

    #[test]
    fn builds_two_urgent_transitions() {
        let (energy, reference, saved) = quantities();
        let tank = EnergyTank::new("tank", &energy, &reference, &saved)
            .thresholds(0.1, 1.0)
            .rates(0.1, 0.2)
            .build()
            .unwrap();

        let names: Vec<&str> = tank.locations().iter().map(|l| l.name()).collect();
        assert_eq!(names, [MOVING, STATIONARY]);
        assert!(tank.transitions().iter().all(|t| t.kind == EventKind::Urgent));
        assert_eq!(tank.state_variables().len(), 3);
    }

    #[test]
    fn rejects_conflicting_extra_dynamics() {
        let (energy, reference, saved) = quantities();
        let result = EnergyTank::new("tank", &energy, &reference, &saved)
            .moving(vec![dot(&energy).be(1.0)])
            .build();
        assert!(matches!(
            result,
            Err(MalformedModel::DuplicateAssignment { .. })
        ));
    }

    #[test]
    fn stops_and_restores_the_reference() {
        let (energy, reference, saved) = quantities();
        let tank = EnergyTank::new("tank", &energy, &reference, &saved)
            .thresholds(0.5, 1.0)
            .rates(0.5, 1.0)
            .reference_rate(1.0)
            .build()
            .unwrap();
        let system = compose(vec![tank]).unwrap();

        let initial = HybridSet::new(&[("tank", MOVING)])
            .with(&energy, 1.0)
            .with(&reference, 0.0)
            .with(&saved, 0.0);
        let orbit = evolve(
            &system,
            PointIntegrator::default(),
            Configuration::default(),
            &initial,
            EvolutionTime::new(2.0, 10),
            Semantics::Upper,
        )
        .unwrap();

        // Drains from 1.0 to 0.5 at rate 0.5, then recharges at rate 1.0.
        let stops = orbit.jump_times(TO_STOP);
        let moves = orbit.jump_times(TO_MOVE);
        assert_eq!(stops.len(), 1);
        assert_eq!(moves.len(), 1);
        assert_relative_eq!(stops[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(moves[0], 1.5, epsilon = 1e-6);

        let jumps: Vec<_> = orbit.samples().filter(|s| s.is_jump()).collect();
        assert_eq!(jumps[0].state.get("reference"), Some(Interval::point(0.0)));
        assert_eq!(jumps[1].state.get("reference"), jumps[0].state.get("saved"));
        assert_relative_eq!(jumps[0].state.get("saved").unwrap().lo(), 1.0, epsilon = 1e-6);
    }
}
