use std::f64::consts::TAU;

use braid_automata::{AtomicAutomaton, CompositeAutomaton, Error, MalformedModel, compose};
use braid_core::{Constant, Dynamics, Variable, cos, dot, let_};
use braid_evolution::HybridSet;

use crate::{EnergyTank, MOVING};

/// Constants of the teleoperation model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeleopParameters {
    /// Master motor inertia.
    pub master_inertia: f64,
    /// Slave motor inertia.
    pub slave_inertia: f64,
    /// Proportional gain of both controllers.
    pub gain: f64,
    /// Amplitude of the sinusoidal master reference.
    pub amplitude: f64,
    /// Frequency of the master reference, in cycles per time unit.
    pub frequency: f64,
    /// Tank recharge rate while stationary.
    pub recharge: f64,
    /// Tank drain rate while moving.
    pub depletion: f64,
    /// Tank level at which the master reference stops.
    pub stop_level: f64,
    /// Tank level at which the master reference resumes.
    pub resume_level: f64,
    /// Initial tank level.
    pub initial_energy: f64,
}

impl Default for TeleopParameters {
    fn default() -> Self {
        Self {
            master_inertia: 2.2,
            slave_inertia: 0.2,
            gain: 10.2,
            amplitude: 1.0,
            frequency: 0.25,
            recharge: 0.2,
            depletion: 0.1,
            stop_level: 0.1,
            resume_level: 1.0,
            initial_energy: 0.5,
        }
    }
}

/// The quantities shared across the teleoperation automata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantities {
    pub t: Variable,
    pub torque_m: Variable,
    pub position_m: Variable,
    pub velocity_m: Variable,
    pub ref_m: Variable,
    pub old_ref_m: Variable,
    pub energy_tank_m: Variable,
    pub torque_s: Variable,
    pub position_s: Variable,
    pub velocity_s: Variable,
    pub ref_s: Variable,
    pub pos_err: Variable,
}

impl Default for Quantities {
    fn default() -> Self {
        Self {
            t: Variable::new("t"),
            torque_m: Variable::new("torque_m"),
            position_m: Variable::new("position_m"),
            velocity_m: Variable::new("velocity_m"),
            ref_m: Variable::new("ref_m"),
            old_ref_m: Variable::new("old_ref_m"),
            energy_tank_m: Variable::new("energy_tank_m"),
            torque_s: Variable::new("torque_s"),
            position_s: Variable::new("position_s"),
            velocity_s: Variable::new("velocity_s"),
            ref_s: Variable::new("ref_s"),
            pos_err: Variable::new("pos_err"),
        }
    }
}

impl Quantities {
    /// The state variables of [`master_system`], which [`initial_set`] pins.
    #[must_use]
    pub fn state(&self) -> [&Variable; 9] {
        [
            &self.position_m,
            &self.velocity_m,
            &self.ref_m,
            &self.position_s,
            &self.velocity_s,
            &self.ref_s,
            &self.t,
            &self.energy_tank_m,
            &self.old_ref_m,
        ]
    }
}

/// The master motor: `velocity_m' = torque_m / Jm`, `position_m' = velocity_m`.
///
/// # Errors
///
/// Never fails for the fixed model; the result type mirrors [`AtomicAutomaton::new`].
pub fn motor_master(params: &TeleopParameters) -> Result<AtomicAutomaton, MalformedModel> {
    let q = Quantities::default();
    let jm = Constant::new("Jm", params.master_inertia);
    AtomicAutomaton::builder("motor_master")
        .new_mode(
            MOVING,
            Dynamics::from(vec![
                dot(&q.velocity_m).be(&q.torque_m / jm),
                dot(&q.position_m).be(&q.velocity_m),
            ]),
        )
        .build()
}

/// The slave motor: `velocity_s' = torque_s / Jm`, `position_s' = velocity_s`.
///
/// # Errors
///
/// Never fails for the fixed model.
pub fn motor_slave(params: &TeleopParameters) -> Result<AtomicAutomaton, MalformedModel> {
    let q = Quantities::default();
    let jm = Constant::new("Jm", params.slave_inertia);
    AtomicAutomaton::builder("motor_slave")
        .new_mode(
            MOVING,
            Dynamics::from(vec![
                dot(&q.velocity_s).be(&q.torque_s / jm),
                dot(&q.position_s).be(&q.velocity_s),
            ]),
        )
        .build()
}

/// Proportional controllers closing both loops.
///
/// The master tracks `ref_m` in velocity and the slave tracks `ref_s` in
/// position; `pos_err` measures how far the slave lags the master.
///
/// # Errors
///
/// Never fails for the fixed model.
pub fn motor_controllers(params: &TeleopParameters) -> Result<AtomicAutomaton, MalformedModel> {
    let q = Quantities::default();
    let kp = Constant::new("Kp", params.gain);
    AtomicAutomaton::builder("motor_controllers")
        .new_mode(
            MOVING,
            Dynamics::from(vec![
                let_(&q.torque_m).be(&kp * (&q.ref_m - &q.velocity_m)),
                let_(&q.torque_s).be(&kp * (&q.ref_s - &q.position_s)),
                let_(&q.pos_err).be(&q.position_m - &q.position_s),
            ]),
        )
        .build()
}

/// The energy-tank supervisor generating the master reference.
///
/// While moving, `ref_m` follows the derivative of
/// `amp * sin(2 pi freq t)` and the tank drains; while stationary the
/// reference clock `t` and `ref_m` are frozen and the tank recharges. The
/// slave reference integrates the master velocity in both locations.
///
/// # Errors
///
/// Never fails for the fixed model.
pub fn teleop_system(params: &TeleopParameters) -> Result<AtomicAutomaton, MalformedModel> {
    let q = Quantities::default();
    let amp = Constant::new("amp", params.amplitude);
    let freq = Constant::new("freq", params.frequency);
    let alpha = Constant::new("alpha", params.recharge);
    let beta = Constant::new("beta", params.depletion);

    let reference_rate = &amp * TAU * &freq * cos(TAU * &q.t * &freq);

    EnergyTank::new("teleop_system", &q.energy_tank_m, &q.ref_m, &q.old_ref_m)
        .thresholds(params.stop_level, params.resume_level)
        .rates(beta, alpha)
        .reference_rate(reference_rate)
        .moving(vec![dot(&q.t).be(1.0), dot(&q.ref_s).be(&q.velocity_m)])
        .stationary(vec![dot(&q.t).be(0.0), dot(&q.ref_s).be(&q.velocity_m)])
        .build()
}

/// Composes master, slave, supervisor, and controllers, in that order.
///
/// # Errors
///
/// Returns an error if a member cannot be built or the members conflict.
pub fn master_system(params: &TeleopParameters) -> Result<CompositeAutomaton, Error> {
    compose(vec![
        motor_master(params)?,
        motor_slave(params)?,
        teleop_system(params)?,
        motor_controllers(params)?,
    ])
}

/// Every automaton moving, the tank at its initial level, everything else
/// at rest.
#[must_use]
pub fn initial_set(params: &TeleopParameters) -> HybridSet {
    let q = Quantities::default();
    let location = [
        ("motor_master", MOVING),
        ("motor_slave", MOVING),
        ("teleop_system", MOVING),
        ("motor_controllers", MOVING),
    ];
    q.state()
        .into_iter()
        .fold(HybridSet::new(&location), |set, variable| {
            let value = if *variable == q.energy_tank_m {
                params.initial_energy
            } else {
                0.0
            };
            set.with(variable, value)
        })
}
