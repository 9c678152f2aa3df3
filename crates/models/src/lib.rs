//! Reference models for the Braid framework.
//!
//! The teleoperation model couples a master and a slave motor through
//! proportional controllers. An [`EnergyTank`] supervisor stops the master
//! reference when its energy budget runs low and resumes it, from where it
//! stopped, once the budget has recharged.

mod energy_tank;
mod teleop;

pub use energy_tank::{EnergyTank, MOVING, STATIONARY, TO_MOVE, TO_STOP};
pub use teleop::{
    Quantities, TeleopParameters, initial_set, master_system, motor_controllers, motor_master,
    motor_slave, teleop_system,
};
