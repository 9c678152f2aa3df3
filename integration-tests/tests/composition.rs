use std::collections::BTreeSet;

use braid_automata::{AtomicAutomaton, CompositeAutomaton, compose};
use braid_evolution::{EvolutionTime, HybridSet, Semantics};
use braid_models::{
    MOVING, STATIONARY, TO_MOVE, TO_STOP, TeleopParameters, initial_set, motor_controllers,
    motor_master, motor_slave, teleop_system,
};
use integration_tests::{EXECUTION_TIME, MAX_TRANSITIONS, evolve_points};

fn members() -> Vec<AtomicAutomaton> {
    let params = TeleopParameters::default();
    vec![
        motor_master(&params).unwrap(),
        motor_slave(&params).unwrap(),
        teleop_system(&params).unwrap(),
        motor_controllers(&params).unwrap(),
    ]
}

fn switching_times(system: &CompositeAutomaton, initial: &HybridSet) -> (Vec<f64>, Vec<f64>) {
    let orbit = evolve_points(
        system,
        initial,
        EvolutionTime::new(EXECUTION_TIME, MAX_TRANSITIONS),
        Semantics::Upper,
    )
    .unwrap();
    (orbit.jump_times(TO_STOP), orbit.jump_times(TO_MOVE))
}

fn state_names(system: &CompositeAutomaton) -> BTreeSet<String> {
    system
        .state_space()
        .variables()
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn member_order_does_not_change_behaviour() {
    let params = TeleopParameters::default();
    let forward = compose(members()).unwrap();
    let mut reversed_members = members();
    reversed_members.reverse();
    let reversed = compose(reversed_members).unwrap();

    assert_eq!(state_names(&forward), state_names(&reversed));

    // Initial sets resolve by automaton name, so one set serves both orders.
    let initial = initial_set(&params);
    let (forward_start, _) = initial.resolve(&forward).unwrap();
    let (reversed_start, _) = initial.resolve(&reversed).unwrap();
    let forward_graph = forward.discrete_reachability([forward_start]);
    let reversed_graph = reversed.discrete_reachability([reversed_start]);
    assert_eq!(forward_graph.location_count(), reversed_graph.location_count());
    assert_eq!(forward_graph.edge_count(), reversed_graph.edge_count());

    assert_eq!(
        switching_times(&forward, &initial),
        switching_times(&reversed, &initial)
    );
}

#[test]
fn nested_composition_matches_flat_composition() {
    let params = TeleopParameters::default();
    let flat = compose(members()).unwrap();

    let mut motors = members();
    let control = motors.split_off(2);
    let supervisor = compose(control).unwrap().flatten("supervisor").unwrap();
    assert_eq!(supervisor.locations().len(), 2);

    motors.push(supervisor);
    let nested = compose(motors).unwrap();
    assert_eq!(state_names(&nested), state_names(&flat));

    let reference = initial_set(&params);
    let moving = format!("{MOVING}|{MOVING}");
    let mut nested_initial = HybridSet::new(&[
        ("motor_master", MOVING),
        ("motor_slave", MOVING),
        ("supervisor", moving.as_str()),
    ]);
    for (variable, bounds) in reference.constraints() {
        nested_initial = nested_initial.with(variable, bounds);
    }

    let (flat_stops, flat_moves) = switching_times(&flat, &reference);
    let (nested_stops, nested_moves) = switching_times(&nested, &nested_initial);
    assert_eq!(flat_stops, nested_stops);
    assert_eq!(flat_moves, nested_moves);

    let (start, _) = nested_initial.resolve(&nested).unwrap();
    let reachable: BTreeSet<String> = nested
        .discrete_reachability([start])
        .locations()
        .filter_map(|l| l.location_of("supervisor").map(str::to_string))
        .collect();
    assert!(reachable.contains(&format!("{STATIONARY}|{MOVING}")));
}

#[test]
fn decomposition_recovers_the_members() {
    let system = compose(members()).unwrap();

    assert_eq!(system.components(), members().as_slice());

    let rebuilt = compose(system.clone().into_components()).unwrap();
    assert_eq!(rebuilt.to_string(), system.to_string());
    assert_eq!(rebuilt.state_space(), system.state_space());
}
