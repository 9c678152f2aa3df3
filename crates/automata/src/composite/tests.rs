use std::collections::BTreeSet;

use approx::assert_relative_eq;
use braid_core::{Dynamics, Guard, Variable, VectorField, dot, let_, next};

use super::*;

/// Two locations toggled by `event`, integrating `var` up or down.
fn toggle(name: &str, var: &str, event: &Event, kind: EventKind) -> AtomicAutomaton {
    let x = Variable::new(var);
    AtomicAutomaton::builder(name)
        .new_mode("up", Dynamics::from(vec![dot(&x).be(1.0)]))
        .new_mode("down", Dynamics::from(vec![dot(&x).be(-1.0)]))
        .new_transition("up", event, "down", vec![], Guard::geq(&x, 1.0), kind)
        .new_transition("down", event, "up", vec![], Guard::leq(&x, 0.0), kind)
        .build()
        .unwrap()
}

fn labels(location: &CompositeLocation) -> Vec<(String, String)> {
    location
        .labels()
        .map(|(a, l)| (a.to_string(), l.to_string()))
        .collect()
}

#[test]
fn state_space_is_the_union_of_integrated_variables() {
    let system = compose(vec![
        toggle("a", "x", &Event::new("e"), EventKind::Urgent),
        toggle("b", "y", &Event::new("f"), EventKind::Urgent),
    ])
    .unwrap();

    let names: Vec<&str> = system
        .state_space()
        .variables()
        .iter()
        .map(Variable::name)
        .collect();
    assert_eq!(names, ["x", "y"]);
    assert!(!system.is_shared(&Event::new("e")));
}

#[test]
fn private_events_interleave() {
    let system = compose(vec![
        toggle("a", "x", &Event::new("e"), EventKind::Urgent),
        toggle("b", "y", &Event::new("f"), EventKind::Urgent),
    ])
    .unwrap();
    let start = system.location(&[("a", "up"), ("b", "up")]).unwrap();

    let transitions = system.transitions(&start).unwrap();
    assert_eq!(transitions.len(), 2);
    assert_eq!(transitions[0].event, Event::new("e"));
    assert_eq!(transitions[0].target.location_of("a"), Some("down"));
    assert_eq!(transitions[0].target.location_of("b"), Some("up"));
    assert_eq!(transitions[1].participants, vec![(1, TransitionId(0))]);
}

#[test]
fn shared_events_fire_in_lock_step() {
    let sync = Event::new("sync");
    let system = compose(vec![
        toggle("a", "x", &sync, EventKind::Permissive),
        toggle("b", "y", &sync, EventKind::Urgent),
    ])
    .unwrap();
    let start = system.location(&[("a", "up"), ("b", "up")]).unwrap();

    let transitions = system.transitions(&start).unwrap();
    assert_eq!(transitions.len(), 1);

    let transition = &transitions[0];
    assert!(system.is_shared(&sync));
    assert_eq!(transition.kind, EventKind::Urgent);
    assert_eq!(
        labels(&transition.target),
        vec![
            ("a".to_string(), "down".to_string()),
            ("b".to_string(), "down".to_string())
        ]
    );
    assert_eq!(transition.guard.to_string(), "x>=1 && y>=1");
}

#[test]
fn shared_event_blocks_without_every_participant() {
    let sync = Event::new("sync");
    let x = Variable::new("x");
    let idle = AtomicAutomaton::builder("idle")
        .new_mode("wait", Dynamics::from(vec![dot(&x).be(0.0)]))
        .new_mode("ready", Dynamics::from(vec![dot(&x).be(0.0)]))
        .new_transition("ready", &sync, "wait", vec![], Guard::True, EventKind::Urgent)
        .build()
        .unwrap();

    let system = compose(vec![
        idle,
        toggle("b", "y", &sync, EventKind::Urgent),
    ])
    .unwrap();

    let waiting = system.location(&[("idle", "wait"), ("b", "up")]).unwrap();
    assert!(system.transitions(&waiting).unwrap().is_empty());

    let ready = system.location(&[("idle", "ready"), ("b", "up")]).unwrap();
    assert_eq!(system.transitions(&ready).unwrap().len(), 1);
}

#[test]
fn shared_event_takes_every_combination() {
    let sync = Event::new("sync");
    let x = Variable::new("x");
    let y = Variable::new("y");

    let fork = |name: &str, var: &Variable| {
        AtomicAutomaton::builder(name)
            .new_mode("s", Dynamics::from(vec![dot(var).be(0.0)]))
            .new_mode("l", Dynamics::from(vec![dot(var).be(0.0)]))
            .new_mode("r", Dynamics::from(vec![dot(var).be(0.0)]))
            .new_transition("s", &sync, "l", vec![], Guard::True, EventKind::Urgent)
            .new_transition("s", &sync, "r", vec![], Guard::True, EventKind::Urgent)
            .build()
            .unwrap()
    };

    let system = compose(vec![fork("a", &x), fork("b", &y)]).unwrap();
    let start = system.location(&[("a", "s"), ("b", "s")]).unwrap();

    let targets: BTreeSet<_> = system
        .transitions(&start)
        .unwrap()
        .into_iter()
        .map(|t| labels(&t.target))
        .collect();
    assert_eq!(targets.len(), 4);
}

#[test]
fn shared_reset_is_a_conflict() {
    let sync = Event::new("sync");
    let x = Variable::new("x");
    let y = Variable::new("y");

    let resetting = |name: &str, var: &Variable| {
        AtomicAutomaton::builder(name)
            .new_mode("m", Dynamics::from(vec![dot(var).be(1.0)]))
            .new_transition(
                "m",
                &sync,
                "m",
                vec![next(&x).be(0.0)],
                Guard::True,
                EventKind::Urgent,
            )
            .build()
            .unwrap()
    };

    let result = compose(vec![resetting("a", &x), resetting("b", &y)]);
    assert!(matches!(
        result,
        Err(Error::ConflictingDynamics(ConflictingDynamics::SharedReset { .. }))
    ));
}

#[test]
fn shared_definition_is_a_conflict() {
    let result = compose(vec![
        toggle("a", "x", &Event::new("e"), EventKind::Urgent),
        toggle("b", "x", &Event::new("f"), EventKind::Urgent),
    ]);
    assert!(matches!(
        result,
        Err(Error::ConflictingDynamics(ConflictingDynamics::SharedDefinition { first, second, .. }))
            if first == "a|up" && second == "b|up"
    ));
}

#[test]
fn algebraic_and_differential_across_members_conflict() {
    let x = Variable::new("x");
    let algebraic = AtomicAutomaton::builder("alg")
        .new_mode("m", Dynamics::from(vec![let_(&x).be(1.0)]))
        .build()
        .unwrap();

    let result = compose(vec![
        toggle("a", "x", &Event::new("e"), EventKind::Urgent),
        algebraic,
    ]);
    assert!(matches!(
        result,
        Err(Error::ConflictingDynamics(ConflictingDynamics::SharedDefinition { .. }))
    ));
}

#[test]
fn duplicate_member_names_are_rejected() {
    let result = compose(vec![
        toggle("a", "x", &Event::new("e"), EventKind::Urgent),
        toggle("a", "y", &Event::new("f"), EventKind::Urgent),
    ]);
    assert!(matches!(
        result,
        Err(Error::MalformedModel(MalformedModel::DuplicateAutomaton { .. }))
    ));
}

#[test]
fn reset_of_a_non_state_variable_is_rejected() {
    let x = Variable::new("x");
    let z = Variable::new("z");
    let go = Event::new("go");
    let automaton = AtomicAutomaton::builder("a")
        .new_mode(
            "m",
            Dynamics::new()
                .with_algebraic([let_(&z).be(1.0)])
                .with_differential([dot(&x).be(1.0)]),
        )
        .new_transition("m", &go, "m", vec![next(&z).be(0.0)], Guard::True, EventKind::Urgent)
        .build()
        .unwrap();

    assert!(matches!(
        compose(vec![automaton]),
        Err(Error::ConflictingDynamics(ConflictingDynamics::NonStateReset { .. }))
    ));
}

#[test]
fn mode_orders_algebraic_assignments_across_members() {
    let x = Variable::new("x");
    let y = Variable::new("y");
    let z = Variable::new("z");

    // `y` reads `z`, which a later member defines from the state.
    let reader = AtomicAutomaton::builder("reader")
        .new_mode(
            "m",
            Dynamics::new()
                .with_algebraic([let_(&y).be(&z + 1.0)])
                .with_differential([dot(&x).be(&y)]),
        )
        .build()
        .unwrap();
    let writer = AtomicAutomaton::builder("writer")
        .new_mode("m", Dynamics::from(vec![let_(&z).be(2.0 * &x)]))
        .build()
        .unwrap();

    let system = compose(vec![reader, writer]).unwrap();
    let location = system.location(&[("reader", "m"), ("writer", "m")]).unwrap();
    let mode = system.mode(&location).unwrap();

    let order: Vec<&str> = mode.algebraic().iter().map(|a| a.target().name()).collect();
    assert_eq!(order, ["z", "y"]);

    let rate = mode.derivative(&[3.0]).unwrap();
    assert_relative_eq!(rate[0], 7.0);

    let auxiliary = mode.auxiliary(&[3.0]).unwrap();
    assert_relative_eq!(auxiliary["y"], 7.0);
    assert_relative_eq!(auxiliary["z"], 6.0);

    assert_eq!(mode.inline(&Expr::from(&y)).to_string(), "2*x+1");
    assert_eq!(mode.lie_derivative(&Expr::from(&x)).to_string(), "2*x+1");
}

#[test]
fn algebraic_loop_is_reported_with_its_members() {
    let a = Variable::new("a");
    let b = Variable::new("b");
    let x = Variable::new("x");
    let automaton = AtomicAutomaton::builder("loop")
        .new_mode(
            "m",
            Dynamics::new()
                .with_algebraic([let_(&a).be(&b + 1.0), let_(&b).be(&a * 2.0)])
                .with_differential([dot(&x).be(&a)]),
        )
        .build()
        .unwrap();

    let system = compose(vec![automaton]).unwrap();
    let location = system.location(&[("loop", "m")]).unwrap();

    let error = system.mode(&location).unwrap_err();
    assert_eq!(
        error,
        Error::ConflictingDynamics(ConflictingDynamics::AlgebraicLoop {
            location: "(loop|m)".into(),
            quantities: vec!["a".into(), "b".into()],
        })
    );
}

#[test]
fn undefined_reads_are_reported_when_the_mode_is_built() {
    let x = Variable::new("x");
    let y = Variable::new("y");
    let automaton = AtomicAutomaton::builder("open")
        .new_mode("m", Dynamics::from(vec![dot(&x).be(&y)]))
        .build()
        .unwrap();

    let system = compose(vec![automaton]).unwrap();
    let location = system.location(&[("open", "m")]).unwrap();

    assert!(matches!(
        system.mode(&location),
        Err(Error::ConflictingDynamics(ConflictingDynamics::UndefinedQuantity { quantity, .. }))
            if &*quantity == "y"
    ));
}

#[test]
fn unintegrated_state_variables_hold() {
    let x = Variable::new("x");
    let y = Variable::new("y");
    let automaton = AtomicAutomaton::builder("partial")
        .new_mode("both", Dynamics::from(vec![dot(&x).be(1.0), dot(&y).be(1.0)]))
        .new_mode("one", Dynamics::from(vec![dot(&x).be(1.0)]))
        .build()
        .unwrap();

    let system = compose(vec![automaton]).unwrap();
    let location = system.location(&[("partial", "one")]).unwrap();
    let mode = system.mode(&location).unwrap();

    assert_eq!(mode.derivative(&[0.0, 0.0]).unwrap(), vec![1.0, 0.0]);
    assert_eq!(mode.rate("y"), Some(&Expr::zero()));
}

#[test]
fn location_lookup_errors() {
    let system = compose(vec![
        toggle("a", "x", &Event::new("e"), EventKind::Urgent),
        toggle("b", "y", &Event::new("f"), EventKind::Urgent),
    ])
    .unwrap();

    assert!(matches!(
        system.location(&[("a", "up")]),
        Err(Error::MissingLocation { automaton }) if &*automaton == "b"
    ));
    assert!(matches!(
        system.location(&[("a", "up"), ("b", "sideways")]),
        Err(Error::UnknownLocation { .. })
    ));
    assert!(matches!(
        system.location(&[("a", "up"), ("b", "up"), ("c", "up")]),
        Err(Error::UnknownAutomaton { .. })
    ));

    let location = system.location(&[("b", "down"), ("a", "up")]).unwrap();
    assert_eq!(location.to_string(), "(a|up,b|down)");
    assert_eq!(system.project(&location, "b").unwrap().name(), "down");
}

#[test]
fn composition_is_commutative() {
    let sync = Event::new("sync");
    let members = || {
        vec![
            toggle("a", "x", &sync, EventKind::Urgent),
            toggle("b", "y", &Event::new("f"), EventKind::Urgent),
            toggle("c", "z", &sync, EventKind::Permissive),
        ]
    };

    let forward = compose(members()).unwrap();
    let mut reversed_members = members();
    reversed_members.reverse();
    let reversed = compose(reversed_members).unwrap();

    let start = [("a", "up"), ("b", "up"), ("c", "up")];
    let forward_graph = forward.discrete_reachability([forward.location(&start).unwrap()]);
    let reversed_graph = reversed.discrete_reachability([reversed.location(&start).unwrap()]);

    let nodes = |graph: &DiscreteGraph| -> BTreeSet<_> {
        graph.locations().map(CompositeLocation::label_map).collect()
    };
    let edges = |graph: &DiscreteGraph| -> BTreeSet<_> {
        graph
            .edges()
            .map(|(s, e, t)| (s.label_map(), e.clone(), t.label_map()))
            .collect()
    };

    assert_eq!(nodes(&forward_graph), nodes(&reversed_graph));
    assert_eq!(edges(&forward_graph), edges(&reversed_graph));
    assert_eq!(forward_graph.location_count(), 4);
}

#[test]
fn composition_is_associative() {
    let sync = Event::new("sync");
    let a = || toggle("a", "x", &sync, EventKind::Urgent);
    let b = || toggle("b", "y", &Event::new("f"), EventKind::Urgent);
    let c = || toggle("c", "z", &sync, EventKind::Urgent);

    let left = compose(vec![compose(vec![a(), b()]).unwrap().flatten("ab").unwrap(), c()]).unwrap();
    let right = compose(vec![a(), compose(vec![b(), c()]).unwrap().flatten("bc").unwrap()]).unwrap();
    let flat = compose(vec![a(), b(), c()]).unwrap();

    let left_graph = left.discrete_reachability([left.location(&[("ab", "up|up"), ("c", "up")]).unwrap()]);
    let right_graph =
        right.discrete_reachability([right.location(&[("a", "up"), ("bc", "up|up")]).unwrap()]);
    let flat_graph = flat.discrete_reachability([flat
        .location(&[("a", "up"), ("b", "up"), ("c", "up")])
        .unwrap()]);

    // Relabel every location as the member location names in a, b, c order.
    let names = |location: &CompositeLocation| -> String {
        location
            .labels()
            .map(|(_, l)| l)
            .collect::<Vec<_>>()
            .join("|")
    };
    let edges = |graph: &DiscreteGraph| -> BTreeSet<(String, String, String)> {
        graph
            .edges()
            .map(|(s, e, t)| (names(s), e.to_string(), names(t)))
            .collect()
    };

    assert_eq!(edges(&left_graph), edges(&flat_graph));
    assert_eq!(edges(&right_graph), edges(&flat_graph));
    assert_eq!(left_graph.location_count(), flat_graph.location_count());
}

#[test]
fn decomposition_returns_the_original_members() {
    let members = vec![
        toggle("a", "x", &Event::new("sync"), EventKind::Urgent),
        toggle("b", "y", &Event::new("sync"), EventKind::Permissive),
    ];
    let system = compose(members.clone()).unwrap();

    let start = system.location(&[("a", "up"), ("b", "up")]).unwrap();
    for transition in system.transitions(&start).unwrap() {
        for &(member, id) in &transition.participants {
            let original = &members[member];
            let record = original.transition(id);
            assert_eq!(record.source, start.local(member));
            assert_eq!(record.target, transition.target.local(member));
        }
    }

    assert_eq!(system.into_components(), members);
}

#[test]
fn locations_of_other_composites_are_rejected() {
    let small = compose(vec![toggle("a", "x", &Event::new("flip"), EventKind::Urgent)]).unwrap();
    let large = compose(vec![
        toggle("a", "x", &Event::new("flip"), EventKind::Urgent),
        toggle("b", "y", &Event::new("flop"), EventKind::Urgent),
    ])
    .unwrap();
    let renamed = compose(vec![toggle("c", "x", &Event::new("flip"), EventKind::Urgent)]).unwrap();

    let foreign = large.location(&[("a", "down"), ("b", "down")]).unwrap();
    assert!(!small.contains(&foreign));
    assert!(small.project(&foreign, "a").is_none());
    assert!(matches!(
        small.transitions(&foreign),
        Err(Error::ForeignLocation { .. })
    ));
    assert!(matches!(small.mode(&foreign), Err(Error::ForeignLocation { .. })));

    let same_shape = renamed.location(&[("c", "up")]).unwrap();
    assert!(!small.contains(&same_shape));

    let own = small.location(&[("a", "down")]).unwrap();
    assert!(small.contains(&own));
    assert_eq!(small.project(&own, "a").unwrap().name(), "down");
}
