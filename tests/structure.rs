//! Construction contracts: name registries, parameter validation and the
//! place-status state machine.

use spn_simulator::{Namespace, Net, NetError, QueuePolicy};

mod common;

#[test]
fn test_duplicate_and_unknown_names() {
    common::setup();
    let mut net = Net::new("test net");

    net.add_type("my type").unwrap();
    assert_eq!(
        net.add_type("my type"),
        Err(NetError::DuplicateName {
            namespace: Namespace::TokenType,
            name: "my type".into(),
        })
    );

    assert_eq!(
        net.add_place("place 1", "wrong type", QueuePolicy::Fifo),
        Err(NetError::UnknownName {
            namespace: Namespace::TokenType,
            name: "wrong type".into(),
        })
    );

    net.add_place("place 1", "my type", QueuePolicy::Fifo).unwrap();
    assert_eq!(
        net.add_place("place 1", "my type", QueuePolicy::Lifo),
        Err(NetError::DuplicateName {
            namespace: Namespace::Place,
            name: "place 1".into(),
        })
    );
    net.add_place("place 2", "my type", QueuePolicy::Lifo).unwrap();

    net.add_immediate_transition("t1", 1, 1.0).unwrap();
    assert_eq!(
        net.add_timed_transition("t1", |_| 0.1),
        Err(NetError::DuplicateName {
            namespace: Namespace::Transition,
            name: "t1".into(),
        })
    );
    net.add_timed_transition("t2", |_| 0.1).unwrap();

    net.add_constructor("arrivals", "t1", "place 1").unwrap();
    assert_eq!(
        net.add_constructor("arrivals", "t1", "place 1"),
        Err(NetError::DuplicateName {
            namespace: Namespace::Arc,
            name: "arrivals".into(),
        })
    );

    assert!(matches!(
        net.add_destructor("departures", "no such transition", "place 1"),
        Err(NetError::UnknownName {
            namespace: Namespace::Transition,
            ..
        })
    ));
    assert!(matches!(
        net.add_destructor("departures", "t1", "no such place"),
        Err(NetError::UnknownName {
            namespace: Namespace::Place,
            ..
        })
    ));
}

#[test]
fn test_immediate_transition_parameter_validation() {
    common::setup();
    let mut net = Net::new("test net");

    assert_eq!(
        net.add_immediate_transition("t1", 0, 1.0),
        Err(NetError::InvalidPriority {
            transition: "t1".into(),
        })
    );
    for weight in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            net.add_immediate_transition("t1", 1, weight),
            Err(NetError::InvalidWeight { .. })
        ));
    }
    // The failed attempts left no trace.
    assert!(net.transition_id("t1").is_err());
    net.add_immediate_transition("t1", 1, 1.0).unwrap();
}

#[test]
fn test_transfer_type_mismatch() {
    common::setup();
    let mut net = Net::new("test net");
    net.add_type("my type").unwrap();
    net.add_type("your type").unwrap();
    net.add_place("place 1", "my type", QueuePolicy::Fifo).unwrap();
    net.add_place("place 3", "your type", QueuePolicy::Lifo).unwrap();
    net.add_immediate_transition("t1", 1, 1.0).unwrap();

    assert_eq!(
        net.add_transfer("transfers", "t1", "place 1", "place 3"),
        Err(NetError::InvalidTokenType {
            place: "place 3".into(),
            expected: "your type".into(),
            found: "my type".into(),
        })
    );
    assert!(net.arc_id("transfers").is_err());
}

#[test]
fn test_place_feeding_timed_transition_accepts_one_consumer() {
    common::setup();
    let mut net = Net::new("fsm");
    net.add_type("t").unwrap();
    net.add_place("p", "t", QueuePolicy::Fifo).unwrap();
    net.add_timed_transition("timed 1", |_| 1.0).unwrap();
    net.add_timed_transition("timed 2", |_| 1.0).unwrap();
    net.add_immediate_transition("imm", 1, 1.0).unwrap();

    // First consumer from a timed transition makes the place stable.
    net.add_destructor("d1", "timed 1", "p").unwrap();

    // Any further arc incident to the place pointing at a timed transition
    // is rejected and leaves the net unchanged.
    let err = net.add_destructor("d2", "timed 2", "p").unwrap_err();
    assert!(matches!(err, NetError::InvalidStructure { .. }));
    let message = err.to_string();
    assert!(message.contains("'p'"), "message must name the place: {message}");
    assert!(message.contains("'d2'"), "message must name the arc: {message}");
    assert!(message.contains("timed"), "message must name the transition kind");
    assert!(net.arc_id("d2").is_err());

    assert!(matches!(
        net.add_test("t2", "timed 2", "p"),
        Err(NetError::InvalidStructure { .. })
    ));

    // An immediate consumer is also rejected on a stable place...
    assert!(matches!(
        net.add_destructor("d3", "imm", "p"),
        Err(NetError::InvalidStructure { .. })
    ));
    // ...but an immediate non-consumer is fine.
    net.add_test("watch", "imm", "p").unwrap();
    net.add_inhibitor("guard", "p", "imm").unwrap();
}

#[test]
fn test_timed_transition_needs_consumer_arcs() {
    common::setup();
    let mut net = Net::new("fsm");
    net.add_type("t").unwrap();
    net.add_place("p", "t", QueuePolicy::Fifo).unwrap();
    net.add_timed_transition("timed", |_| 1.0).unwrap();

    // A non-consuming presence observer pointing at a timed transition is
    // illegal even on a fresh place.
    assert!(matches!(
        net.add_test("watch", "timed", "p"),
        Err(NetError::InvalidStructure { .. })
    ));
    assert!(matches!(
        net.add_inhibitor("guard", "p", "timed"),
        Err(NetError::InvalidStructure { .. })
    ));
}

#[test]
fn test_transient_place_rejects_timed_arcs() {
    common::setup();
    let mut net = Net::new("fsm");
    net.add_type("t").unwrap();
    net.add_place("p", "t", QueuePolicy::Fifo).unwrap();
    net.add_immediate_transition("imm 1", 1, 1.0).unwrap();
    net.add_immediate_transition("imm 2", 2, 1.0).unwrap();
    net.add_timed_transition("timed", |_| 1.0).unwrap();

    // An immediate consumer makes the place transient.
    net.add_destructor("d1", "imm 1", "p").unwrap();
    // Transient places take any further immediate arcs...
    net.add_destructor("d2", "imm 2", "p").unwrap();
    net.add_test("watch", "imm 2", "p").unwrap();
    // ...but no timed ones.
    assert!(matches!(
        net.add_destructor("d3", "timed", "p"),
        Err(NetError::InvalidStructure { .. })
    ));
}

#[test]
fn test_rebuilding_the_same_net_is_congruent() {
    common::setup();
    let build = || {
        let mut net = Net::new("twin");
        net.add_type("a").unwrap();
        net.add_type("b").unwrap();
        net.add_place("p1", "a", QueuePolicy::Fifo).unwrap();
        net.add_place("p2", "b", QueuePolicy::Lifo).unwrap();
        net.add_immediate_transition("i", 1, 2.0).unwrap();
        net.add_timed_transition("t", |_| 1.0).unwrap();
        net.add_constructor("c", "i", "p1").unwrap();
        net.add_destructor("d", "t", "p1").unwrap();
        net
    };
    let first = build();
    let second = build();
    for name in ["a", "b"] {
        assert_eq!(
            first.token_type_id(name).unwrap(),
            second.token_type_id(name).unwrap()
        );
    }
    for name in ["p1", "p2"] {
        assert_eq!(first.place_id(name).unwrap(), second.place_id(name).unwrap());
    }
    for name in ["i", "t"] {
        assert_eq!(
            first.transition_id(name).unwrap(),
            second.transition_id(name).unwrap()
        );
    }
    for name in ["c", "d"] {
        assert_eq!(first.arc_id(name).unwrap(), second.arc_id(name).unwrap());
    }
    // Ordinals are dense, in creation order.
    assert_eq!(first.place_id("p1").unwrap().0, 0);
    assert_eq!(first.place_id("p2").unwrap().0, 1);
}

#[test]
fn test_duplicate_plugin_names_are_rejected() {
    common::setup();

    struct Noop;
    impl spn_simulator::Plugin for Noop {
        fn name(&self) -> &str {
            "noop"
        }
    }

    let mut net = Net::new("plugins");
    net.register_plugin(Box::new(Noop)).unwrap();
    assert_eq!(
        net.register_plugin(Box::new(Noop)),
        Err(NetError::DuplicateName {
            namespace: Namespace::Plugin,
            name: "noop".into(),
        })
    );
}
