//! Ordering, cycle and reentrancy behaviour of the dispatcher.

use concord::{DispatchError, DispatchToken, Dispatcher, testing::OrderRecorder};
use std::{cell::RefCell, rc::Rc};

type Deps = Rc<RefCell<Vec<DispatchToken>>>;

#[test]
fn test_tokens_strictly_increase() {
    let dispatcher = Dispatcher::<()>::new();
    let mut previous = None;
    for _ in 0..100 {
        let token = dispatcher.register(|_, _| Ok(()));
        if let Some(previous) = previous {
            assert!(token > previous);
        }
        previous = Some(token);
    }
}

#[test]
fn test_wait_for_many_gives_a_b_c() {
    let dispatcher = Dispatcher::<u8>::new();
    let order = OrderRecorder::new();
    let deps = Deps::default();

    let a = order.register(&dispatcher, "a");
    let b = order.register(&dispatcher, "b");
    order.register_waiting(&dispatcher, "c", deps.clone());
    *deps.borrow_mut() = vec![a, b];

    dispatcher.dispatch(0).unwrap();

    assert_eq!(order.entries(), ["a", "b", "c"]);
}

#[test]
fn test_waiter_registered_first_runs_last() {
    let dispatcher = Dispatcher::<u8>::new();
    let order = OrderRecorder::new();
    let deps = Deps::default();

    order.register_waiting(&dispatcher, "c", deps.clone());
    let a = order.register(&dispatcher, "a");
    let b = order.register(&dispatcher, "b");
    *deps.borrow_mut() = vec![b, a];

    dispatcher.dispatch(0).unwrap();

    assert_eq!(order.entries(), ["b", "a", "c"]);
}

#[test]
fn test_transitive_waits_resolve_depth_first() {
    let dispatcher = Dispatcher::<u8>::new();
    let order = OrderRecorder::new();
    let first_deps = Deps::default();
    let second_deps = Deps::default();

    // first -> second -> third
    order.register_waiting(&dispatcher, "first", first_deps.clone());
    let second = order.register_waiting(&dispatcher, "second", second_deps.clone());
    let third = order.register(&dispatcher, "third");
    *first_deps.borrow_mut() = vec![second];
    *second_deps.borrow_mut() = vec![third];

    dispatcher.dispatch(0).unwrap();
    dispatcher.dispatch(1).unwrap();

    assert_eq!(
        order.entries(),
        ["third", "second", "first", "third", "second", "first"]
    );
}

#[test]
fn test_cycle_detected_in_either_registration_order() {
    for reversed in [false, true] {
        let dispatcher = Dispatcher::<u8>::new();
        let order = OrderRecorder::new();
        let a_deps = Deps::default();
        let b_deps = Deps::default();

        let (a, b) = if reversed {
            let b = order.register_waiting(&dispatcher, "b", b_deps.clone());
            let a = order.register_waiting(&dispatcher, "a", a_deps.clone());
            (a, b)
        } else {
            let a = order.register_waiting(&dispatcher, "a", a_deps.clone());
            let b = order.register_waiting(&dispatcher, "b", b_deps.clone());
            (a, b)
        };
        *a_deps.borrow_mut() = vec![b];
        *b_deps.borrow_mut() = vec![a];

        let err = dispatcher.dispatch(0).unwrap_err();
        assert!(matches!(err, DispatchError::CircularDependency(_)));
        assert!(order.entries().is_empty());
        assert!(!dispatcher.is_dispatching());
    }
}

#[test]
fn test_longer_cycle_is_detected() {
    let dispatcher = Dispatcher::<u8>::new();
    let order = OrderRecorder::new();
    let deps: Vec<Deps> = (0..3).map(|_| Deps::default()).collect();

    let tokens: Vec<_> = ["x", "y", "z"]
        .iter()
        .zip(&deps)
        .map(|(name, deps)| order.register_waiting(&dispatcher, name, deps.clone()))
        .collect();
    for (index, deps) in deps.iter().enumerate() {
        *deps.borrow_mut() = vec![tokens[(index + 1) % tokens.len()]];
    }

    assert!(matches!(
        dispatcher.dispatch(0),
        Err(DispatchError::CircularDependency(_))
    ));
}

#[test]
fn test_dispatcher_recovers_after_cycle() {
    let dispatcher = Dispatcher::<u8>::new();
    let order = OrderRecorder::new();
    let deps = Deps::default();

    let lonely = order.register_waiting(&dispatcher, "lonely", deps.clone());
    *deps.borrow_mut() = vec![lonely];
    assert!(dispatcher.dispatch(0).unwrap_err().is_circular());

    deps.borrow_mut().clear();
    dispatcher.dispatch(1).unwrap();
    assert_eq!(order.entries(), ["lonely"]);
}

#[test]
fn test_wait_for_outside_dispatch() {
    let dispatcher = Dispatcher::<u8>::new();
    let token = dispatcher.register(|_, _| Ok(()));

    assert!(matches!(
        dispatcher.wait_for(&[token]),
        Err(DispatchError::NotDispatching)
    ));
    assert!(matches!(
        dispatcher.waiter().wait_for(&[token]),
        Err(DispatchError::NotDispatching)
    ));
}

#[test]
fn test_dispatch_via_nested_callback_rejected() {
    let dispatcher = Dispatcher::<u8>::new();
    let deps = Deps::default();
    let order = OrderRecorder::new();

    // The nested dispatch happens one level down, inside a waited-on callback.
    order.register_waiting(&dispatcher, "outer", deps.clone());
    let inner = dispatcher.register(|payload: &u8, wait| {
        wait.dispatcher().dispatch(payload + 1)
    });
    *deps.borrow_mut() = vec![inner];

    assert!(matches!(
        dispatcher.dispatch(0),
        Err(DispatchError::AlreadyDispatching)
    ));
    assert!(!dispatcher.is_dispatching());
    assert!(order.entries().is_empty());
}

#[test]
fn test_unregistered_token_skipped_and_unknown() {
    let dispatcher = Dispatcher::<u8>::new();
    let order = OrderRecorder::new();
    let gone = order.register(&dispatcher, "gone");
    order.register(&dispatcher, "kept");

    dispatcher.unregister(gone).unwrap();
    dispatcher.dispatch(0).unwrap();

    assert_eq!(order.entries(), ["kept"]);
    assert!(matches!(
        dispatcher.unregister(gone),
        Err(DispatchError::UnknownToken(token)) if token == gone
    ));
}
