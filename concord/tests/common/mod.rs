#![allow(dead_code)]

use concord::{
    Action, DispatchError, Dispatcher, Snapshot, Store, StoreConfig, StoreDefinition, WaitFor,
};
use std::rc::Rc;

// ============================================================================
// Test Action Types
// ============================================================================

pub type Bus = Rc<Dispatcher<Action<i64>>>;
pub type Wait<'a> = WaitFor<'a, Action<i64>>;

pub fn bus() -> Bus {
    Rc::new(Dispatcher::builder().label("test").build())
}

// ============================================================================
// Test Stores
// ============================================================================

/// `(state = 0, action) => action.type == "inc" ? state + 1 : state`
pub fn increment(
    state: &Snapshot<i64>,
    action: &Action<i64>,
    _: &Wait<'_>,
) -> Result<Snapshot<i64>, DispatchError> {
    if action.is("inc") {
        Ok(Snapshot::new(**state + 1))
    } else {
        Ok(state.clone())
    }
}

pub fn counter(bus: &Bus) -> Store<i64, i64> {
    Store::new(bus, StoreDefinition::reducer(0, increment)).unwrap()
}

/// A config store adding the action data on `action_type`.
pub fn adder(bus: &Bus, action_type: &str) -> Store<i64, i64> {
    let config = StoreConfig::<i64, i64>::new()
        .on(action_type, |state, amount, _| Ok(Snapshot::new(**state + amount)));
    Store::new(bus, config.into()).unwrap()
}

/// A config store holding a label, renamed on `"rename"` unless unchanged.
pub fn labeller(bus: &Bus) -> Store<String, i64> {
    let config = StoreConfig::<String, i64>::with_initializer(|| "start".to_owned()).on(
        "rename",
        |state, suffix, _| {
            let next = format!("label-{suffix}");
            if **state == next {
                Ok(state.clone())
            } else {
                Ok(Snapshot::new(next))
            }
        },
    );
    Store::new(bus, config.into()).unwrap()
}
