use std::any::Any;
use std::rc::Rc;

use tracing::debug;

use crate::runtime::{EventLoop, Unit};

fn current_record() -> Option<Rc<Unit>> {
    EventLoop::try_current()
        .ok()
        .and_then(|event_loop| event_loop.current_record())
}

// The slot is untyped; a mismatching read treats it as empty. Type contracts
// across a causal chain are the caller's responsibility.
fn downcast<T: Any>(value: Rc<dyn Any>) -> Option<Rc<T>> {
    match value.downcast::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!("context slot holds a different type; treating it as empty");
            None
        }
    }
}

/// Resolve the effective context of the executing unit.
///
/// Walks from the current unit toward its causal root and returns the
/// nearest assigned value — the same object the ancestor assigned, not a
/// copy. When nothing on the chain holds a value, or when no unit is
/// executing at all, a fresh `T::default()` is returned and **not** stored
/// anywhere: sibling units and repeated calls each see their own default.
///
/// # Examples
///
/// ```
/// ambient::enable();
///
/// let rt = ambient::EventLoop::new();
/// rt.spawn(|| {
///     ambient::set(5u32);
///     ambient::spawn(|| assert_eq!(*ambient::get::<u32>(), 5));
/// });
/// rt.run();
/// ```
pub fn get<T: Any + Default>() -> Rc<T> {
    current_record()
        .and_then(|unit| unit.effective_slot())
        .and_then(downcast::<T>)
        .unwrap_or_else(|| Rc::new(T::default()))
}

/// Return the executing unit's own context value, initializing the slot
/// with `init` if it is empty.
///
/// An existing own value is returned unchanged and `init` never runs; use
/// [`set`] to overwrite. Initializing assigns the unit's own slot, which
/// shadows any inherited ancestor value for this unit and all of its future
/// descendants. Called with no executing unit, the value lives only for
/// this call and nothing persists.
pub fn get_or_init<T, F>(init: F) -> Rc<T>
where
    T: Any,
    F: FnOnce() -> T,
{
    let Some(unit) = current_record() else {
        return Rc::new(init());
    };
    if let Some(existing) = unit.own_slot().and_then(downcast::<T>) {
        return existing;
    }
    let value = Rc::new(init());
    unit.set_slot(value.clone());
    value
}

/// Assign the executing unit's own context slot, shadowing any ancestor
/// value for this unit and all of its future descendants. Ancestors and
/// siblings are never affected.
///
/// Called with no executing unit, the value is returned but persists
/// nowhere.
pub fn set<T: Any>(value: T) -> Rc<T> {
    let value = Rc::new(value);
    if let Some(unit) = current_record() {
        unit.set_slot(value.clone());
    }
    value
}
