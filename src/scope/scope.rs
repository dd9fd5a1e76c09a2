use std::any::Any;
use std::rc::Rc;

use crate::runtime::{EventLoop, UnitKind};

/// Run `f` immediately as a fresh root unit whose context slot holds
/// `value`.
///
/// The new unit has no causal parent, even with tracking enabled, so work
/// spawned inside `f` inherits `value` and nothing from the surrounding
/// chain — the root of a new, isolated causal tree. The previous execution
/// state is restored when `f` returns, or when it panics.
///
/// # Panics
///
/// Panics if no event loop is running on this thread.
///
/// # Examples
///
/// ```
/// ambient::enable();
///
/// let rt = ambient::EventLoop::new();
/// rt.spawn(|| {
///     ambient::set("outer".to_string());
///     ambient::scoped("inner".to_string(), |_| {
///         ambient::spawn(|| assert_eq!(*ambient::get::<String>(), "inner"));
///     });
///     assert_eq!(*ambient::get::<String>(), "outer");
/// });
/// rt.run();
/// ```
pub fn scoped<T, R, F>(value: T, f: F) -> R
where
    T: Any,
    F: FnOnce(Rc<T>) -> R,
{
    let event_loop = match EventLoop::try_current() {
        Ok(event_loop) => event_loop,
        Err(_) => panic!("`scoped` requires a running event loop on this thread"),
    };

    let unit = event_loop.create_detached_unit(UnitKind::Task);
    let value = Rc::new(value);
    unit.set_slot(value.clone());
    event_loop.enter_unit(&unit, move || f(value))
}
