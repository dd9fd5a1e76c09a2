use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::runtime::Unit;

type CreatedHook = Rc<dyn Fn(&Rc<Unit>, Option<&Rc<Unit>>)>;

thread_local! {
    static HOOKS: RefCell<Vec<CreatedHook>> = RefCell::new(Vec::new());
    static ENABLED: Cell<bool> = Cell::new(false);
}

/// Activate causal tracking and context inheritance on this thread.
///
/// Call once, before the first unit of interest is created; units scheduled
/// earlier are never linked to their triggers. Subsequent calls are no-ops,
/// and there is no way to deactivate tracking again.
///
/// If the hook registry is unavailable (thread teardown), tracking silently
/// stays off and every unit resolves to an empty context.
pub fn enable() {
    let newly_enabled = ENABLED
        .try_with(|flag| !flag.replace(true))
        .unwrap_or(false);
    if !newly_enabled {
        debug!("context propagation already enabled");
        return;
    }

    register(Rc::new(|unit, trigger| {
        let Some(trigger) = trigger else { return };
        unit.link_trigger(trigger);
        // Shallow inherit: the child starts with the same value object the
        // trigger resolves to right now. An unresolved trigger leaves the
        // slot empty for lazy resolution at read time.
        if let Some(value) = trigger.effective_slot() {
            unit.set_slot(value);
        }
    }));
}

pub(crate) fn register(hook: CreatedHook) {
    if HOOKS.try_with(|hooks| hooks.borrow_mut().push(hook)).is_err() {
        warn!("hook registry unavailable; context propagation stays disabled");
    }
}

/// Dispatch a unit-creation event to every registered hook.
///
/// A hook must never break scheduling of the unit that triggered it: panics
/// are caught and swallowed, leaving that unit without inheritance.
pub(crate) fn dispatch_created(unit: &Rc<Unit>, trigger: Option<&Rc<Unit>>) {
    let hooks: Vec<CreatedHook> = match HOOKS.try_with(|hooks| hooks.borrow().clone()) {
        Ok(hooks) => hooks,
        Err(_) => return,
    };
    for hook in hooks {
        if panic::catch_unwind(AssertUnwindSafe(|| hook(unit, trigger))).is_err() {
            warn!(unit = %unit.id(), "lifecycle hook panicked; unit keeps an empty context");
        }
    }
}
