use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Identity of one asynchronous execution unit.
///
/// Assigned by the event loop that created the unit, unique within that loop,
/// and never reused while the unit is reachable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UnitId(pub(crate) u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of asynchronous activity a unit represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitKind {
    /// An immediately scheduled callback.
    Task,
    /// A timer callback.
    Timer,
    /// A microtask, drained before the next macrotask.
    Microtask,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitKind::Task => "task",
            UnitKind::Timer => "timer",
            UnitKind::Microtask => "microtask",
        };
        f.write_str(name)
    }
}

/// Bookkeeping record for one execution unit.
///
/// Records form a causal tree through `trigger` links: each unit points at
/// the unit that was executing when it was scheduled. A record is kept alive
/// only by the pending task that will run it, by the loop's currently
/// executing pointer, and by `trigger` links from live descendants. There is
/// no global id-to-unit map, so a completed unit with no live descendants is
/// reclaimed immediately.
pub(crate) struct Unit {
    id: UnitId,
    kind: UnitKind,
    // Causal parent. Written once by the inheritance hook; stays `None`
    // while tracking is disabled.
    trigger: RefCell<Option<Rc<Unit>>>,
    // The single context slot. A dedicated field rather than a keyed map:
    // this record is owned outright by the propagation machinery.
    slot: RefCell<Option<Rc<dyn Any>>>,
}

impl Unit {
    pub(crate) fn new(id: UnitId, kind: UnitKind) -> Self {
        Self {
            id,
            kind,
            trigger: RefCell::new(None),
            slot: RefCell::new(None),
        }
    }

    pub(crate) fn id(&self) -> UnitId {
        self.id
    }

    pub(crate) fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Link this unit to its causal parent.
    pub(crate) fn link_trigger(&self, trigger: &Rc<Unit>) {
        *self.trigger.borrow_mut() = Some(Rc::clone(trigger));
    }

    /// This unit's own slot value, ignoring ancestors.
    pub(crate) fn own_slot(&self) -> Option<Rc<dyn Any>> {
        self.slot.borrow().clone()
    }

    pub(crate) fn set_slot(&self, value: Rc<dyn Any>) {
        *self.slot.borrow_mut() = Some(value);
    }

    /// Resolve the effective context: the nearest slot value on the path from
    /// this unit to its causal root, inclusive.
    pub(crate) fn effective_slot(&self) -> Option<Rc<dyn Any>> {
        if let Some(value) = &*self.slot.borrow() {
            return Some(Rc::clone(value));
        }
        self.trigger
            .borrow()
            .as_ref()
            .and_then(|trigger| trigger.effective_slot())
    }
}
