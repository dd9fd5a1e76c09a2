//! Host-runtime layer: a single-threaded, cooperative event loop and the
//! execution-unit records the propagation machinery hangs off of.
//!
//! The loop provides the three facilities the upper layers need: synchronous
//! notification when a unit is created, a query for the currently executing
//! unit, and per-unit storage that is reclaimed with the unit.

mod event_loop;
mod unit;

pub use event_loop::{
    current_unit, queue_microtask, set_timeout, spawn, EventLoop, NotRunningError,
};
pub use unit::{UnitId, UnitKind};

pub(crate) use unit::Unit;
