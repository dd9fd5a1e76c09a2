//! The context propagator: read and write the ambient value of the
//! executing unit.
//!
//! A unit that never assigns its own value resolves to the nearest ancestor
//! that did, walked at read time through the causal links maintained by the
//! [`hook`](crate::hook) layer.

mod context;

pub use context::{get, get_or_init, set};
