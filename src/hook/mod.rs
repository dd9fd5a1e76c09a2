//! Execution-unit lifecycle interception.
//!
//! The event loop reports every unit creation here, synchronously, together
//! with the unit that triggered it. [`enable`] installs the hook that turns
//! those reports into causal links and inherited context.

mod tracker;

pub use tracker::enable;

pub(crate) use tracker::dispatch_created;
