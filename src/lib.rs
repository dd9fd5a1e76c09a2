//! # Ambient
//!
//! Implicit context propagation across asynchronous execution chains.
//!
//! A value assigned at the start of an asynchronous operation — an incoming
//! request, say — is transparently visible to every callback, timer, and
//! continuation causally descended from it, with no parameter threading.
//! Two unrelated chains never observe each other's values.
//!
//! Ambient provides two layers:
//!
//! ## Host runtime
//!
//! A single-threaded, cooperative event loop that models every scheduled
//! callback as one execution unit:
//! - `EventLoop` - the loop itself; `run()` drains all scheduled work
//! - `spawn`, `set_timeout`, `queue_microtask` - schedule units from inside
//!   callbacks
//!
//! ## Context propagation
//!
//! The per-unit context slot, inherited down the causal tree:
//! - `enable` - install causal tracking, once at startup
//! - `get`, `get_or_init`, `set` - read and write the ambient value
//! - `scoped` - run a closure as an isolated root with its own value
//!
//! # Examples
//!
//! ```
//! use std::rc::Rc;
//! use std::time::Duration;
//!
//! #[derive(Default)]
//! struct RequestMeta {
//!     user_id: u64,
//! }
//!
//! ambient::enable();
//!
//! let rt = ambient::EventLoop::new();
//! rt.spawn(|| {
//!     ambient::set(RequestMeta { user_id: 42 });
//!     ambient::set_timeout(Duration::from_millis(5), || {
//!         let meta: Rc<RequestMeta> = ambient::get();
//!         assert_eq!(meta.user_id, 42);
//!     });
//! });
//! rt.run();
//! ```

pub mod context;
pub mod hook;
pub mod runtime;
pub mod scope;

// Re-export main entry points for convenience
pub use context::{get, get_or_init, set};
pub use hook::enable;
pub use runtime::{
    current_unit, queue_microtask, set_timeout, spawn, EventLoop, NotRunningError, UnitId,
    UnitKind,
};
pub use scope::scoped;
