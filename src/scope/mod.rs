//! Root scopes: run a closure as an isolated causal root with its own
//! context value.

mod scope;

pub use scope::scoped;
