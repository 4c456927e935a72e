//! Shared fixtures between unit tests in this crate: scriptable caches,
//! controllers, watch builders, and call recorders.
mod fixtures;

pub use fixtures::*;
