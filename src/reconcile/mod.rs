//! Reconciliation primitives: the unit of work, the capability trait that
//! processes it, and the queue/dispatch plumbing between them.

mod queue;
mod request;
pub use queue::*;
pub use request::*;
