//! Multi-cluster watch orchestration.
//!
//! The [`WatchCoordinator`] owns the declarative watch set and a dynamic set
//! of target clusters. Each cluster runs under its own cancellation scope
//! with its own manager; clusters start and stop independently, and failures
//! stay scoped to the cluster they happened in.

mod coordinator;
mod spec;

pub use coordinator::*;
pub use spec::*;
