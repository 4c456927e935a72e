//! Controller lifecycle management.
//!
//! The [`Manager`] owns a set of controllers, starts the unique caches they
//! depend on, gates every controller's start on synchronization of all of its
//! caches, and aggregates the first terminal error from any component.

mod manager;
pub use manager::*;


use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use tokio_util::sync::CancellationToken;
use tonic::async_trait;

use crate::Result;

/// Initial-load + sync barrier over an externally observed data set.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Cache: Send + Sync + 'static {
    /// Runs the cache until `cancel` fires. An error is fatal to the owning
    /// manager.
    async fn start(
        &self,
        cancel: CancellationToken,
    ) -> Result<()>;

    /// Blocks until the initial data set is loaded. Returns `false` when the
    /// cache cannot reach a synchronized state, including cancellation before
    /// sync completes.
    async fn wait_for_sync(
        &self,
        cancel: CancellationToken,
    ) -> bool;
}

/// Shared handle to a cache.
///
/// Cache identity follows the allocation: two controllers depend on the same
/// cache only when they hold clones of the same `Arc`.
pub type SharedCache = Arc<dyn Cache>;

/// A unit of processing logic plus its cache dependencies.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Controller: Send + Sync + 'static {
    /// Dependency set. The manager will not start this controller until every
    /// entry has synchronized. An empty set means no gating.
    fn caches(&self) -> Vec<SharedCache>;

    /// Runs the processing loop until `cancel` fires or a fatal error occurs.
    async fn start(
        &self,
        cancel: CancellationToken,
    ) -> Result<()>;
}
