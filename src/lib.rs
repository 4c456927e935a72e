//! # multicluster-watch
//!
//! A lifecycle orchestration engine for cache-backed watch controllers spread
//! across multiple remote clusters.
//!
//! Each target cluster runs under its own cancellation scope: a per-cluster
//! [`Manager`] starts the caches its controllers depend on, gates every
//! controller on synchronization of all of its caches, and surfaces the first
//! terminal error. The [`WatchCoordinator`] above it adds and removes
//! clusters at runtime, keeps failures scoped to the cluster they happened
//! in, and reports them through rollback hooks.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use multicluster_watch::ClusterDescriptor;
//! use multicluster_watch::TypeRef;
//! use multicluster_watch::WatchCoordinator;
//! use multicluster_watch::WatchSpecification;
//!
//! let spec = WatchSpecification::new(TypeRef::new("apps", "v1", "Deployment"), reconciler);
//! let coordinator = WatchCoordinator::new(vec![spec], builder)?;
//! coordinator.add_failed_rollback(|cluster, err| eprintln!("{}: {}", cluster, err));
//!
//! coordinator
//!     .start_resource_watch(&[ClusterDescriptor::new("edge-1", "https://edge-1.example:443")])
//!     .await?;
//!
//! // Later: stop one cluster without disturbing the others.
//! coordinator.stop_resource_watch(&["edge-1"]);
//! ```

mod cluster;
mod config;
mod constants;
mod coordinator;
mod errors;
mod handler;
mod manager;
mod reconcile;
pub mod utils;

pub use cluster::*;
pub use config::*;
pub use coordinator::*;
pub use errors::*;
pub use handler::*;
pub use manager::*;
pub use reconcile::*;
pub use utils::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
