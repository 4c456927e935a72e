//! Watch Lifecycle Error Hierarchy
//!
//! Defines error types for the multi-cluster watch engine, categorized by
//! lifecycle phase and operational concerns.

use std::path::PathBuf;
use std::time::Duration;

use config::ConfigError;
use tokio::task::JoinError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failures wiring watches before any background task starts
    #[error(transparent)]
    Setup(#[from] SetupError),

    /// Failures inside a running manager scope (cache sync, controller run)
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Cluster transport establishment failures
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Configuration validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Failures originating inside a collaborator-supplied cache,
    /// controller, or reconciler
    #[error("Watch backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Unrecoverable failures requiring caller intervention
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// Coordinator constructed with no watch specifications
    #[error("watch resource is empty")]
    EmptyWatchSet,

    /// Building a controller against a cluster failed
    #[error("Failed to wire watch for cluster {cluster}: {reason}")]
    WatchWiring { cluster: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// A cache never completed its initial synchronization
    #[error("failed to wait for caches to sync")]
    CacheSyncFailed,

    /// Second `start` call on a manager that is already running
    #[error("Manager has already been started")]
    ManagerAlreadyStarted,

    /// Controller registration attempted after `start` began
    #[error("Controller registry is closed once the manager has started")]
    ControllerRegistryClosed,

    /// A spawned cache/controller task panicked or was aborted
    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Malformed cluster endpoint
    #[error("Invalid endpoint format: {0}")]
    InvalidEndpoint(String),

    /// Dial timeout against a cluster endpoint
    #[error("Connection timeout to {cluster} after {duration:?}")]
    Timeout { cluster: String, duration: Duration },

    /// CA certificate could not be loaded
    #[error("Failed to read CA certificate at {path}")]
    CertificateRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// TLS negotiation failures
    #[error("TLS handshake failed")]
    TlsHandshakeFailure,

    /// gRPC transport layer errors
    #[error(transparent)]
    Transport(#[from] Box<tonic::transport::Error>),
}

// ============== Conversion Implementations ============== //
impl From<JoinError> for Error {
    fn from(e: JoinError) -> Self {
        Error::Lifecycle(LifecycleError::TaskFailed(e))
    }
}

impl From<tonic::transport::Error> for Error {
    fn from(err: tonic::transport::Error) -> Self {
        ConnectionError::Transport(Box::new(err)).into()
    }
}
