use std::fmt;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;
use tonic::async_trait;

use crate::Result;

/// The minimal addressable unit of reconciliation work.
///
/// Equality is by value; duplicates in a queue are permitted and must be
/// handled idempotently by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Request {
    /// Name of the cluster the object lives in
    pub cluster: String,
    /// Namespace of the object (empty for cluster-scoped objects)
    pub namespace: String,
    /// Name of the object, or of its resolved controlling owner
    pub name: String,
}

impl Request {
    pub fn new(
        cluster: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            cluster: cluster.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}/{}/{}", self.cluster, self.namespace, self.name)
    }
}

/// Outcome of one reconcile invocation.
///
/// The zero value means "done, do not reprocess". `requeue_after` takes
/// precedence over `requeue` when both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileResult {
    /// Reprocess the request immediately
    pub requeue: bool,
    /// Reprocess the request after the given delay
    pub requeue_after: Option<Duration>,
}

impl ReconcileResult {
    /// Requests immediate reprocessing.
    pub fn requeue() -> Self {
        Self {
            requeue: true,
            requeue_after: None,
        }
    }

    /// Requests reprocessing after `delay`.
    pub fn requeue_after(delay: Duration) -> Self {
        Self {
            requeue: false,
            requeue_after: Some(delay),
        }
    }
}

/// Processes one reconciliation request at a time.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Reconciler: Send + Sync + 'static {
    async fn reconcile(
        &self,
        request: Request,
    ) -> Result<ReconcileResult>;
}

/// Work-queue sink accepting admitted requests. Pushes must never block.
#[cfg_attr(test, automock)]
pub trait RequestSink: Send + Sync + 'static {
    fn add(
        &self,
        request: Request,
    );
}
