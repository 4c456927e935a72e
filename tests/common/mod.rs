//! Shared fixtures for end-to-end coordinator tests: scripted caches and
//! controllers, a recording reconciler, and a closure-backed watch builder,
//! all built against the public API only.

use std::sync::Arc;
use std::time::Duration;

use multicluster_watch::Cache;
use multicluster_watch::ClusterDescriptor;
use multicluster_watch::Controller;
use multicluster_watch::Deleted;
use multicluster_watch::EnqueueRequestForObject;
use multicluster_watch::EnqueueRequestForOwner;
use multicluster_watch::Error;
use multicluster_watch::OwnerReference;
use multicluster_watch::ReconcileResult;
use multicluster_watch::Reconciler;
use multicluster_watch::Request;
use multicluster_watch::RequestQueue;
use multicluster_watch::Result;
use multicluster_watch::SharedCache;
use multicluster_watch::TypeRef;
use multicluster_watch::WatchBuilder;
use multicluster_watch::WatchSpecification;
use multicluster_watch::WatchedObject;
use parking_lot::Mutex;
use tokio::time::sleep;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tonic::async_trait;

/// Ordered record of lifecycle events, used to assert happens-before
/// relationships across tasks.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn new_event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn record(
    log: &EventLog,
    event: impl Into<String>,
) {
    log.lock().push(event.into());
}

pub fn position(
    log: &EventLog,
    event: &str,
) -> Option<usize> {
    log.lock().iter().position(|e| e == event)
}

pub async fn wait_until<F>(mut cond: F)
where
    F: FnMut() -> bool,
{
    timeout(Duration::from_secs(5), async {
        while !cond() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met within 5s");
}

pub fn descriptor(name: &str) -> ClusterDescriptor {
    ClusterDescriptor::new(name, format!("http://{}.clusters.internal:50051", name))
}

/// Minimal object fed through the enqueue handlers.
pub struct WorkItem {
    namespace: String,
    name: String,
    owners: Vec<OwnerReference>,
}

impl WorkItem {
    pub fn new(
        namespace: &str,
        name: &str,
    ) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            owners: Vec::new(),
        }
    }

    pub fn owned_by(
        mut self,
        owner: OwnerReference,
    ) -> Self {
        self.owners.push(owner);
        self
    }
}

impl WatchedObject for WorkItem {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn owner_references(&self) -> &[OwnerReference] {
        &self.owners
    }
}

/// Cache reporting synced after an optional delay, then idling until
/// cancelled.
pub struct SyncingCache {
    name: String,
    delay: Option<Duration>,
    log: Option<EventLog>,
}

impl SyncingCache {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            delay: None,
            log: None,
        }
    }

    pub fn with_sync_delay(
        mut self,
        delay: Duration,
    ) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn logged(
        mut self,
        log: &EventLog,
    ) -> Self {
        self.log = Some(log.clone());
        self
    }

    pub fn shared(self) -> SharedCache {
        Arc::new(self)
    }
}

#[async_trait]
impl Cache for SyncingCache {
    async fn start(
        &self,
        cancel: CancellationToken,
    ) -> Result<()> {
        cancel.cancelled().await;
        Ok(())
    }

    async fn wait_for_sync(
        &self,
        cancel: CancellationToken,
    ) -> bool {
        if let Some(delay) = self.delay {
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = sleep(delay) => {}
            }
        }
        if let Some(log) = &self.log {
            record(log, format!("{}:synced", self.name));
        }
        true
    }
}

/// Controller that, once running, feeds a fixed notification batch through
/// both enqueue handlers and then parks until cancelled.
///
/// The batch produces four requests in the controller's cluster: `api` (add),
/// `worker` (update), `job` (tombstone delete), and `web` (resolved from a
/// controlling Deployment owner reference).
pub struct EmittingController {
    cluster: String,
    caches: Vec<SharedCache>,
    queue: Arc<RequestQueue>,
    log: Option<EventLog>,
}

impl EmittingController {
    pub fn new(
        cluster: &str,
        queue: Arc<RequestQueue>,
    ) -> Self {
        Self {
            cluster: cluster.to_string(),
            caches: Vec::new(),
            queue,
            log: None,
        }
    }

    pub fn with_cache(
        mut self,
        cache: SharedCache,
    ) -> Self {
        self.caches.push(cache);
        self
    }

    pub fn logged(
        mut self,
        log: &EventLog,
    ) -> Self {
        self.log = Some(log.clone());
        self
    }
}

#[async_trait]
impl Controller for EmittingController {
    fn caches(&self) -> Vec<SharedCache> {
        self.caches.clone()
    }

    async fn start(
        &self,
        cancel: CancellationToken,
    ) -> Result<()> {
        if let Some(log) = &self.log {
            record(log, format!("{}:controller-started", self.cluster));
        }

        let by_object = EnqueueRequestForObject::new(&self.cluster, self.queue.clone());
        by_object.on_add(&WorkItem::new("payments", "api"));
        let old = WorkItem::new("payments", "worker");
        let new = WorkItem::new("payments", "worker");
        by_object.on_update(Some(&old), Some(&new));
        by_object.on_delete(&Deleted::Tombstone(Some(WorkItem::new("payments", "job"))));

        let by_owner = EnqueueRequestForOwner::new(
            &self.cluster,
            TypeRef::new("apps", "v1", "Deployment"),
            self.queue.clone(),
        );
        by_owner.on_add(&WorkItem::new("payments", "web-6d5b").owned_by(OwnerReference {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            name: "web".to_string(),
            controller: true,
        }));

        cancel.cancelled().await;
        if let Some(log) = &self.log {
            record(log, format!("{}:controller-stopped", self.cluster));
        }
        Ok(())
    }
}

/// Records every request it reconciles; optionally requeues one named request
/// a single time.
pub struct TrackingReconciler {
    seen: Mutex<Vec<Request>>,
    requeue_once: Mutex<Option<String>>,
}

impl TrackingReconciler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            requeue_once: Mutex::new(None),
        })
    }

    pub fn requeuing_once(name: &str) -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            requeue_once: Mutex::new(Some(name.to_string())),
        })
    }

    pub fn seen(&self) -> Vec<Request> {
        self.seen.lock().clone()
    }

    pub fn seen_count(&self) -> usize {
        self.seen.lock().len()
    }
}

#[async_trait]
impl Reconciler for TrackingReconciler {
    async fn reconcile(
        &self,
        request: Request,
    ) -> Result<ReconcileResult> {
        self.seen.lock().push(request.clone());

        let mut pending = self.requeue_once.lock();
        if pending.as_deref() == Some(request.name.as_str()) {
            pending.take();
            return Ok(ReconcileResult::requeue_after(Duration::from_millis(20)));
        }
        Ok(ReconcileResult::default())
    }
}

/// Closure-backed watch builder.
pub struct FnWatchBuilder<F> {
    build: F,
}

impl<F> FnWatchBuilder<F>
where
    F: Fn(&ClusterDescriptor, &WatchSpecification) -> Result<Arc<dyn Controller>> + Send + Sync + 'static,
{
    pub fn new(build: F) -> Arc<Self> {
        Arc::new(Self { build })
    }
}

#[async_trait]
impl<F> WatchBuilder for FnWatchBuilder<F>
where
    F: Fn(&ClusterDescriptor, &WatchSpecification) -> Result<Arc<dyn Controller>> + Send + Sync + 'static,
{
    async fn build_watch(
        &self,
        cluster: &ClusterDescriptor,
        spec: &WatchSpecification,
    ) -> Result<Arc<dyn Controller>> {
        (self.build)(cluster, spec)
    }
}

/// Captures rollback hook invocations as (cluster, rendered error) pairs.
pub struct RollbackLog {
    calls: Mutex<Vec<(String, String)>>,
}

impl RollbackLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn hook(self: &Arc<Self>) -> impl Fn(&str, &Error) + Send + Sync + 'static {
        let log = self.clone();
        move |cluster, err| {
            log.calls.lock().push((cluster.to_string(), err.to_string()));
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}
