use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tonic::async_trait;

use crate::Cache;
use crate::ClusterDescriptor;
use crate::Controller;
use crate::Error;
use crate::OwnerReference;
use crate::Request;
use crate::RequestSink;
use crate::Result;
use crate::SharedCache;
use crate::WatchBuilder;
use crate::WatchSpecification;
use crate::WatchedObject;

/// Ordered record of lifecycle events pushed by fixtures, used to assert
/// happens-before relationships (e.g. sync before controller start).
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

/// Scriptable cache counting its lifecycle calls.
///
/// `start` blocks until cancelled unless scripted to fail; `wait_for_sync`
/// optionally delays (observing cancellation) before answering.
pub struct StubCache {
    name: String,
    sync_ok: bool,
    sync_delay: Option<Duration>,
    fail_start_with: Option<String>,
    log: Option<EventLog>,
    starts: AtomicUsize,
    syncs: AtomicUsize,
}

impl StubCache {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sync_ok: true,
            sync_delay: None,
            fail_start_with: None,
            log: None,
            starts: AtomicUsize::new(0),
            syncs: AtomicUsize::new(0),
        }
    }

    pub fn failing_sync(mut self) -> Self {
        self.sync_ok = false;
        self
    }

    pub fn failing_start(
        mut self,
        reason: &str,
    ) -> Self {
        self.fail_start_with = Some(reason.to_string());
        self
    }

    pub fn sync_delay(
        mut self,
        delay: Duration,
    ) -> Self {
        self.sync_delay = Some(delay);
        self
    }

    pub fn logged(
        mut self,
        log: &EventLog,
    ) -> Self {
        self.log = Some(log.clone());
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn sync_count(&self) -> usize {
        self.syncs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Cache for StubCache {
    async fn start(
        &self,
        cancel: CancellationToken,
    ) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.fail_start_with {
            return Err(Error::Fatal(reason.clone()));
        }
        cancel.cancelled().await;
        Ok(())
    }

    async fn wait_for_sync(
        &self,
        cancel: CancellationToken,
    ) -> bool {
        self.syncs.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.sync_delay {
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        if self.sync_ok {
            if let Some(log) = &self.log {
                record(log, format!("{}:synced", self.name));
            }
            true
        } else {
            false
        }
    }
}

/// Scriptable controller counting its `start` invocations.
pub struct StubController {
    name: String,
    caches: Vec<SharedCache>,
    fail_start_with: Option<String>,
    run_until_cancelled: bool,
    log: Option<EventLog>,
    starts: AtomicUsize,
}

impl StubController {
    pub fn named(
        name: &str,
        caches: Vec<SharedCache>,
    ) -> Self {
        Self {
            name: name.to_string(),
            caches,
            fail_start_with: None,
            run_until_cancelled: true,
            log: None,
            starts: AtomicUsize::new(0),
        }
    }

    /// `start` returns `Ok(())` immediately instead of blocking.
    pub fn finishing(mut self) -> Self {
        self.run_until_cancelled = false;
        self
    }

    pub fn failing(
        mut self,
        reason: &str,
    ) -> Self {
        self.fail_start_with = Some(reason.to_string());
        self
    }

    pub fn logged(
        mut self,
        log: &EventLog,
    ) -> Self {
        self.log = Some(log.clone());
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Controller for StubController {
    fn caches(&self) -> Vec<SharedCache> {
        self.caches.clone()
    }

    async fn start(
        &self,
        cancel: CancellationToken,
    ) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            record(log, format!("{}:started", self.name));
        }
        if let Some(reason) = &self.fail_start_with {
            return Err(Error::Fatal(reason.clone()));
        }
        if self.run_until_cancelled {
            cancel.cancelled().await;
            if let Some(log) = &self.log {
                record(log, format!("{}:stopped", self.name));
            }
        }
        Ok(())
    }
}

/// Captures rollback hook invocations as (cluster, rendered error) pairs.
pub struct HookRecorder {
    calls: Mutex<Vec<(String, String)>>,
}

impl HookRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn hook_fn(self: &Arc<Self>) -> impl Fn(&str, &Error) + Send + Sync + 'static {
        let recorder = self.clone();
        move |cluster, err| {
            recorder.calls.lock().push((cluster.to_string(), err.to_string()));
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

/// Closure-backed watch builder for coordinator tests.
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

/// Plain observed object for enqueue handler tests.
#[derive(Debug, Clone)]
pub struct TestWorkload {
    namespace: String,
    name: String,
    owners: Vec<OwnerReference>,
}

impl TestWorkload {
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

impl WatchedObject for TestWorkload {
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

pub fn owner_ref(
    api_version: &str,
    kind: &str,
    name: &str,
    controller: bool,
) -> OwnerReference {
    OwnerReference {
        api_version: api_version.to_string(),
        kind: kind.to_string(),
        name: name.to_string(),
        controller,
    }
}

/// Sink recording every request that made it through admission.
pub struct CapturingSink {
    requests: Mutex<Vec<Request>>,
}

impl CapturingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl RequestSink for CapturingSink {
    fn add(
        &self,
        request: Request,
    ) {
        self.requests.lock().push(request);
    }
}
