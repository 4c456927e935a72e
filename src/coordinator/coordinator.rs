use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::WatchBuilder;
use super::WatchSpecification;
use crate::cluster::ClusterDescriptor;
use crate::manager::Manager;
use crate::utils::ConcurrentMap;
use crate::Error;
use crate::Result;
use crate::SetupError;

/// Callback invoked with `(cluster_name, error)` whenever setting up or
/// running a cluster's watches fails. Failures stay scoped to one cluster;
/// hooks are the only place they become visible to the caller.
pub type RollbackHook = Arc<dyn Fn(&str, &Error) + Send + Sync>;

/// Top-level owner of per-cluster watch lifecycles.
///
/// Holds a fixed set of watch specifications and a dynamic set of target
/// clusters. Every cluster runs under its own cancellation scope, derived
/// from the coordinator's root scope, with its own [`Manager`]; stopping one
/// cluster never disturbs another. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct WatchCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    specs: Vec<WatchSpecification>,
    builder: Arc<dyn WatchBuilder>,
    managers: ConcurrentMap<String, Arc<Manager>>,
    scopes: ConcurrentMap<String, CancellationToken>,
    root: Mutex<CancellationToken>,
    rollback_hooks: Mutex<Vec<RollbackHook>>,
}

impl WatchCoordinator {
    /// Creates a coordinator over a non-empty set of watch specifications.
    pub fn new(
        specs: Vec<WatchSpecification>,
        builder: Arc<dyn WatchBuilder>,
    ) -> Result<Self> {
        if specs.is_empty() {
            return Err(SetupError::EmptyWatchSet.into());
        }

        Ok(Self {
            inner: Arc::new(CoordinatorInner {
                specs,
                builder,
                managers: ConcurrentMap::new(),
                scopes: ConcurrentMap::new(),
                root: Mutex::new(CancellationToken::new()),
                rollback_hooks: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Registers a rollback hook. All registered hooks run, in registration
    /// order, for every per-cluster setup or runtime failure.
    pub fn add_failed_rollback<F>(
        &self,
        hook: F,
    ) -> &Self
    where
        F: Fn(&str, &Error) + Send + Sync + 'static,
    {
        self.inner.rollback_hooks.lock().push(Arc::new(hook));
        self
    }

    /// Starts watches for every not-yet-tracked cluster in `clusters`.
    ///
    /// Already-tracked clusters are left untouched; their managers are not
    /// restarted. A wiring failure invokes the rollback hooks with the
    /// failing cluster's name and skips that controller without aborting
    /// other clusters or specifications; a cluster for which nothing wires
    /// is left untracked. Managers run in the background: this call returns
    /// once wiring is complete, and a manager's terminal error later routes
    /// through the same rollback hooks before the cluster is torn down.
    pub async fn start_resource_watch(
        &self,
        clusters: &[ClusterDescriptor],
    ) -> Result<()> {
        let root = self.current_root();

        let mut launches = Vec::new();
        for cluster in clusters {
            let name = cluster.name().to_string();

            // Claiming the scope entry up front keeps concurrent callers
            // from wiring the same cluster twice.
            let scope = root.child_token();
            let (_, already_tracked) = self.inner.scopes.load_or_store(name.clone(), scope.clone());
            if already_tracked {
                debug!("[WatchCoordinator] cluster {} already tracked; leaving it untouched", name);
                continue;
            }

            let manager = Arc::new(Manager::new());
            let mut wired = 0usize;

            for spec in &self.inner.specs {
                match self.inner.builder.build_watch(cluster, spec).await {
                    Ok(controller) => match manager.add_controller(controller) {
                        Ok(()) => wired += 1,
                        Err(e) => self.run_rollback_hooks(&name, &e),
                    },
                    Err(e) => {
                        let wiring: Error = SetupError::WatchWiring {
                            cluster: name.clone(),
                            reason: e.to_string(),
                        }
                        .into();
                        warn!("[WatchCoordinator] {}", wiring);
                        self.run_rollback_hooks(&name, &wiring);
                    }
                }
            }

            if wired == 0 {
                // Nothing wired: release the claim so the cluster is not
                // left tracked with a dead scope.
                scope.cancel();
                self.inner.scopes.delete(&name);
                warn!("[WatchCoordinator] no watch wired for cluster {}; leaving it untracked", name);
                continue;
            }

            self.inner.managers.store(name.clone(), manager.clone());
            info!("[WatchCoordinator] cluster {} wired with {} watch(es)", name, wired);
            launches.push((name, manager, scope));
        }

        for (name, manager, scope) in launches {
            self.launch_manager(name, manager, scope);
        }

        Ok(())
    }

    /// Stops the named clusters: cancels each one's scope, unwinding its
    /// caches and controllers, and drops its entries. Unknown names are
    /// no-ops. When no clusters remain tracked afterwards the root scope is
    /// cancelled as well, so nothing leaks.
    pub fn stop_resource_watch(
        &self,
        clusters: &[&str],
    ) {
        for cluster in clusters {
            self.teardown_cluster(cluster);
        }
    }

    /// Hard stop: cancels the root scope, unwinding every cluster at once.
    ///
    /// Per-cluster entries stay tracked afterwards; this is the
    /// whole-process shutdown path, not a recoverable stop.
    pub fn stop_watch(&self) {
        warn!("[WatchCoordinator] stop requested; cancelling root scope");
        self.inner.root.lock().cancel();
    }

    pub fn is_tracking(
        &self,
        cluster: &str,
    ) -> bool {
        self.inner.scopes.load(&cluster.to_string()).is_some()
    }

    /// Names of currently tracked clusters, sorted for stable output.
    pub fn tracked_clusters(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.inner.scopes.range(|name, _| {
            names.push(name.clone());
            true
        });
        names.sort();
        names
    }

    /// Observation handle on the root scope: cancelled when the last cluster
    /// stops or [`stop_watch`](Self::stop_watch) is called.
    pub fn root_scope(&self) -> CancellationToken {
        self.inner.root.lock().clone()
    }

    /// Hands out the current root, replacing it first when the previous one
    /// was cancelled and every cluster is gone. The root is created once and
    /// only ever refreshed after a full stop.
    fn current_root(&self) -> CancellationToken {
        let mut root = self.inner.root.lock();
        if root.is_cancelled() && self.inner.scopes.is_empty() {
            debug!("[WatchCoordinator] refreshing root scope after full stop");
            *root = CancellationToken::new();
        }
        root.clone()
    }

    fn launch_manager(
        &self,
        cluster: String,
        manager: Arc<Manager>,
        scope: CancellationToken,
    ) {
        let coordinator = self.clone();
        tokio::spawn(async move {
            info!("[WatchCoordinator] manager for cluster {} starting", cluster);
            match manager.start(scope).await {
                Ok(()) => {
                    debug!("[WatchCoordinator] manager for cluster {} stopped", cluster);
                }
                Err(e) => {
                    error!("[WatchCoordinator] manager for cluster {} failed: {}", cluster, e);
                    coordinator.run_rollback_hooks(&cluster, &e);
                    coordinator.teardown_cluster(&cluster);
                }
            }
        });
    }

    /// Cancels and forgets one cluster, folding the root scope once the last
    /// cluster is gone.
    fn teardown_cluster(
        &self,
        cluster: &str,
    ) {
        if let Some(scope) = self.inner.scopes.load(&cluster.to_string()) {
            scope.cancel();
            debug!("[WatchCoordinator] cluster {} scope cancelled", cluster);
        }
        self.inner.scopes.delete(&cluster.to_string());
        self.inner.managers.delete(&cluster.to_string());

        if self.inner.scopes.is_empty() {
            debug!("[WatchCoordinator] no clusters remain; cancelling root scope");
            self.inner.root.lock().cancel();
        }
    }

    fn run_rollback_hooks(
        &self,
        cluster: &str,
        err: &Error,
    ) {
        // Snapshot outside the lock: hooks may re-enter the coordinator.
        let hooks = self.inner.rollback_hooks.lock().clone();
        for hook in &hooks {
            hook(cluster, err);
        }
    }
}
