use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use super::Cache;
use super::Controller;
use super::SharedCache;
use crate::Error;
use crate::LifecycleError;
use crate::Result;

/// Manages controllers: starts their caches, waits for those to sync, then
/// starts the controllers.
///
/// One manager serves one cluster scope. Controllers are registered up front;
/// registration closes once [`start`](Manager::start) begins.
pub struct Manager {
    state: Mutex<ManagerState>,
}

struct ManagerState {
    controllers: Vec<Arc<dyn Controller>>,
    started: bool,
}

/// A distinct cache and the sync flag its dependent controllers wait on.
struct CacheEntry {
    cache: SharedCache,
    sync_tx: watch::Sender<bool>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ManagerState {
                controllers: Vec::new(),
                started: false,
            }),
        }
    }

    /// Registers a controller. Fails with
    /// [`LifecycleError::ControllerRegistryClosed`] once `start` has begun.
    pub fn add_controller(
        &self,
        controller: Arc<dyn Controller>,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if state.started {
            return Err(LifecycleError::ControllerRegistryClosed.into());
        }
        state.controllers.push(controller);
        Ok(())
    }

    pub fn controller_count(&self) -> usize {
        self.state.lock().controllers.len()
    }

    /// Starts the unique caches of all registered controllers, then each
    /// controller as soon as every cache it depends on has synced.
    ///
    /// Blocks until `cancel` fires (returns `Ok(())`, cooperative shutdown)
    /// or any cache-start, cache-sync, or controller-start task reports a
    /// terminal error (returned immediately; in-flight tasks are left to
    /// observe `cancel` and unwind on their own). First error wins; later
    /// ones are dropped.
    pub async fn start(
        &self,
        cancel: CancellationToken,
    ) -> Result<()> {
        let controllers = {
            let mut state = self.state.lock();
            if state.started {
                return Err(LifecycleError::ManagerAlreadyStarted.into());
            }
            state.started = true;
            state.controllers.clone()
        };

        // Capacity 1: the first terminal error is queued, the rest fail the
        // try_send and are dropped.
        let (err_tx, mut err_rx) = mpsc::channel::<Error>(1);

        // De-duplicate caches by allocation identity and hand every dependent
        // controller a receiver for each of its caches' sync flags.
        let mut cache_index: HashMap<usize, CacheEntry> = HashMap::new();
        let mut waiters: Vec<(Arc<dyn Controller>, Vec<watch::Receiver<bool>>)> = Vec::new();
        for controller in controllers {
            let mut sync_flags = Vec::new();
            for cache in controller.caches() {
                let key = Arc::as_ptr(&cache) as *const () as usize;
                let entry = cache_index.entry(key).or_insert_with(|| {
                    let (sync_tx, _) = watch::channel(false);
                    CacheEntry { cache, sync_tx }
                });
                sync_flags.push(entry.sync_tx.subscribe());
            }
            waiters.push((controller, sync_flags));
        }

        debug!(
            "[Manager] starting {} controller(s) over {} distinct cache(s)",
            waiters.len(),
            cache_index.len()
        );

        let mut tasks: FuturesUnordered<JoinHandle<()>> = FuturesUnordered::new();

        for CacheEntry { cache, sync_tx } in cache_index.into_values() {
            let start_cache = cache.clone();
            let start_cancel = cancel.clone();
            let start_err_tx = err_tx.clone();
            tasks.push(tokio::spawn(async move {
                if let Err(e) = start_cache.start(start_cancel).await {
                    report_terminal_error(&start_err_tx, e);
                }
            }));

            let sync_cancel = cancel.clone();
            let sync_err_tx = err_tx.clone();
            tasks.push(tokio::spawn(async move {
                if cache.wait_for_sync(sync_cancel).await {
                    // Releases every dependent controller's barrier.
                    let _ = sync_tx.send(true);
                } else {
                    report_terminal_error(&sync_err_tx, LifecycleError::CacheSyncFailed.into());
                }
                // Dropping sync_tx on the failure path wakes waiters with an
                // error so gated controllers never start.
            }));
        }

        for (controller, sync_flags) in waiters {
            let run_cancel = cancel.clone();
            let run_err_tx = err_tx.clone();
            tasks.push(tokio::spawn(async move {
                for mut flag in sync_flags {
                    if flag.wait_for(|synced| *synced).await.is_err() {
                        // Sync flag sender dropped without ever syncing; the
                        // sync task already reported the terminal error.
                        return;
                    }
                }
                if let Err(e) = controller.start(run_cancel).await {
                    report_terminal_error(&run_err_tx, e);
                }
            }));
        }
        drop(err_tx);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("[Manager] shutdown signal received.");
                    return Ok(());
                }

                maybe_err = err_rx.recv() => {
                    match maybe_err {
                        Some(e) => return Err(e),
                        // Every sender is gone: all tasks finished or are mid
                        // unwind. Surface any panic, then keep blocking until
                        // the scope is cancelled.
                        None => {
                            while let Some(joined) = tasks.next().await {
                                if let Err(join_err) = joined {
                                    return Err(LifecycleError::TaskFailed(join_err).into());
                                }
                            }
                            cancel.cancelled().await;
                            warn!("[Manager] shutdown signal received.");
                            return Ok(());
                        }
                    }
                }

                maybe_joined = tasks.next(), if !tasks.is_empty() => {
                    if let Some(Err(join_err)) = maybe_joined {
                        return Err(LifecycleError::TaskFailed(join_err).into());
                    }
                }
            }
        }
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

fn report_terminal_error(
    err_tx: &mpsc::Sender<Error>,
    e: Error,
) {
    if let Err(dropped) = err_tx.try_send(e) {
        debug!("[Manager] terminal error already reported; dropping: {:?}", dropped);
    }
}
