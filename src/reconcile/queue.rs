use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::warn;

use super::Reconciler;
use super::Request;
use super::RequestSink;
use crate::Error;
use crate::Result;

/// Unbounded work queue connecting event handlers to the dispatch loop.
///
/// `add` never blocks. Duplicate requests are permitted; de-duplication, rate
/// limiting, and retry backoff belong to external queue implementations that
/// swap in behind [`RequestSink`].
pub struct RequestQueue {
    tx: mpsc::UnboundedSender<Request>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<Request>>>,
}

impl RequestQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
        }
    }

    pub fn add(
        &self,
        request: Request,
    ) {
        if self.tx.send(request).is_err() {
            warn!("[RequestQueue] receiver dropped; discarding request");
        }
    }

    /// Hands out the consuming half. Returns `None` after the first call.
    pub fn take_receiver(&self) -> Option<mpsc::UnboundedReceiver<Request>> {
        self.rx.lock().take()
    }
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestSink for RequestQueue {
    fn add(
        &self,
        request: Request,
    ) {
        RequestQueue::add(self, request);
    }
}

/// Sequentially drains `queue`, invoking `reconciler` for each request.
///
/// Honors [`ReconcileResult::requeue_after`](super::ReconcileResult) by
/// re-adding the request once the delay elapses, and `requeue` by re-adding
/// immediately. Reconcile errors are logged, not propagated; callers wanting
/// retries on error encode them as a requeue in their reconciler. Returns
/// `Ok(())` once `cancel` fires or the queue closes.
pub async fn dispatch_requests(
    queue: Arc<RequestQueue>,
    reconciler: Arc<dyn Reconciler>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut rx = queue
        .take_receiver()
        .ok_or_else(|| Error::Fatal("request queue receiver already taken".to_string()))?;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("[dispatch] shutdown signal received.");
                return Ok(());
            }

            maybe_request = rx.recv() => {
                let Some(request) = maybe_request else {
                    debug!("[dispatch] request queue closed");
                    return Ok(());
                };

                match reconciler.reconcile(request.clone()).await {
                    Ok(outcome) => {
                        if let Some(delay) = outcome.requeue_after {
                            let queue = queue.clone();
                            tokio::spawn(async move {
                                tokio::time::sleep(delay).await;
                                queue.add(request);
                            });
                        } else if outcome.requeue {
                            queue.add(request);
                        }
                    }
                    Err(e) => {
                        error!("[dispatch] reconcile {} failed: {:?}", request, e);
                    }
                }
            }
        }
    }
}
