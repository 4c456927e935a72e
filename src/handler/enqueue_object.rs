use std::sync::Arc;

use tracing::debug;

use super::Deleted;
use super::Predicate;
use super::WatchedObject;
use crate::reconcile::Request;
use crate::reconcile::RequestSink;

/// Coarse admission filter applied before any predicate runs.
pub type ObjectFilter<O> = Arc<dyn Fn(&O) -> bool + Send + Sync>;

/// Translates object notifications into requests keyed by the object itself.
///
/// Admission runs in a fixed order: the filter first, then every predicate in
/// registration order. A single rejection drops the notification; only fully
/// admitted notifications reach the sink.
pub struct EnqueueRequestForObject<O> {
    cluster: String,
    sink: Arc<dyn RequestSink>,
    filter: Option<ObjectFilter<O>>,
    predicates: Vec<Arc<dyn Predicate<O>>>,
}

impl<O> EnqueueRequestForObject<O>
where
    O: WatchedObject,
{
    pub fn new(
        cluster: impl Into<String>,
        sink: Arc<dyn RequestSink>,
    ) -> Self {
        Self {
            cluster: cluster.into(),
            sink,
            filter: None,
            predicates: Vec::new(),
        }
    }

    pub fn with_filter(
        mut self,
        filter: impl Fn(&O) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Appends a predicate. Predicates run in registration order.
    pub fn with_predicate(
        mut self,
        predicate: Arc<dyn Predicate<O>>,
    ) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn on_add(
        &self,
        object: &O,
    ) {
        if !self.passes_filter(object) {
            return;
        }
        if !self.predicates.iter().all(|predicate| predicate.create(object)) {
            return;
        }
        self.enqueue(object);
    }

    /// Update notifications carry both sides of the transition; when either is
    /// missing the notification is dropped. The request is derived from the
    /// new object.
    pub fn on_update(
        &self,
        old: Option<&O>,
        new: Option<&O>,
    ) {
        let (old, new) = match (old, new) {
            (Some(old), Some(new)) => (old, new),
            _ => {
                debug!("[EnqueueRequestForObject] update notification missing old or new object; dropping");
                return;
            }
        };
        if !self.passes_filter(new) {
            return;
        }
        if !self.predicates.iter().all(|predicate| predicate.update(old, new)) {
            return;
        }
        self.enqueue(new);
    }

    pub fn on_delete(
        &self,
        deleted: &Deleted<O>,
    ) {
        let object = match deleted.object() {
            Some(object) => object,
            None => {
                debug!("[EnqueueRequestForObject] delete notification carried no recoverable object; dropping");
                return;
            }
        };
        if !self.passes_filter(object) {
            return;
        }
        if !self.predicates.iter().all(|predicate| predicate.delete(object)) {
            return;
        }
        self.enqueue(object);
    }

    fn passes_filter(
        &self,
        object: &O,
    ) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(object))
    }

    fn enqueue(
        &self,
        object: &O,
    ) {
        let request = Request::new(&self.cluster, object.namespace(), object.name());
        self.sink.add(request);
    }
}
