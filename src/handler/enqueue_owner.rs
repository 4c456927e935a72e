use std::sync::Arc;

use tracing::debug;

use super::Deleted;
use super::ObjectFilter;
use super::OwnerReference;
use super::Predicate;
use super::WatchedObject;
use crate::coordinator::TypeRef;
use crate::reconcile::Request;
use crate::reconcile::RequestSink;

/// Translates object notifications into requests keyed by the object's
/// controlling owner.
///
/// Admission matches [`EnqueueRequestForObject`]: filter first, then every
/// predicate in registration order. After admission the owner reference list
/// is scanned for the first controlling reference of the configured type;
/// objects without one produce nothing.
///
/// [`EnqueueRequestForObject`]: super::EnqueueRequestForObject
pub struct EnqueueRequestForOwner<O> {
    cluster: String,
    owner_type: TypeRef,
    sink: Arc<dyn RequestSink>,
    filter: Option<ObjectFilter<O>>,
    predicates: Vec<Arc<dyn Predicate<O>>>,
}

impl<O> EnqueueRequestForOwner<O>
where
    O: WatchedObject,
{
    pub fn new(
        cluster: impl Into<String>,
        owner_type: TypeRef,
        sink: Arc<dyn RequestSink>,
    ) -> Self {
        Self {
            cluster: cluster.into(),
            owner_type,
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
        self.enqueue_owner(object);
    }

    /// Update notifications carry both sides of the transition; when either is
    /// missing the notification is dropped. Owner resolution runs against the
    /// new object.
    pub fn on_update(
        &self,
        old: Option<&O>,
        new: Option<&O>,
    ) {
        let (old, new) = match (old, new) {
            (Some(old), Some(new)) => (old, new),
            _ => {
                debug!("[EnqueueRequestForOwner] update notification missing old or new object; dropping");
                return;
            }
        };
        if !self.passes_filter(new) {
            return;
        }
        if !self.predicates.iter().all(|predicate| predicate.update(old, new)) {
            return;
        }
        self.enqueue_owner(new);
    }

    pub fn on_delete(
        &self,
        deleted: &Deleted<O>,
    ) {
        let object = match deleted.object() {
            Some(object) => object,
            None => {
                debug!("[EnqueueRequestForOwner] delete notification carried no recoverable object; dropping");
                return;
            }
        };
        if !self.passes_filter(object) {
            return;
        }
        if !self.predicates.iter().all(|predicate| predicate.delete(object)) {
            return;
        }
        self.enqueue_owner(object);
    }

    fn passes_filter(
        &self,
        object: &O,
    ) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(object))
    }

    fn enqueue_owner(
        &self,
        object: &O,
    ) {
        match controlling_owner(object.owner_references(), &self.owner_type) {
            Some(owner) => {
                let request = Request::new(&self.cluster, object.namespace(), &owner.name);
                self.sink.add(request);
            }
            None => {
                debug!(
                    "[EnqueueRequestForOwner] no controlling {} owner on {}/{}; dropping",
                    self.owner_type,
                    object.namespace(),
                    object.name()
                );
            }
        }
    }
}

/// Resolves the controlling owner of type `target` from a reference list.
///
/// Only references with the controlling flag set are considered, and both
/// kind and api-version must match. The first matching reference in list
/// order wins; later ones are never inspected.
pub fn controlling_owner<'a>(
    references: &'a [OwnerReference],
    target: &TypeRef,
) -> Option<&'a OwnerReference> {
    let api_version = target.api_version();
    references.iter().find(|reference| {
        reference.controller && reference.kind == target.kind && reference.api_version == api_version
    })
}
