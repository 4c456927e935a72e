/// Minimal contract an observed object must satisfy for request derivation.
pub trait WatchedObject {
    fn namespace(&self) -> &str;

    fn name(&self) -> &str;

    /// Owner references in declaration order. Order matters: controlling
    /// owner resolution takes the first match.
    fn owner_references(&self) -> &[OwnerReference];
}

/// Reference from an owned object back to one of its owners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    /// Set on at most one reference of a well-formed object: the owner that
    /// manages this object's lifecycle.
    pub controller: bool,
}

/// Delete notification payload.
///
/// The backend may have already dropped the object from its view, leaving
/// only a tombstone carrying the last-known state, if any.
#[derive(Debug, Clone)]
pub enum Deleted<O> {
    Object(O),
    Tombstone(Option<O>),
}

impl<O> Deleted<O> {
    /// The object this notification refers to, recovered from the tombstone
    /// when necessary. `None` means nothing is recoverable and the
    /// notification must be dropped.
    pub fn object(&self) -> Option<&O> {
        match self {
            Deleted::Object(object) => Some(object),
            Deleted::Tombstone(object) => object.as_ref(),
        }
    }
}

/// Ordered event admission hook. Every registered predicate of the matching
/// event kind must accept or the notification is dropped; the default
/// implementations accept everything.
pub trait Predicate<O>: Send + Sync {
    fn create(
        &self,
        _object: &O,
    ) -> bool {
        true
    }

    fn update(
        &self,
        _old: &O,
        _new: &O,
    ) -> bool {
        true
    }

    fn delete(
        &self,
        _object: &O,
    ) -> bool {
        true
    }
}
