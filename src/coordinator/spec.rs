use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;
use tonic::async_trait;

use crate::cluster::ClusterDescriptor;
use crate::manager::Controller;
use crate::reconcile::Reconciler;
use crate::Result;

/// Reference to an observed resource type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl TypeRef {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Renders `group/version`, or the bare version for the core group.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}, Kind={}", self.api_version(), self.kind)
    }
}

/// Named set of type references.
///
/// A specification carrying its own registry forces an isolated
/// connection/cache variant for the types the registry recognizes, keeping
/// unrelated clusters and specifications unaffected.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    name: String,
    types: Vec<TypeRef>,
}

impl TypeRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
        }
    }

    pub fn register(
        mut self,
        type_ref: TypeRef,
    ) -> Self {
        self.types.push(type_ref);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn recognizes(
        &self,
        type_ref: &TypeRef,
    ) -> bool {
        self.types.iter().any(|t| t == type_ref)
    }

    pub fn types(&self) -> &[TypeRef] {
        &self.types
    }
}

/// Per-resource observation options, passed through to the wiring builder.
#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    /// Restrict observation to one namespace; `None` observes all.
    pub namespace: Option<String>,
    /// Server-side label selector expression.
    pub label_selector: Option<String>,
    /// Periodic full re-delivery interval, where the backend supports one.
    pub resync_period: Option<Duration>,
}

/// Secondary watch resolving change notifications back to a primary object
/// through controlling owner references.
#[derive(Debug, Clone)]
pub struct OwnerSpecification {
    /// The owned (secondary) resource type to observe.
    pub type_ref: TypeRef,
    pub options: WatchOptions,
}

impl OwnerSpecification {
    pub fn new(type_ref: TypeRef) -> Self {
        Self {
            type_ref,
            options: WatchOptions::default(),
        }
    }

    pub fn with_options(
        mut self,
        options: WatchOptions,
    ) -> Self {
        self.options = options;
        self
    }
}

/// One declarative watch: a resource type, the reconciler handling its
/// requests, and the optional trimmings (registry override, options,
/// ownership watch). Declared once at coordinator construction.
#[derive(Clone)]
pub struct WatchSpecification {
    type_ref: TypeRef,
    registry: Option<Arc<TypeRegistry>>,
    reconciler: Arc<dyn Reconciler>,
    options: WatchOptions,
    owner: Option<OwnerSpecification>,
}

impl WatchSpecification {
    pub fn new(
        type_ref: TypeRef,
        reconciler: Arc<dyn Reconciler>,
    ) -> Self {
        Self {
            type_ref,
            registry: None,
            reconciler,
            options: WatchOptions::default(),
            owner: None,
        }
    }

    pub fn with_registry(
        mut self,
        registry: Arc<TypeRegistry>,
    ) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_options(
        mut self,
        options: WatchOptions,
    ) -> Self {
        self.options = options;
        self
    }

    pub fn with_owner(
        mut self,
        owner: OwnerSpecification,
    ) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    pub fn registry(&self) -> Option<&Arc<TypeRegistry>> {
        self.registry.as_ref()
    }

    pub fn reconciler(&self) -> &Arc<dyn Reconciler> {
        &self.reconciler
    }

    pub fn options(&self) -> &WatchOptions {
        &self.options
    }

    pub fn owner(&self) -> Option<&OwnerSpecification> {
        self.owner.as_ref()
    }
}

impl fmt::Debug for WatchSpecification {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("WatchSpecification")
            .field("type_ref", &self.type_ref)
            .field("registry", &self.registry.as_ref().map(|r| r.name()))
            .field("options", &self.options)
            .field("owner", &self.owner)
            .finish()
    }
}

/// Wires one specification against one cluster, producing a controller ready
/// for manager registration. Implementations own the transport choice; the
/// shipped [`GrpcClusterConnector`](crate::cluster::GrpcClusterConnector) is
/// one option.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WatchBuilder: Send + Sync + 'static {
    async fn build_watch(
        &self,
        cluster: &ClusterDescriptor,
        spec: &WatchSpecification,
    ) -> Result<Arc<dyn Controller>>;
}
