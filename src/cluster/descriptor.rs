use std::fmt;

use crate::config::ConnectionConfig;

/// Identity and connection parameters of one target cluster.
///
/// The `name` is the unique key under which the coordinator tracks the
/// cluster. Descriptors are immutable once constructed; to change a
/// cluster's parameters, stop it and start it again with a new descriptor.
#[derive(Clone)]
pub struct ClusterDescriptor {
    name: String,
    endpoint: String,
    token: String,
    insecure: bool,
    connection: Option<ConnectionConfig>,
}

impl ClusterDescriptor {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            token: String::new(),
            insecure: false,
            connection: None,
        }
    }

    /// Bearer token presented to the cluster. The connector does not attach
    /// it; request-issuing callers do.
    pub fn with_token(
        mut self,
        token: impl Into<String>,
    ) -> Self {
        self.token = token.into();
        self
    }

    /// Skips server certificate verification for this cluster.
    pub fn with_insecure(mut self) -> Self {
        self.insecure = true;
        self
    }

    /// Pre-built connection tuning. When present it is used verbatim and the
    /// insecure flag and shared defaults are ignored.
    pub fn with_connection(
        mut self,
        connection: ConnectionConfig,
    ) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_insecure(&self) -> bool {
        self.insecure
    }

    pub fn connection(&self) -> Option<&ConnectionConfig> {
        self.connection.as_ref()
    }

    /// Resolves the connection tuning for this cluster: a pre-built config
    /// wins verbatim, otherwise the supplied defaults are taken with the
    /// descriptor's insecure flag applied on top.
    pub fn resolve_connection(
        &self,
        defaults: &ConnectionConfig,
    ) -> ConnectionConfig {
        if let Some(connection) = &self.connection {
            return connection.clone();
        }

        let mut resolved = defaults.clone();
        if self.insecure {
            resolved.tls.enable_tls = false;
        }
        resolved
    }
}

impl fmt::Debug for ClusterDescriptor {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ClusterDescriptor")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("insecure", &self.insecure)
            .field("connection", &self.connection)
            .finish()
    }
}
