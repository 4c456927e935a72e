use std::path::PathBuf;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;
use tokio::time::timeout;
use tonic::async_trait;
use tonic::transport::Certificate;
use tonic::transport::Channel;
use tonic::transport::ClientTlsConfig;
use tonic::transport::Endpoint;
use tracing::debug;

use super::ClusterDescriptor;
use crate::config::ConnectionConfig;
use crate::ConnectionError;
use crate::Error;
use crate::Result;

/// Establishes a transport channel to a target cluster.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterConnector: Send + Sync + 'static {
    async fn connect(
        &self,
        cluster: &ClusterDescriptor,
    ) -> Result<Channel>;
}

/// gRPC connector applying the tuning knobs from [`ConnectionConfig`].
///
/// Each cluster's descriptor resolves its own settings against the shared
/// defaults before dialing, so per-cluster overrides never leak across
/// clusters.
pub struct GrpcClusterConnector {
    defaults: ConnectionConfig,
}

impl GrpcClusterConnector {
    pub fn new(defaults: ConnectionConfig) -> Self {
        Self { defaults }
    }

    async fn build_endpoint(
        cluster: &ClusterDescriptor,
        settings: &ConnectionConfig,
    ) -> Result<Endpoint> {
        let mut endpoint = Endpoint::try_from(cluster.endpoint().to_string())
            .map_err(|_| ConnectionError::InvalidEndpoint(cluster.endpoint().to_string()))?
            .connect_timeout(Duration::from_millis(settings.connect_timeout_in_ms))
            .tcp_keepalive(Some(Duration::from_secs(settings.tcp_keepalive_in_secs)))
            .tcp_nodelay(settings.tcp_nodelay)
            .http2_keep_alive_interval(Duration::from_secs(settings.http2_keep_alive_interval_in_secs))
            .keep_alive_timeout(Duration::from_secs(settings.http2_keep_alive_timeout_in_secs))
            .http2_adaptive_window(settings.adaptive_window)
            .initial_connection_window_size(settings.connection_window_size)
            .initial_stream_window_size(settings.stream_window_size)
            .buffer_size(settings.buffer_size)
            .concurrency_limit(settings.concurrency_limit);

        // 0 disables the per-request deadline.
        if settings.request_timeout_in_ms != 0 {
            endpoint = endpoint.timeout(Duration::from_millis(settings.request_timeout_in_ms));
        }

        if settings.tls.enable_tls {
            let ca_path = PathBuf::from(&settings.tls.certificate_authority_root_path);
            let ca_pem = tokio::fs::read(&ca_path).await.map_err(|source| {
                ConnectionError::CertificateRead {
                    path: ca_path.clone(),
                    source,
                }
            })?;

            let mut tls = ClientTlsConfig::new().ca_certificate(Certificate::from_pem(ca_pem));
            if !settings.tls.domain_name.is_empty() {
                tls = tls.domain_name(settings.tls.domain_name.clone());
            }
            endpoint = endpoint
                .tls_config(tls)
                .map_err(|_| ConnectionError::TlsHandshakeFailure)?;
        }

        Ok(endpoint)
    }
}

#[async_trait]
impl ClusterConnector for GrpcClusterConnector {
    async fn connect(
        &self,
        cluster: &ClusterDescriptor,
    ) -> Result<Channel> {
        let settings = cluster.resolve_connection(&self.defaults);
        let endpoint = Self::build_endpoint(cluster, &settings).await?;

        let dial = endpoint.connect();
        let channel = if settings.request_timeout_in_ms != 0 {
            // Hard ceiling over the whole dial, including TLS negotiation;
            // connect_timeout only bounds the TCP establishment inside it.
            let deadline = Duration::from_millis(settings.request_timeout_in_ms);
            timeout(deadline, dial)
                .await
                .map_err(|_| ConnectionError::Timeout {
                    cluster: cluster.name().to_string(),
                    duration: deadline,
                })?
        } else {
            dial.await
        }
        .map_err(|err| {
            // Debug level: dial failures are routine while a target cluster
            // is still coming up.
            debug!(
                "[GrpcClusterConnector] connect to {} failed: {}",
                cluster.endpoint(),
                err
            );
            Error::from(err)
        })?;

        debug!("[GrpcClusterConnector] connected to cluster {}", cluster.name());
        Ok(channel)
    }
}
