use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Transport tuning applied when dialing a cluster endpoint.
///
/// Used as the default base for every cluster; a descriptor carrying its own
/// pre-built config bypasses these values entirely.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConnectionConfig {
    /// TCP connect timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_in_ms: u64,

    /// gRPC request completion timeout in milliseconds (0 disables)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_in_ms: u64,

    /// Max concurrent requests per connection
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// TCP keepalive in seconds
    #[serde(default = "default_tcp_keepalive")]
    pub tcp_keepalive_in_secs: u64,

    /// Common TCP setting for all connections
    #[serde(default = "default_tcp_nodelay")]
    pub tcp_nodelay: bool,

    /// HTTP2 keepalive ping interval in seconds
    #[serde(default = "default_h2_keepalive_interval")]
    pub http2_keep_alive_interval_in_secs: u64,

    /// HTTP2 keepalive timeout in seconds
    #[serde(default = "default_h2_keepalive_timeout")]
    pub http2_keep_alive_timeout_in_secs: u64,

    /// Initial connection-level flow control window in bytes
    #[serde(default = "default_conn_window_size")]
    pub connection_window_size: u32,

    /// Initial stream-level flow control window in bytes
    #[serde(default = "default_stream_window_size")]
    pub stream_window_size: u32,

    /// Enable HTTP2 adaptive window sizing
    #[serde(default = "default_adaptive_window")]
    pub adaptive_window: bool,

    /// I/O buffer size in bytes
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// TLS/SSL settings for cluster endpoints
    #[serde(default)]
    pub tls: TlsSettings,
}

/// TLS settings for outbound cluster connections
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TlsSettings {
    /// Enables TLS for cluster connections
    /// Default: false (disabled)
    #[serde(default = "default_enable_tls")]
    pub enable_tls: bool,

    /// Path to Certificate Authority root certificate
    /// Default: "/etc/ssl/certs/ca.pem"
    #[serde(default = "default_ca_path")]
    pub certificate_authority_root_path: String,

    /// Domain name presented for server certificate verification
    #[serde(default)]
    pub domain_name: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_in_ms: default_connect_timeout(),
            request_timeout_in_ms: default_request_timeout(),
            concurrency_limit: default_concurrency_limit(),
            tcp_keepalive_in_secs: default_tcp_keepalive(),
            tcp_nodelay: default_tcp_nodelay(),
            http2_keep_alive_interval_in_secs: default_h2_keepalive_interval(),
            http2_keep_alive_timeout_in_secs: default_h2_keepalive_timeout(),
            connection_window_size: default_conn_window_size(),
            stream_window_size: default_stream_window_size(),
            adaptive_window: default_adaptive_window(),
            buffer_size: default_buffer_size(),
            tls: TlsSettings::default(),
        }
    }
}

impl ConnectionConfig {
    /// Validates configuration sanity
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_in_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "connection timeout must be > 0".to_string(),
            )));
        }

        if self.request_timeout_in_ms != 0 && self.request_timeout_in_ms <= self.connect_timeout_in_ms {
            return Err(Error::Config(ConfigError::Message(format!(
                "request timeout {}ms must exceed connect timeout {}ms",
                self.request_timeout_in_ms, self.connect_timeout_in_ms
            ))));
        }

        if self.http2_keep_alive_timeout_in_secs >= self.http2_keep_alive_interval_in_secs {
            return Err(Error::Config(ConfigError::Message(format!(
                "keepalive timeout {}s must be < interval {}s",
                self.http2_keep_alive_timeout_in_secs, self.http2_keep_alive_interval_in_secs
            ))));
        }

        if self.buffer_size < 1024 {
            return Err(Error::Config(ConfigError::Message(format!(
                "Buffer size {} too small, minimum 1024 bytes",
                self.buffer_size
            ))));
        }

        // Window size validation when not using adaptive windows
        if !self.adaptive_window {
            const MIN_WINDOW: u32 = 65535; // HTTP/2 initial window lower bound
            if self.stream_window_size < MIN_WINDOW {
                return Err(Error::Config(ConfigError::Message(format!(
                    "stream window size {} below minimum {}",
                    self.stream_window_size, MIN_WINDOW
                ))));
            }

            if self.connection_window_size < self.stream_window_size {
                return Err(Error::Config(ConfigError::Message(format!(
                    "connection window {} smaller than stream window {}",
                    self.connection_window_size, self.stream_window_size
                ))));
            }
        }

        self.tls.validate()?;

        Ok(())
    }
}

impl TlsSettings {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.enable_tls && self.certificate_authority_root_path.is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "TLS enabled but no CA certificate path configured".to_string(),
            )));
        }
        Ok(())
    }
}

// Default configuration profile for watch connections

fn default_connect_timeout() -> u64 {
    200
}
fn default_request_timeout() -> u64 {
    5_000
}
fn default_concurrency_limit() -> usize {
    256
}
fn default_tcp_keepalive() -> u64 {
    600
}
fn default_tcp_nodelay() -> bool {
    true
}
fn default_h2_keepalive_interval() -> u64 {
    300
}
fn default_h2_keepalive_timeout() -> u64 {
    20
}
fn default_conn_window_size() -> u32 {
    20_971_520 // 20MB
}
fn default_stream_window_size() -> u32 {
    10_485_760 // 10MB
}
fn default_adaptive_window() -> bool {
    false
}
fn default_buffer_size() -> usize {
    65_536
}
fn default_enable_tls() -> bool {
    false
}
fn default_ca_path() -> String {
    "/etc/ssl/certs/ca.pem".into()
}
