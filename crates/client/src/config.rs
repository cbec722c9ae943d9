//! Client configuration.

use crate::client::Client;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use ua_transport::Transport;
use ua_types::ByteString;
use ua_types::frame::{AsymmetricAlgorithmHeader, Hello};

/// Security policy URI for unsecured channels.
pub const SECURITY_POLICY_NONE: &str = "http://opcfoundation.org/UA/SecurityPolicy#None";

/// Configuration for a [`Client`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Endpoint to connect to, `opc.tcp://host:port/path`.
    pub endpoint_url: String,
    /// Security policy requested when opening the secure channel.
    pub security_policy_uri: String,
    /// DER encoded client certificate, empty for policy None.
    pub sender_certificate: Vec<u8>,
    /// Thumbprint of the server certificate, empty for policy None.
    pub receiver_certificate_thumbprint: Vec<u8>,
    /// Protocol version announced in the hello message.
    pub protocol_version: u32,
    /// Largest frame the client accepts.
    pub receive_buffer_size: u32,
    /// Largest frame the client sends.
    pub send_buffer_size: u32,
    /// Largest message the client accepts.
    pub max_message_size: u32,
    /// Most chunks per message.
    pub max_chunk_count: u32,
    /// Timeout stamped into requests that leave theirs at zero.
    pub request_timeout_ms: u32,
    /// Requested session timeout.
    pub session_timeout_ms: u64,
    /// Largest response the server may send for this session.
    pub max_response_message_size: u32,
    /// Requested secure channel token lifetime.
    pub secure_channel_lifetime_ms: u32,
    /// Human readable name of the session.
    pub session_name: String,
    /// Application name sent in the client description.
    pub application_name: String,
    /// Application URI sent in the client description.
    pub application_uri: String,
    /// Product URI sent in the client description.
    pub product_uri: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint_url: "opc.tcp://localhost:4840".to_string(),
            security_policy_uri: SECURITY_POLICY_NONE.to_string(),
            sender_certificate: Vec::new(),
            receiver_certificate_thumbprint: Vec::new(),
            protocol_version: 0,
            receive_buffer_size: 65536,
            send_buffer_size: 65536,
            max_message_size: 65536,
            max_chunk_count: 256,
            request_timeout_ms: 10_000,
            session_timeout_ms: 1_200_000,
            max_response_message_size: 65536,
            secure_channel_lifetime_ms: 300_000,
            session_name: "ua-client session".to_string(),
            application_name: "ua-client".to_string(),
            application_uri: "urn:ua-client".to_string(),
            product_uri: "urn:ua-client".to_string(),
        }
    }
}

impl ClientConfig {
    /// Configuration for `endpoint_url` with defaults for everything else.
    #[must_use]
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            ..Self::default()
        }
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the text is not valid TOML or fails
    /// validation.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint_url.is_empty() {
            return Err(Error::Config("Endpoint URL must not be empty".to_string()));
        }

        // Smallest chunk size the protocol allows.
        if self.receive_buffer_size < 8192 || self.send_buffer_size < 8192 {
            return Err(Error::Config(
                "Buffer sizes must be at least 8192 bytes".to_string(),
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Default timeout for a request.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.request_timeout_ms))
    }

    /// The hello message for this configuration.
    #[must_use]
    pub fn hello(&self) -> Hello {
        Hello {
            protocol_version: self.protocol_version,
            receive_buffer_size: self.receive_buffer_size,
            send_buffer_size: self.send_buffer_size,
            max_message_size: self.max_message_size,
            max_chunk_count: self.max_chunk_count,
            endpoint_url: self.endpoint_url.clone(),
        }
    }

    /// The secure connection parameters derived from this configuration.
    #[must_use]
    pub fn connection_params(&self) -> SecureConnectionParams {
        SecureConnectionParams {
            endpoint_url: self.endpoint_url.clone(),
            security_policy_uri: self.security_policy_uri.clone(),
            sender_certificate: ByteString(self.sender_certificate.clone()),
            receiver_certificate_thumbprint: ByteString(
                self.receiver_certificate_thumbprint.clone(),
            ),
        }
    }
}

/// Endpoint and security material of a connection. Fixed once the client
/// is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureConnectionParams {
    /// Endpoint URL.
    pub endpoint_url: String,
    /// Security policy URI.
    pub security_policy_uri: String,
    /// Client certificate.
    pub sender_certificate: ByteString,
    /// Server certificate thumbprint.
    pub receiver_certificate_thumbprint: ByteString,
}

impl SecureConnectionParams {
    /// Algorithm header for `OPN` frames.
    #[must_use]
    pub fn asymmetric_header(&self) -> AsymmetricAlgorithmHeader {
        AsymmetricAlgorithmHeader {
            security_policy_uri: self.security_policy_uri.clone(),
            sender_certificate: self.sender_certificate.clone(),
            receiver_certificate_thumbprint: self.receiver_certificate_thumbprint.clone(),
        }
    }
}

/// Builder for creating clients.
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Create a new client builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    #[must_use]
    pub const fn with_config(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Set the endpoint URL.
    #[must_use]
    pub fn endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.config.endpoint_url = endpoint_url.into();
        self
    }

    /// Set the security policy URI.
    #[must_use]
    pub fn security_policy_uri(mut self, uri: impl Into<String>) -> Self {
        self.config.security_policy_uri = uri.into();
        self
    }

    /// Set the default request timeout.
    #[must_use]
    pub const fn request_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.config.request_timeout_ms = timeout_ms;
        self
    }

    /// Set the requested session timeout.
    #[must_use]
    pub const fn session_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.session_timeout_ms = timeout_ms;
        self
    }

    /// Set the receive and send buffer sizes announced in the hello.
    #[must_use]
    pub const fn buffer_sizes(mut self, receive: u32, send: u32) -> Self {
        self.config.receive_buffer_size = receive;
        self.config.send_buffer_size = send;
        self
    }

    /// Set the application name.
    #[must_use]
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.config.application_name = name.into();
        self
    }

    /// The configuration built so far.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        self.config
    }

    /// Connect over TCP.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the connection
    /// fails or the handshake is rejected.
    pub async fn connect(self) -> Result<Client> {
        self.config.validate()?;
        Client::connect(self.config).await
    }

    /// Connect over an existing transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the handshake
    /// fails.
    pub async fn with_transport(self, transport: Arc<dyn Transport>) -> Result<Client> {
        self.config.validate()?;
        Client::with_transport(self.config, transport).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.security_policy_uri, SECURITY_POLICY_NONE);
        assert_eq!(config.receive_buffer_size, 65536);
        assert_eq!(config.max_chunk_count, 256);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
            endpoint_url = "opc.tcp://plc.local:4841"
            request_timeout_ms = 2500
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint_url, "opc.tcp://plc.local:4841");
        assert_eq!(config.request_timeout_ms, 2500);
        assert_eq!(config.max_message_size, 65536);
        assert_eq!(config.session_name, "ua-client session");
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();
        config.receive_buffer_size = 1024;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let result = ClientConfig::from_toml_str("request_timeout_ms = 0");
        assert!(matches!(result, Err(Error::Config(_))));

        let result = ClientConfig::from_toml_str("endpoint_url = 7");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        std::fs::write(&path, "session_name = \"line 1\"\n").unwrap();

        let config = ClientConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.session_name, "line 1");

        let missing = ClientConfig::from_toml_file(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_and_params() {
        let config = ClientBuilder::new()
            .endpoint_url("opc.tcp://10.0.0.5:4840")
            .request_timeout_ms(500)
            .build();

        assert_eq!(config.request_timeout(), Duration::from_millis(500));

        let hello = config.hello();
        assert_eq!(hello.endpoint_url, "opc.tcp://10.0.0.5:4840");
        assert_eq!(hello.receive_buffer_size, 65536);

        let header = config.connection_params().asymmetric_header();
        assert_eq!(header.security_policy_uri, SECURITY_POLICY_NONE);
        assert!(header.sender_certificate.is_empty());
    }
}
