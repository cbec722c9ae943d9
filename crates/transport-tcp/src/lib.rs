//! TCP transport implementation
//!
//! Connects to `opc.tcp://host[:port]` endpoints. Nagle's algorithm is
//! disabled because the engine writes whole frames. Stopping the transport
//! interrupts any blocked read or write.

use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use ua_transport::{Transport, TransportError};
use url::Url;

/// URL scheme of binary TCP endpoints
pub const SCHEME: &str = "opc.tcp";

/// Port used when the endpoint URL has none
pub const DEFAULT_PORT: u16 = 4840;

/// Extract host and port from an `opc.tcp://` endpoint URL.
///
/// # Errors
///
/// Returns [`TransportError::InvalidAddress`] if the URL does not parse, uses
/// another scheme or has no host.
pub fn parse_endpoint(endpoint_url: &str) -> Result<(String, u16), TransportError> {
    let url = Url::parse(endpoint_url)
        .map_err(|e| TransportError::InvalidAddress(format!("{endpoint_url}: {e}")))?;

    if url.scheme() != SCHEME {
        return Err(TransportError::InvalidAddress(format!(
            "{endpoint_url}: expected scheme {SCHEME}, got {}",
            url.scheme()
        )));
    }

    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| TransportError::InvalidAddress(format!("{endpoint_url}: missing host")))?;

    // IPv6 literals come back bracketed.
    let host = host.trim_start_matches('[').trim_end_matches(']').to_string();

    Ok((host, url.port().unwrap_or(DEFAULT_PORT)))
}

/// TCP transport implementation
#[derive(Debug)]
pub struct TcpTransport {
    peer_addr: SocketAddr,
    reader: Mutex<OwnedReadHalf>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
    stop: CancellationToken,
}

impl TcpTransport {
    /// Connect to an `opc.tcp://` endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the connection fails.
    pub async fn connect(endpoint_url: &str) -> Result<Self, TransportError> {
        let (host, port) = parse_endpoint(endpoint_url)?;

        debug!("Connecting to {}:{}", host, port);

        let stream = TcpStream::connect((host.as_str(), port))
            .await
            .map_err(|e| TransportError::ConnectFailed {
                address: format!("{host}:{port}"),
                reason: e.to_string(),
            })?;

        Self::from_stream(stream)
    }

    /// Wrap an already connected stream
    ///
    /// # Errors
    ///
    /// Returns an error if socket options cannot be applied.
    pub fn from_stream(stream: TcpStream) -> Result<Self, TransportError> {
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr()?;
        let (reader, writer) = stream.into_split();

        info!("TCP transport connected to {}", peer_addr);

        Ok(Self {
            peer_addr,
            reader: Mutex::new(reader),
            writer: Arc::new(Mutex::new(writer)),
            stop: CancellationToken::new(),
        })
    }

    /// Address of the peer
    #[must_use]
    pub const fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&self, data: Bytes) -> Result<(), TransportError> {
        if self.stop.is_cancelled() {
            return Err(TransportError::Stopped);
        }

        tokio::select! {
            biased;
            () = self.stop.cancelled() => Err(TransportError::Stopped),
            result = async {
                let mut writer = self.writer.lock().await;
                writer.write_all(&data).await?;
                writer.flush().await
            } => result.map_err(TransportError::Io),
        }
    }

    async fn receive(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if self.stop.is_cancelled() {
            return Err(TransportError::Stopped);
        }

        tokio::select! {
            biased;
            () = self.stop.cancelled() => Err(TransportError::Stopped),
            result = async {
                let mut reader = self.reader.lock().await;
                reader.read(buf).await
            } => result.map_err(TransportError::Io),
        }
    }

    fn stop(&self) {
        if self.stop.is_cancelled() {
            return;
        }
        debug!("Stopping TCP transport to {}", self.peer_addr);
        self.stop.cancel();

        // Half-close so the peer sees end of stream even while our halves
        // are still owned by the transport.
        if let Ok(mut writer) = Arc::clone(&self.writer).try_lock_owned() {
            let peer_addr = self.peer_addr;
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = writer.shutdown().await {
                        warn!("Failed to shut down TCP stream to {}: {}", peer_addr, e);
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint_with_port() {
        assert_eq!(
            parse_endpoint("opc.tcp://plc.local:48010").unwrap(),
            ("plc.local".to_string(), 48010)
        );
    }

    #[test]
    fn test_parse_endpoint_default_port() {
        assert_eq!(
            parse_endpoint("opc.tcp://10.0.0.5/UA/Server").unwrap(),
            ("10.0.0.5".to_string(), DEFAULT_PORT)
        );
    }

    #[test]
    fn test_parse_endpoint_ipv6() {
        assert_eq!(
            parse_endpoint("opc.tcp://[::1]:4841").unwrap(),
            ("::1".to_string(), 4841)
        );
    }

    #[test]
    fn test_parse_endpoint_rejects_other_schemes() {
        assert!(matches!(
            parse_endpoint("http://localhost:4840"),
            Err(TransportError::InvalidAddress(_))
        ));
        assert!(matches!(
            parse_endpoint("not a url"),
            Err(TransportError::InvalidAddress(_))
        ));
    }
}
