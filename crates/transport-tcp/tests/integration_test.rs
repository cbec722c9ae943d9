//! Integration tests for TCP transport

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::info;
use ua_transport::{Transport, TransportError};
use ua_transport_tcp::TcpTransport;

async fn echo_listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, format!("opc.tcp://127.0.0.1:{port}"))
}

#[tokio::test]
async fn test_tcp_transport_basic() {
    let _ = tracing_subscriber::fmt::try_init();

    let (listener, url) = echo_listener().await;
    let server = tokio::spawn(async move {
        let (mut stream, addr) = listener.accept().await.unwrap();
        info!("Accepted connection from {addr}");
        let mut buf = [0u8; 64];
        let n = stream.read(&mut buf).await.unwrap();
        stream.write_all(&buf[..n]).await.unwrap();
    });

    let transport = TcpTransport::connect(&url).await.unwrap();
    transport.send(Bytes::from_static(b"HELF")).await.unwrap();

    let mut buf = [0u8; 64];
    let mut received = Vec::new();
    while received.len() < 4 {
        let n = timeout(Duration::from_secs(5), transport.receive(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_ne!(n, 0, "peer closed early");
        received.extend_from_slice(&buf[..n]);
    }
    assert_eq!(&received, b"HELF");

    server.await.unwrap();
}

#[tokio::test]
async fn test_peer_close_reads_zero() {
    let _ = tracing_subscriber::fmt::try_init();

    let (listener, url) = echo_listener().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
    });

    let transport = TcpTransport::connect(&url).await.unwrap();
    server.await.unwrap();

    let mut buf = [0u8; 8];
    let n = timeout(Duration::from_secs(5), transport.receive(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(n, 0);
}

#[tokio::test]
async fn test_stop_interrupts_blocked_receive() {
    let _ = tracing_subscriber::fmt::try_init();

    let (listener, url) = echo_listener().await;
    // Keep the server side open and silent.
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(stream);
    });

    let transport = Arc::new(TcpTransport::connect(&url).await.unwrap());
    let reader = {
        let transport = transport.clone();
        tokio::spawn(async move {
            let mut buf = [0u8; 8];
            transport.receive(&mut buf).await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    transport.stop();

    let result = timeout(Duration::from_secs(1), reader).await.unwrap().unwrap();
    assert!(matches!(result, Err(TransportError::Stopped)));
    assert!(matches!(
        transport.send(Bytes::from_static(b"x")).await,
        Err(TransportError::Stopped)
    ));

    server.abort();
}

#[tokio::test]
async fn test_connect_refused() {
    let _ = tracing_subscriber::fmt::try_init();

    // Bind then drop to get a port nobody listens on.
    let (listener, url) = echo_listener().await;
    drop(listener);

    let result = TcpTransport::connect(&url).await;
    assert!(matches!(result, Err(TransportError::ConnectFailed { .. })));
}
