//! Integration tests for request/response correlation.

mod common;

use async_trait::async_trait;
use bytes::{BufMut, Bytes};
use common::{FakeServer, config, connect_and_open, connect_with, open_channel};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use ua_client::framing::Frame;
use ua_client::ua_types::frame::MessageType;
use ua_client::ua_types::service::attribute::{ReadRequest, ReadResponse, WriteValue};
use ua_client::ua_types::service::fault::ServiceFault;
use ua_client::ua_types::{
    BinaryEncodable, DataValue, DateTime, NodeId, ResponseHeader, ServiceResponse, StatusCode,
    Variant,
};
use ua_client::{Client, Error, Transport, TransportError};
use ua_transport_memory::MemoryTransport;

/// Answer a read with one value per node: ten times the node's number.
async fn answer_read(server: &mut FakeServer, request: &common::ServerRequest) {
    let read: ReadRequest = request.decode();
    let results = read
        .nodes_to_read
        .iter()
        .map(|node| {
            let n = node.node_id.as_numeric().unwrap();
            DataValue::new(i32::try_from(n).unwrap() * 10)
        })
        .collect();
    server
        .reply(
            request,
            &ReadResponse {
                response_header: ResponseHeader::good(request.handle()),
                results,
                ..Default::default()
            },
        )
        .await;
}

fn read_node(client: &Client, n: u32) -> tokio::task::JoinHandle<ua_client::Result<Vec<DataValue>>> {
    let client = client.clone();
    tokio::spawn(async move { client.read_values([NodeId::numeric(1, n)]).await })
}

#[tokio::test]
async fn test_out_of_order_responses_reach_their_callers() {
    let (client, mut server) = connect_and_open().await;

    let readers: Vec<_> = (1..=6).map(|n| (n, read_node(&client, n))).collect();

    let mut requests = Vec::new();
    for _ in 0..6 {
        requests.push(server.next_request().await);
    }
    let handles: HashSet<u32> = requests.iter().map(common::ServerRequest::handle).collect();
    assert_eq!(handles.len(), 6);
    assert_eq!(client.in_flight(), 6);

    // Answer the newest request first, then the rest in reverse order.
    requests.sort_by_key(common::ServerRequest::handle);
    for request in requests.iter().rev() {
        answer_read(&mut server, request).await;
    }

    for (n, reader) in readers {
        let values = reader.await.unwrap().unwrap();
        let expected = i32::try_from(n).unwrap() * 10;
        assert_eq!(values[0].value, Some(Variant::Int32(expected)));
    }
    assert_eq!(client.in_flight(), 0);

    client.shutdown().await;
}

#[tokio::test]
async fn test_unknown_handle_is_discarded() {
    let (client, mut server) = connect_and_open().await;

    let reader = read_node(&client, 3);
    let request = server.next_request().await;

    server
        .respond(
            &request,
            ReadResponse::TYPE_ID,
            &ReadResponse {
                response_header: ResponseHeader::good(999),
                ..Default::default()
            },
        )
        .await;
    answer_read(&mut server, &request).await;

    let values = reader.await.unwrap().unwrap();
    assert_eq!(values[0].value, Some(Variant::Int32(30)));
    assert!(client.connection_error().is_none());

    client.shutdown().await;
}

#[tokio::test]
async fn test_timeout_then_late_response() {
    let mut config = config();
    config.request_timeout_ms = 200;
    let (client, mut server) = connect_with(config).await;
    open_channel(&client, &mut server).await;

    let reader = read_node(&client, 1);
    let late = server.next_request().await;

    match reader.await.unwrap() {
        Err(Error::ResponseTimeout(wait)) => assert_eq!(wait, Duration::from_millis(200)),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(client.in_flight(), 0);

    // The late answer finds no waiter and is dropped.
    answer_read(&mut server, &late).await;

    let reader = read_node(&client, 2);
    let request = server.next_request().await;
    assert_ne!(request.handle(), late.handle());
    answer_read(&mut server, &request).await;
    let values = reader.await.unwrap().unwrap();
    assert_eq!(values[0].value, Some(Variant::Int32(20)));

    client.shutdown().await;
}

/// Memory transport whose writes can be made to fail.
#[derive(Debug)]
struct FlakyTransport {
    inner: MemoryTransport,
    fail_sends: AtomicBool,
}

#[async_trait]
impl Transport for FlakyTransport {
    async fn send(&self, data: Bytes) -> Result<(), TransportError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "write failed",
            )));
        }
        self.inner.send(data).await
    }

    async fn receive(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.inner.receive(buf).await
    }

    fn stop(&self) {
        self.inner.stop();
    }
}

#[tokio::test]
async fn test_write_failure_releases_slot() {
    let _ = tracing_subscriber::fmt::try_init();

    let (client_end, server_end) = MemoryTransport::pair();
    let transport = Arc::new(FlakyTransport {
        inner: client_end,
        fail_sends: AtomicBool::new(false),
    });
    let mut server = FakeServer::new(server_end);
    let connecting = tokio::spawn(Client::with_transport(
        config(),
        Arc::clone(&transport) as Arc<dyn Transport>,
    ));
    server.accept_hello().await;
    let client = connecting.await.unwrap().unwrap();
    open_channel(&client, &mut server).await;

    transport.fail_sends.store(true, Ordering::SeqCst);
    let result = client.read_values([NodeId::numeric(1, 1)]).await;
    assert!(matches!(result, Err(Error::Send(TransportError::Io(_)))));
    assert_eq!(client.in_flight(), 0);

    transport.fail_sends.store(false, Ordering::SeqCst);
    let reader = read_node(&client, 4);
    let request = server.next_request().await;
    answer_read(&mut server, &request).await;
    assert_eq!(
        reader.await.unwrap().unwrap()[0].value,
        Some(Variant::Int32(40))
    );

    client.shutdown().await;
}

#[tokio::test]
async fn test_oversized_request_is_rejected_before_sending() {
    let (client, mut server) = connect_and_open().await;

    let big = "x".repeat(70_000);
    let result = client
        .write(vec![WriteValue {
            node_id: NodeId::numeric(1, 1),
            attribute_id: 13,
            value: DataValue::new(big.as_str()),
            ..Default::default()
        }])
        .await;
    match result {
        Err(Error::MessageTooLarge { size, max }) => {
            assert!(size > 70_000);
            assert_eq!(max, 65536);
        }
        other => panic!("expected message too large, got {other:?}"),
    }
    assert_eq!(client.in_flight(), 0);

    // Nothing was written, so the sequence continues right after the open.
    let reader = read_node(&client, 1);
    let request = server.next_request().await;
    assert_eq!(request.sequence.sequence_number, 2);
    answer_read(&mut server, &request).await;
    reader.await.unwrap().unwrap();

    client.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_sends_are_serialized() {
    let (client, mut server) = connect_and_open().await;

    let readers: Vec<_> = (1..=20).map(|n| read_node(&client, n)).collect();

    let mut requests = Vec::new();
    for _ in 0..20 {
        requests.push(server.next_request().await);
    }

    let handles: HashSet<u32> = requests.iter().map(common::ServerRequest::handle).collect();
    assert_eq!(handles.len(), 20);
    assert!(!handles.contains(&0));

    let sequence_numbers: Vec<u32> = requests
        .iter()
        .map(|request| request.sequence.sequence_number)
        .collect();
    assert_eq!(sequence_numbers, (2..=21).collect::<Vec<_>>());

    let request_ids: HashSet<u32> = requests
        .iter()
        .map(|request| request.sequence.request_id)
        .collect();
    assert_eq!(request_ids.len(), 20);

    for request in &requests {
        answer_read(&mut server, request).await;
    }
    for reader in readers {
        reader.await.unwrap().unwrap();
    }

    client.shutdown().await;
}

#[tokio::test]
async fn test_service_fault_completes_waiter() {
    let (client, mut server) = connect_and_open().await;

    let reader = read_node(&client, 1);
    let request = server.next_request().await;
    server
        .reply(
            &request,
            &ServiceFault {
                response_header: ResponseHeader::with_result(
                    request.handle(),
                    StatusCode::BAD_NODE_ID_UNKNOWN,
                ),
            },
        )
        .await;

    match reader.await.unwrap() {
        Err(Error::ServiceFault { status }) => assert_eq!(status, StatusCode::BAD_NODE_ID_UNKNOWN),
        other => panic!("expected service fault, got {other:?}"),
    }
    assert_eq!(client.in_flight(), 0);
    assert!(client.connection_error().is_none());

    client.shutdown().await;
}

#[tokio::test]
async fn test_malformed_frame_breaks_connection() {
    let mut config = config();
    config.request_timeout_ms = 200;
    let (client, mut server) = connect_with(config).await;
    open_channel(&client, &mut server).await;

    let reader = read_node(&client, 1);
    server.next_request().await;
    server
        .send_frame(&Frame::new(MessageType::Message, Bytes::new()))
        .await;

    // The pending request is not answered and runs into its timeout.
    assert!(matches!(
        reader.await.unwrap(),
        Err(Error::ResponseTimeout(_))
    ));

    let reason = client.connection_error().unwrap();
    assert!(reason.contains("Malformed"), "{reason}");

    assert!(matches!(
        client.read_values([NodeId::numeric(1, 1)]).await,
        Err(Error::ConnectionBroken(_))
    ));

    client.shutdown().await;
}

/// A response header whose diagnostics nest one level per byte.
struct NestedDiagnosticsHeader {
    handle: u32,
    depth: usize,
}

impl BinaryEncodable for NestedDiagnosticsHeader {
    fn byte_len(&self) -> usize {
        8 + 4 + 4 + self.depth + 1
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        DateTime::now().encode(buf);
        buf.put_u32_le(self.handle);
        StatusCode::GOOD.encode(buf);
        buf.put_bytes(0x40, self.depth);
        buf.put_u8(0);
    }
}

#[tokio::test]
async fn test_deeply_nested_diagnostics_break_connection() {
    let mut config = config();
    config.request_timeout_ms = 200;
    let (client, mut server) = connect_with(config).await;
    open_channel(&client, &mut server).await;

    let reader = read_node(&client, 1);
    let request = server.next_request().await;
    let header = NestedDiagnosticsHeader {
        handle: request.handle(),
        depth: 60_000,
    };
    server
        .respond(&request, ReadResponse::TYPE_ID, &header)
        .await;

    assert!(matches!(
        reader.await.unwrap(),
        Err(Error::ResponseTimeout(_))
    ));

    let reason = client.connection_error().unwrap();
    assert!(reason.contains("nested deeper"), "{reason}");
    assert!(matches!(
        client.read_values([NodeId::numeric(1, 1)]).await,
        Err(Error::ConnectionBroken(_))
    ));

    client.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_fails_pending_requests() {
    let (client, mut server) = connect_and_open().await;

    let reader = read_node(&client, 1);
    server.next_request().await;

    client.shutdown().await;

    assert!(matches!(reader.await.unwrap(), Err(Error::ChannelClosed)));
    assert!(matches!(
        client.read_values([NodeId::numeric(1, 1)]).await,
        Err(Error::ShuttingDown)
    ));
    assert_eq!(client.in_flight(), 0);

    client.shutdown().await;
}

#[tokio::test]
async fn test_request_header_is_stamped() {
    let (client, mut server) = connect_and_open().await;

    let reader = read_node(&client, 1);
    let request = server.next_request().await;

    assert_eq!(request.request_header.timeout_hint, 10_000);
    assert_eq!(request.request_header.authentication_token, NodeId::NULL);
    assert_ne!(request.request_header.timestamp.0, 0);
    assert_ne!(request.handle(), 0);

    answer_read(&mut server, &request).await;
    reader.await.unwrap().unwrap();

    client.shutdown().await;
}
