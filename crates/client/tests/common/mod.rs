//! Scripted fake server shared by the client integration tests.

#![allow(dead_code)]

use bytes::{Buf, Bytes};
use std::sync::Arc;
use std::time::Duration;
use ua_client::framing::{Frame, FrameReader};
use ua_client::ua_types::frame::{
    Acknowledge, AsymmetricAlgorithmHeader, ErrorMessage, Hello, MessageType, SequenceHeader,
    SymmetricAlgorithmHeader,
};
use ua_client::ua_types::service::secure_channel::{
    ChannelSecurityToken, OpenSecureChannelResponse,
};
use ua_client::ua_types::{
    BinaryDecodable, BinaryEncodable, DateTime, NodeId, RequestHeader, ResponseHeader,
    ServiceResponse,
};
use ua_client::{Client, ClientConfig, Transport};
use ua_transport_memory::MemoryTransport;

pub const ENDPOINT: &str = "opc.tcp://fake-server:4840";
pub const CHANNEL_ID: u32 = 17;
pub const TOKEN_ID: u32 = 1;

/// A request as seen by the server.
#[derive(Debug, Clone)]
pub struct ServerRequest {
    pub message_type: MessageType,
    pub secure_channel_id: u32,
    pub sequence: SequenceHeader,
    pub token_id: Option<u32>,
    pub type_id: u32,
    pub request_header: RequestHeader,
    body: Bytes,
}

impl ServerRequest {
    pub const fn handle(&self) -> u32 {
        self.request_header.request_handle
    }

    /// Decode the whole request, header included.
    pub fn decode<T: BinaryDecodable>(&self) -> T {
        T::decode(&mut self.body.clone()).unwrap()
    }
}

pub struct FakeServer {
    transport: Arc<MemoryTransport>,
    reader: FrameReader,
    sequence_number: u32,
    pub token_id: u32,
}

impl FakeServer {
    pub fn new(transport: MemoryTransport) -> Self {
        let transport = Arc::new(transport);
        let reader = FrameReader::new(Arc::clone(&transport) as Arc<dyn Transport>, 1 << 20);
        Self {
            transport,
            reader,
            sequence_number: 1000,
            token_id: TOKEN_ID,
        }
    }

    pub fn transport(&self) -> &MemoryTransport {
        &self.transport
    }

    /// Read the hello and answer with an acknowledge.
    pub async fn accept_hello(&mut self) -> Hello {
        let hello = self.read_hello().await;
        self.send_frame(&Frame::message(
            MessageType::Acknowledge,
            &Acknowledge {
                protocol_version: 0,
                receive_buffer_size: 65536,
                send_buffer_size: 65536,
                max_message_size: 0,
                max_chunk_count: 0,
            },
        ))
        .await;
        hello
    }

    pub async fn read_hello(&mut self) -> Hello {
        let frame = self.next_frame().await;
        assert_eq!(frame.message_type(), MessageType::Hello);
        Hello::decode(&mut frame.payload.clone()).unwrap()
    }

    pub async fn reject_hello(&mut self, error: ErrorMessage) {
        self.read_hello().await;
        self.send_frame(&Frame::message(MessageType::Error, &error))
            .await;
    }

    pub async fn next_frame(&mut self) -> Frame {
        tokio::time::timeout(Duration::from_secs(5), self.reader.next_frame())
            .await
            .expect("timed out waiting for a frame")
            .unwrap()
            .expect("client closed the connection")
    }

    pub async fn next_request(&mut self) -> ServerRequest {
        let frame = self.next_frame().await;
        let message_type = frame.message_type();
        let mut buf = frame.payload;

        let secure_channel_id = buf.get_u32_le();
        let token_id = if message_type == MessageType::Open {
            AsymmetricAlgorithmHeader::decode(&mut buf).unwrap();
            None
        } else {
            Some(SymmetricAlgorithmHeader::decode(&mut buf).unwrap().token_id)
        };
        let sequence = SequenceHeader::decode(&mut buf).unwrap();
        let type_id = NodeId::decode(&mut buf).unwrap().as_numeric().unwrap();
        let body = buf.clone();
        let request_header = RequestHeader::decode(&mut buf).unwrap();

        ServerRequest {
            message_type,
            secure_channel_id,
            sequence,
            token_id,
            type_id,
            request_header,
            body,
        }
    }

    /// Answer `request` with `message` encoded under `type_id`.
    pub async fn respond<M: BinaryEncodable>(&mut self, request: &ServerRequest, type_id: u32, message: &M) {
        let frame = self.response_frame(request, type_id, message);
        self.send_frame(&frame).await;
    }

    /// Answer `request` with a typed response.
    pub async fn reply<R: ServiceResponse + BinaryEncodable>(&mut self, request: &ServerRequest, response: &R) {
        self.respond(request, R::TYPE_ID, response).await;
    }

    /// Build the frame answering `request` without sending it.
    pub fn response_frame<M: BinaryEncodable>(
        &mut self,
        request: &ServerRequest,
        type_id: u32,
        message: &M,
    ) -> Frame {
        self.sequence_number += 1;
        let sequence = SequenceHeader {
            sequence_number: self.sequence_number,
            request_id: request.sequence.request_id,
        };

        if request.message_type == MessageType::Open {
            Frame::secure(
                MessageType::Open,
                CHANNEL_ID,
                &AsymmetricAlgorithmHeader {
                    security_policy_uri: "http://opcfoundation.org/UA/SecurityPolicy#None".into(),
                    ..Default::default()
                },
                &sequence,
                type_id,
                message,
            )
        } else {
            Frame::secure(
                MessageType::Message,
                CHANNEL_ID,
                &SymmetricAlgorithmHeader {
                    token_id: self.token_id,
                },
                &sequence,
                type_id,
                message,
            )
        }
    }

    /// Answer an open secure channel request.
    pub async fn reply_open(&mut self, request: &ServerRequest) -> ChannelSecurityToken {
        let token = ChannelSecurityToken {
            channel_id: CHANNEL_ID,
            token_id: self.token_id,
            created_at: DateTime::now(),
            revised_lifetime: 600_000,
        };
        let response = OpenSecureChannelResponse {
            response_header: ResponseHeader::good(request.handle()),
            security_token: token.clone(),
            ..Default::default()
        };
        self.reply(request, &response).await;
        token
    }

    pub async fn send_frame(&self, frame: &Frame) {
        self.send_bytes(frame.to_bytes()).await;
    }

    pub async fn send_bytes(&self, bytes: Bytes) {
        self.transport.send(bytes).await.unwrap();
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::new(ENDPOINT)
}

/// A client connected to a fake server, handshake done.
pub async fn connect() -> (Client, FakeServer) {
    connect_with(config()).await
}

pub async fn connect_with(config: ClientConfig) -> (Client, FakeServer) {
    let _ = tracing_subscriber::fmt::try_init();

    let (client_end, server_end) = MemoryTransport::pair();
    let mut server = FakeServer::new(server_end);
    let connecting = tokio::spawn(Client::with_transport(config, Arc::new(client_end)));
    server.accept_hello().await;
    let client = connecting.await.unwrap().unwrap();

    (client, server)
}

/// Open the secure channel.
pub async fn open_channel(client: &Client, server: &mut FakeServer) -> ChannelSecurityToken {
    let opening = tokio::spawn({
        let client = client.clone();
        async move { client.open_secure_channel().await }
    });

    let request = server.next_request().await;
    assert_eq!(request.message_type, MessageType::Open);
    server.reply_open(&request).await;

    opening.await.unwrap().unwrap()
}

/// A client with an open secure channel.
pub async fn connect_and_open() -> (Client, FakeServer) {
    let (client, mut server) = connect().await;
    open_channel(&client, &mut server).await;
    (client, server)
}
