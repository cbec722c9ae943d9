//! Secure channel services.

use crate::encoding::{ByteString, DateTime};
use crate::frame::MessageType;
use crate::header::{RequestHeader, ResponseHeader};

binary_enum! {
    /// Whether a token is issued for a new channel or renewed.
    pub enum SecurityTokenRequestType {
        /// New channel.
        #[default]
        Issue = 0,
        /// Replace the token of an existing channel.
        Renew = 1,
    }
}

binary_enum! {
    /// Message protection applied on a channel.
    pub enum MessageSecurityMode {
        /// Not a valid mode.
        #[default]
        Invalid = 0,
        /// No protection.
        None = 1,
        /// Messages are signed.
        Sign = 2,
        /// Messages are signed and encrypted.
        SignAndEncrypt = 3,
    }
}

binary_struct! {
    /// Token identifying a secure channel and the keys in use.
    pub struct ChannelSecurityToken {
        /// Secure channel id assigned by the server.
        pub channel_id: u32,
        /// Id stamped on every symmetric frame.
        pub token_id: u32,
        /// Time the token was issued.
        pub created_at: DateTime,
        /// Lifetime in milliseconds granted by the server.
        pub revised_lifetime: u32,
    }
}

binary_struct! {
    /// Opens or renews a secure channel.
    pub struct OpenSecureChannelRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// Protocol version of the client.
        pub client_protocol_version: u32,
        /// Issue or renew.
        pub request_type: SecurityTokenRequestType,
        /// Requested protection.
        pub security_mode: MessageSecurityMode,
        /// Client nonce, null for policy None.
        pub client_nonce: ByteString,
        /// Requested token lifetime in milliseconds.
        pub requested_lifetime: u32,
    }
}

binary_struct! {
    /// Reply to [`OpenSecureChannelRequest`].
    pub struct OpenSecureChannelResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// Protocol version of the server.
        pub server_protocol_version: u32,
        /// The issued token.
        pub security_token: ChannelSecurityToken,
        /// Server nonce.
        pub server_nonce: ByteString,
    }
}

binary_struct! {
    /// Closes the secure channel. The server does not answer.
    pub struct CloseSecureChannelRequest {
        /// Common request header.
        pub request_header: RequestHeader,
    }
}

binary_struct! {
    /// Defined for completeness; servers close the connection instead.
    pub struct CloseSecureChannelResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
    }
}

service_pair!(
    OpenSecureChannelRequest => OpenSecureChannelResponse,
    request_id = 446,
    response_id = 449,
    message_type = MessageType::Open,
);

service_pair!(
    CloseSecureChannelRequest => CloseSecureChannelResponse,
    request_id = 452,
    response_id = 455,
    message_type = MessageType::Close,
);
