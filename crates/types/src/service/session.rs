//! Session services and identity tokens.

use crate::encoding::ByteString;
use crate::header::{RequestHeader, ResponseHeader};
use crate::node_id::NodeId;
use crate::service::discovery::{ApplicationDescription, EndpointDescription};
use crate::status_code::StatusCode;
use crate::variant::{DiagnosticInfo, ExtensionObject};

/// Binary encoding id of [`AnonymousIdentityToken`].
pub const ANONYMOUS_IDENTITY_TOKEN_ID: u32 = 321;

/// Binary encoding id of [`UserNameIdentityToken`].
pub const USER_NAME_IDENTITY_TOKEN_ID: u32 = 324;

binary_struct! {
    /// A signature and the algorithm that produced it.
    pub struct SignatureData {
        /// Algorithm URI.
        pub algorithm: String,
        /// Signature bytes.
        pub signature: ByteString,
    }
}

binary_struct! {
    /// Certificate describing software capabilities.
    pub struct SignedSoftwareCertificate {
        /// Certificate bytes.
        pub certificate_data: ByteString,
        /// Signature bytes.
        pub signature: ByteString,
    }
}

binary_struct! {
    /// Identity of a user that does not authenticate.
    pub struct AnonymousIdentityToken {
        /// Policy id taken from the endpoint.
        pub policy_id: String,
    }
}

binary_struct! {
    /// Identity of a user authenticating with a password.
    pub struct UserNameIdentityToken {
        /// Policy id taken from the endpoint.
        pub policy_id: String,
        /// User name.
        pub user_name: String,
        /// Password, encrypted unless the policy is None.
        pub password: ByteString,
        /// Encryption algorithm URI, empty when not encrypted.
        pub encryption_algorithm: String,
    }
}

impl AnonymousIdentityToken {
    /// Wrap the token for [`ActivateSessionRequest::user_identity_token`].
    #[must_use]
    pub fn into_extension_object(self) -> ExtensionObject {
        ExtensionObject::from_message(ANONYMOUS_IDENTITY_TOKEN_ID, &self)
    }
}

impl UserNameIdentityToken {
    /// Wrap the token for [`ActivateSessionRequest::user_identity_token`].
    #[must_use]
    pub fn into_extension_object(self) -> ExtensionObject {
        ExtensionObject::from_message(USER_NAME_IDENTITY_TOKEN_ID, &self)
    }
}

binary_struct! {
    /// Creates a session.
    pub struct CreateSessionRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// Describes the client.
        pub client_description: ApplicationDescription,
        /// Server URI.
        pub server_uri: String,
        /// Endpoint URL.
        pub endpoint_url: String,
        /// Human readable session name.
        pub session_name: String,
        /// Client nonce.
        pub client_nonce: ByteString,
        /// Client certificate.
        pub client_certificate: ByteString,
        /// Requested session timeout in milliseconds.
        pub requested_session_timeout: f64,
        /// Largest response the client accepts.
        pub max_response_message_size: u32,
    }
}

binary_struct! {
    /// Reply to [`CreateSessionRequest`].
    pub struct CreateSessionResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// Public session id.
        pub session_id: NodeId,
        /// Secret session token stamped on later requests.
        pub authentication_token: NodeId,
        /// Granted session timeout in milliseconds.
        pub revised_session_timeout: f64,
        /// Server nonce.
        pub server_nonce: ByteString,
        /// Server certificate.
        pub server_certificate: ByteString,
        /// Endpoints of the server.
        pub server_endpoints: Vec<EndpointDescription>,
        /// Server software certificates.
        pub server_software_certificates: Vec<SignedSoftwareCertificate>,
        /// Signature over the client certificate and nonce.
        pub server_signature: SignatureData,
        /// Largest request the server accepts.
        pub max_request_message_size: u32,
    }
}

binary_struct! {
    /// Activates a session with a user identity.
    pub struct ActivateSessionRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// Signature over the server certificate and nonce.
        pub client_signature: SignatureData,
        /// Client software certificates.
        pub client_software_certificates: Vec<SignedSoftwareCertificate>,
        /// Preferred locales.
        pub locale_ids: Vec<String>,
        /// Identity token.
        pub user_identity_token: ExtensionObject,
        /// Signature made with the user token.
        pub user_token_signature: SignatureData,
    }
}

binary_struct! {
    /// Reply to [`ActivateSessionRequest`].
    pub struct ActivateSessionResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// Server nonce.
        pub server_nonce: ByteString,
        /// Per software certificate results.
        pub results: Vec<StatusCode>,
        /// Per software certificate diagnostics.
        pub diagnostic_infos: Vec<DiagnosticInfo>,
    }
}

binary_struct! {
    /// Closes the session.
    pub struct CloseSessionRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// Delete the subscriptions of the session.
        pub delete_subscriptions: bool,
    }
}

binary_struct! {
    /// Reply to [`CloseSessionRequest`].
    pub struct CloseSessionResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
    }
}

service_pair!(CreateSessionRequest => CreateSessionResponse, request_id = 461, response_id = 464);
service_pair!(ActivateSessionRequest => ActivateSessionResponse, request_id = 467, response_id = 470);
service_pair!(CloseSessionRequest => CloseSessionResponse, request_id = 473, response_id = 476);
