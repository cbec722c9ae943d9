//! Discovery services and the descriptions they return.

use crate::encoding::ByteString;
use crate::header::{RequestHeader, ResponseHeader};
use crate::service::secure_channel::MessageSecurityMode;
use crate::variant::LocalizedText;

binary_enum! {
    /// Role of an application.
    pub enum ApplicationType {
        /// Server.
        #[default]
        Server = 0,
        /// Client.
        Client = 1,
        /// Both.
        ClientAndServer = 2,
        /// Discovery server.
        DiscoveryServer = 3,
    }
}

binary_enum! {
    /// Kind of user identity token.
    pub enum UserTokenType {
        /// No user credentials.
        #[default]
        Anonymous = 0,
        /// User name and password.
        UserName = 1,
        /// X.509 certificate.
        Certificate = 2,
        /// Token from an external issuer.
        IssuedToken = 3,
    }
}

binary_struct! {
    /// Describes an application.
    pub struct ApplicationDescription {
        /// Globally unique application URI.
        pub application_uri: String,
        /// Product URI.
        pub product_uri: String,
        /// Display name.
        pub application_name: LocalizedText,
        /// Role.
        pub application_type: ApplicationType,
        /// Gateway server URI.
        pub gateway_server_uri: String,
        /// Discovery profile URI.
        pub discovery_profile_uri: String,
        /// Discovery endpoints.
        pub discovery_urls: Vec<String>,
    }
}

binary_struct! {
    /// A user identity token accepted by an endpoint.
    pub struct UserTokenPolicy {
        /// Id passed back in the identity token.
        pub policy_id: String,
        /// Token kind.
        pub token_type: UserTokenType,
        /// Issued token type URI.
        pub issued_token_type: String,
        /// Issuer endpoint URL.
        pub issuer_endpoint_url: String,
        /// Policy used to encrypt the token.
        pub security_policy_uri: String,
    }
}

binary_struct! {
    /// An endpoint a client can connect to.
    pub struct EndpointDescription {
        /// Endpoint URL.
        pub endpoint_url: String,
        /// Server hosting the endpoint.
        pub server: ApplicationDescription,
        /// Server certificate.
        pub server_certificate: ByteString,
        /// Required message protection.
        pub security_mode: MessageSecurityMode,
        /// Security policy URI.
        pub security_policy_uri: String,
        /// Accepted user identity tokens.
        pub user_identity_tokens: Vec<UserTokenPolicy>,
        /// Transport profile URI.
        pub transport_profile_uri: String,
        /// Relative security level, higher is more secure.
        pub security_level: u8,
    }
}

impl EndpointDescription {
    /// First policy accepting the given token type.
    #[must_use]
    pub fn find_token_policy(&self, token_type: UserTokenType) -> Option<&UserTokenPolicy> {
        self.user_identity_tokens
            .iter()
            .find(|policy| policy.token_type == token_type)
    }
}

binary_struct! {
    /// Lists servers known to a server or discovery server.
    pub struct FindServersRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// URL the client used.
        pub endpoint_url: String,
        /// Preferred locales.
        pub locale_ids: Vec<String>,
        /// Filter on application URIs, empty for all.
        pub server_uris: Vec<String>,
    }
}

binary_struct! {
    /// Reply to [`FindServersRequest`].
    pub struct FindServersResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// Matching servers.
        pub servers: Vec<ApplicationDescription>,
    }
}

binary_struct! {
    /// Lists the endpoints of a server.
    pub struct GetEndpointsRequest {
        /// Common request header.
        pub request_header: RequestHeader,
        /// URL the client used.
        pub endpoint_url: String,
        /// Preferred locales.
        pub locale_ids: Vec<String>,
        /// Filter on transport profiles, empty for all.
        pub profile_uris: Vec<String>,
    }
}

binary_struct! {
    /// Reply to [`GetEndpointsRequest`].
    pub struct GetEndpointsResponse {
        /// Common response header.
        pub response_header: ResponseHeader,
        /// Endpoints of the server.
        pub endpoints: Vec<EndpointDescription>,
    }
}

service_pair!(FindServersRequest => FindServersResponse, request_id = 422, response_id = 425);
service_pair!(GetEndpointsRequest => GetEndpointsResponse, request_id = 428, response_id = 431);
