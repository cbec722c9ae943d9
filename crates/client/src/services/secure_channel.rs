use crate::client::Client;
use crate::error::Result;
use tracing::{info, warn};
use ua_types::ByteString;
use ua_types::service::secure_channel::{
    ChannelSecurityToken, CloseSecureChannelRequest, MessageSecurityMode,
    OpenSecureChannelRequest, SecurityTokenRequestType,
};

impl Client {
    /// Open the secure channel and store the issued token.
    ///
    /// Must succeed before any other service is called.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn open_secure_channel(&self) -> Result<ChannelSecurityToken> {
        self.request_security_token(SecurityTokenRequestType::Issue)
            .await
    }

    /// Renew the security token. Requests in flight are not disturbed;
    /// frames written afterwards carry the new token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn renew_secure_channel(&self) -> Result<ChannelSecurityToken> {
        self.request_security_token(SecurityTokenRequestType::Renew)
            .await
    }

    async fn request_security_token(
        &self,
        request_type: SecurityTokenRequestType,
    ) -> Result<ChannelSecurityToken> {
        let config = &self.inner.config;
        let request = OpenSecureChannelRequest {
            client_protocol_version: config.protocol_version,
            request_type,
            security_mode: MessageSecurityMode::None,
            client_nonce: ByteString::null(),
            requested_lifetime: config.secure_channel_lifetime_ms,
            ..Default::default()
        };

        let token = self.send_checked(request).await?.security_token;
        info!(
            parent: &self.inner.span,
            "Secure channel {} using token {} for {} ms",
            token.channel_id, token.token_id, token.revised_lifetime
        );
        self.inner.channel.set_token(token.clone());

        Ok(token)
    }

    /// Send a close frame for the secure channel.
    ///
    /// Best effort: the server does not answer and failures are only
    /// logged, since the connection is discarded afterwards anyway.
    pub async fn close_secure_channel(&self) {
        let mut request = CloseSecureChannelRequest::default();
        let result = match self.stamp(&mut request) {
            Ok(_) => self.inner.channel.write(&request).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            warn!(parent: &self.inner.span, "Failed to close secure channel: {}", e);
        }
    }
}
