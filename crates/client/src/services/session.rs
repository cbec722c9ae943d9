use crate::client::Client;
use crate::error::Result;
use tracing::{debug, info};
use ua_types::service::discovery::{ApplicationDescription, ApplicationType};
use ua_types::service::session::{
    ActivateSessionRequest, ActivateSessionResponse, AnonymousIdentityToken,
    CloseSessionRequest, CloseSessionResponse, CreateSessionRequest, CreateSessionResponse,
};
use ua_types::{ByteString, ExtensionObject, LocalizedText, NodeId};

/// Length of the client nonce sent when creating a session.
const CLIENT_NONCE_LEN: usize = 32;

impl Client {
    /// Create a session. Later requests carry its authentication token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    #[allow(clippy::cast_precision_loss)]
    pub async fn create_session(&self) -> Result<CreateSessionResponse> {
        let config = &self.inner.config;
        let request = CreateSessionRequest {
            client_description: ApplicationDescription {
                application_uri: config.application_uri.clone(),
                product_uri: config.product_uri.clone(),
                application_name: LocalizedText::new(config.application_name.clone()),
                application_type: ApplicationType::Client,
                ..Default::default()
            },
            endpoint_url: config.endpoint_url.clone(),
            session_name: config.session_name.clone(),
            client_nonce: ByteString(vec![0; CLIENT_NONCE_LEN]),
            client_certificate: ByteString(config.sender_certificate.clone()),
            requested_session_timeout: config.session_timeout_ms as f64,
            max_response_message_size: config.max_response_message_size,
            ..Default::default()
        };

        let response = self.send_checked(request).await?;
        *self.inner.authentication_token.write() = response.authentication_token.clone();
        info!(
            parent: &self.inner.span,
            "Created session {} (timeout {} ms)",
            response.session_id, response.revised_session_timeout
        );

        Ok(response)
    }

    /// Activate the session with `user_identity_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn activate_session(
        &self,
        user_identity_token: ExtensionObject,
    ) -> Result<ActivateSessionResponse> {
        let request = ActivateSessionRequest {
            locale_ids: vec!["en".to_string()],
            user_identity_token,
            ..Default::default()
        };
        self.send_checked(request).await
    }

    /// Activate the session without user credentials. `policy_id` comes
    /// from the endpoint's anonymous token policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn activate_session_anonymous(
        &self,
        policy_id: impl Into<String>,
    ) -> Result<ActivateSessionResponse> {
        let token = AnonymousIdentityToken {
            policy_id: policy_id.into(),
        };
        self.activate_session(token.into_extension_object()).await
    }

    /// Close the session and delete its subscriptions on the server.
    ///
    /// Local session state is dropped even if the request fails: no
    /// subscription callback runs after this returns. Publish requests
    /// still queued at the server are forgotten first, so their answers
    /// for the closed session do not reach the next one.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn close_session(&self) -> Result<CloseSessionResponse> {
        self.discard_publishes();

        let request = CloseSessionRequest {
            delete_subscriptions: true,
            ..Default::default()
        };
        let result = self.send_checked(request).await;
        self.drop_session_state();

        // A callback may already be running on the worker.
        self.inner.dispatcher.flush().await;
        result
    }

    /// Forget the session locally without telling the server.
    ///
    /// A callback already running on the notification worker may still
    /// finish after this returns.
    pub fn abort_session(&self) {
        self.drop_session_state();
    }

    fn discard_publishes(&self) {
        let discarded = self.inner.correlator.discard_publishes();
        if discarded > 0 {
            debug!(
                parent: &self.inner.span,
                "Forgot {} outstanding publish requests", discarded
            );
        }
    }

    fn drop_session_state(&self) {
        debug!(parent: &self.inner.span, "Clearing session state");
        self.discard_publishes();
        self.inner.subscriptions.clear();
        self.inner.continuation.clear();
        *self.inner.authentication_token.write() = NodeId::NULL;
    }
}
