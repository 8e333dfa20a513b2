//! Web push delivery over HTTPS (RFC 8030).
//!
//! [`PushTransport`] is the entry point for one send:
//!
//! ```text
//! SendRequest
//!     ↓ prepare()      endpoint + keys validated, VAPID headers signed,
//!     ↓                payload encrypted (no I/O, all errors are local)
//! PreparedPush
//!     ↓ POST           cancellable, no retries
//! 2xx → Ok(())   non-2xx → PushService{status, body}   no response → Transport
//! ```
//!
//! The transport holds only a `reqwest::Client` (connection pool). Sends share
//! no other state, so one transport can fan out to many subscribers from
//! concurrent tasks.

// Rust guideline compliant 2026-02

use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use tokio_util::sync::CancellationToken;

use crate::config::PushConfig;
use crate::crypto::record;
use crate::error::PushError;
use crate::subscription::Subscription;
use crate::vapid::{Urgency, VapidAuthorizer, VapidIdentity};

/// Everything needed for one send. Consumed by [`PushTransport::send`].
#[derive(Debug, Clone)]
pub struct SendRequest<'a> {
    /// Target subscription.
    pub subscription: &'a Subscription,
    /// Sender identity used to sign the VAPID token.
    pub vapid: &'a VapidIdentity,
    /// Plaintext payload, typically JSON.
    pub payload: Vec<u8>,
    /// Optional `Urgency` header.
    pub urgency: Option<Urgency>,
    /// Optional `Topic` header (replaces pending messages with the same topic).
    pub topic: Option<String>,
}

impl<'a> SendRequest<'a> {
    /// Request without urgency or topic.
    pub fn new(
        subscription: &'a Subscription,
        vapid: &'a VapidIdentity,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            subscription,
            vapid,
            payload: payload.into(),
            urgency: None,
            topic: None,
        }
    }

    /// Set the `Urgency` header.
    pub fn urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    /// Set the `Topic` header.
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }
}

/// A fully built push request: headers signed, body encrypted.
#[derive(Debug)]
pub struct PreparedPush {
    /// Push service endpoint.
    pub endpoint: Url,
    /// Authorization, TTL, Content-Encoding and optional Urgency/Topic.
    pub headers: HeaderMap,
    /// Encrypted aes128gcm record.
    pub body: Vec<u8>,
}

/// Sends encrypted push messages to push services.
#[derive(Debug, Clone)]
pub struct PushTransport {
    client: reqwest::Client,
}

impl PushTransport {
    /// Build a transport with its own HTTP client.
    pub fn new(config: &PushConfig) -> Result<Self, PushError> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout());
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let client = builder.build().map_err(PushError::Transport)?;
        Ok(Self::with_client(client))
    }

    /// Wrap an existing client; the caller controls pooling and timeouts.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Validate, sign and encrypt without touching the network.
    pub fn prepare(request: &SendRequest<'_>) -> Result<PreparedPush, PushError> {
        let endpoint = request.subscription.endpoint_url()?;
        let client_keys = request.subscription.client_keys()?;

        let headers = VapidAuthorizer::new(request.vapid).headers(
            &endpoint,
            request.urgency,
            request.topic.as_deref(),
        )?;
        let body = record::encrypt(&request.payload, &client_keys)?.to_bytes();

        Ok(PreparedPush {
            endpoint,
            headers,
            body,
        })
    }

    /// Send one push message.
    pub async fn send(&self, request: SendRequest<'_>) -> Result<(), PushError> {
        self.send_cancellable(request, &CancellationToken::new())
            .await
    }

    /// Send one push message, aborting the HTTP request if `cancel` fires.
    ///
    /// Local errors are reported even when `cancel` has already fired; the
    /// network is never touched after cancellation.
    pub async fn send_cancellable(
        &self,
        request: SendRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), PushError> {
        let prepared = Self::prepare(&request)?;
        drop(request);
        let target = host(&prepared.endpoint);

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                log::debug!("[WebPush] Send to {target} cancelled");
                Err(PushError::Cancelled)
            }
            result = self.deliver(prepared) => result,
        }
    }

    /// POST a prepared message and classify the response.
    pub async fn deliver(&self, prepared: PreparedPush) -> Result<(), PushError> {
        let host = host(&prepared.endpoint);
        let body_len = prepared.body.len();

        let response = self
            .client
            .post(prepared.endpoint)
            .headers(prepared.headers)
            .body(prepared.body)
            .send()
            .await
            .map_err(|e| {
                log::debug!("[WebPush] Request to {host} failed: {e}");
                PushError::Transport(e)
            })?;

        let status = response.status();
        if status.is_success() {
            log::debug!("[WebPush] Delivered {body_len} bytes to {host} ({status})");
            return Ok(());
        }

        match status {
            StatusCode::GONE => log::info!("[WebPush] Subscription expired (410 Gone) at {host}"),
            StatusCode::TOO_MANY_REQUESTS => log::warn!("[WebPush] Rate limited (429) by {host}"),
            _ => log::warn!("[WebPush] {host} rejected push (HTTP {status})"),
        }

        let body = response_body(response.text().await);
        Err(PushError::PushService {
            status: status.as_u16(),
            body,
        })
    }
}

/// Error body text, or a placeholder naming why it could not be read.
fn response_body(text: Result<String, reqwest::Error>) -> String {
    text.unwrap_or_else(|e| {
        log::debug!("[WebPush] Failed to read error response body: {e}");
        format!("<unreadable body: {e}>")
    })
}

fn host(endpoint: &Url) -> String {
    endpoint.host_str().unwrap_or("<no host>").to_string()
}
