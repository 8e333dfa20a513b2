//! Error taxonomy for a single push send.
//!
//! Every failure surfaces to the caller as one [`PushError`]. The core never
//! acts on a failure itself (no pruning, no retries); [`PushError::disposition`]
//! exposes enough detail for the caller's subscription policy.

// Rust guideline compliant 2026-02

use thiserror::Error;

/// Errors produced while preparing or delivering a push message.
#[derive(Error, Debug)]
pub enum PushError {
    /// Subscription endpoint or client key material is unusable.
    #[error("Malformed subscription: {0}")]
    MalformedSubscription(String),
    /// VAPID signing key, public key or subject is missing or invalid.
    #[error("Invalid VAPID credentials: {0}")]
    InvalidVapidCredentials(String),
    /// A cryptographic operation failed while building the record.
    #[error("Encryption failed: {0}")]
    EncryptionFailure(String),
    /// An encrypted record could not be parsed or opened.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    /// A caller-supplied header value cannot be sent over HTTP.
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
    /// The push service answered with a non-2xx status.
    #[error("Push service responded with status {status}: {body}")]
    PushService {
        /// HTTP status code returned by the push service.
        status: u16,
        /// Response body text (may be empty).
        body: String,
    },
    /// No HTTP response was received (DNS, TLS, connect, timeout).
    #[error("Web push HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),
    /// The caller cancelled the send while the request was in flight.
    #[error("Web push send was cancelled")]
    Cancelled,
}

/// What a failed send means for the subscription it targeted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// The push service reported the subscription as permanently gone (410).
    SubscriptionGone,
    /// Service overload, rate limiting, or a network failure. May succeed later.
    Transient,
    /// The push service rejected the request (4xx other than 410 and 429).
    Rejected,
    /// Failed locally before any network call was made.
    Local,
}

impl PushError {
    /// HTTP status of a push service rejection, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::PushService { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify this error for caller-side subscription policy.
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::PushService { status, .. } => match *status {
                410 => Disposition::SubscriptionGone,
                429 | 500..=599 => Disposition::Transient,
                _ => Disposition::Rejected,
            },
            Self::Transport(_) | Self::Cancelled => Disposition::Transient,
            Self::MalformedSubscription(_)
            | Self::InvalidVapidCredentials(_)
            | Self::EncryptionFailure(_)
            | Self::InvalidRecord(_)
            | Self::InvalidHeader(_) => Disposition::Local,
        }
    }

    /// Whether a later attempt with the same inputs could succeed.
    pub fn is_retryable(&self) -> bool {
        self.disposition() == Disposition::Transient
    }

    /// Whether the error was raised before any network I/O took place.
    pub fn is_local(&self) -> bool {
        self.disposition() == Disposition::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(status: u16) -> PushError {
        PushError::PushService {
            status,
            body: format!("Error {status}"),
        }
    }

    #[test]
    fn test_gone_is_distinct_from_other_client_errors() {
        assert_eq!(service(410).disposition(), Disposition::SubscriptionGone);
        assert_eq!(service(404).disposition(), Disposition::Rejected);
        assert_eq!(service(400).disposition(), Disposition::Rejected);
        assert_eq!(service(413).disposition(), Disposition::Rejected);
    }

    #[test]
    fn test_server_errors_and_rate_limits_are_transient() {
        assert!(service(500).is_retryable());
        assert!(service(503).is_retryable());
        assert!(service(429).is_retryable());
        assert!(!service(410).is_retryable());
    }

    #[test]
    fn test_construction_errors_are_local() {
        let err = PushError::MalformedSubscription("bad key".to_string());
        assert!(err.is_local());
        assert_eq!(err.status(), None);
        assert!(PushError::InvalidVapidCredentials("missing".to_string()).is_local());
        assert!(PushError::EncryptionFailure("aead".to_string()).is_local());
        assert!(!PushError::Cancelled.is_local());
    }

    #[test]
    fn test_push_service_message_format() {
        let err = service(500);
        assert_eq!(err.status(), Some(500));
        assert_eq!(
            err.to_string(),
            "Push service responded with status 500: Error 500"
        );
    }
}
