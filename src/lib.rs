//! Web push delivery for a single browser subscription.
//!
//! Sends an encrypted message to one push endpoint: signs a VAPID token
//! (RFC 8292), encrypts the payload with an ephemeral ECDH exchange and the
//! aes128gcm content coding (RFC 8291 / RFC 8188), and POSTs it to the push
//! service (RFC 8030).
//!
//! # Architecture
//!
//! ```text
//! PushTransport::send(SendRequest)
//!     ├─ VapidAuthorizer     → Authorization, TTL, Content-Encoding, Urgency, Topic
//!     ├─ crypto::record      → salt || rs || 0x41 || ephemeral key || ciphertext || tag
//!     │    ├─ crypto::agreement   (fresh P-256 key pair, ECDH)
//!     │    └─ crypto::derivation  (HMAC-SHA-256 chain → key + nonce)
//!     └─ HTTPS POST          → Ok(()) | PushError
//! ```
//!
//! Subscription storage, key persistence, and what to do with a failed
//! subscription belong to the caller. A 410 surfaces as
//! [`PushError::PushService`] with [`Disposition::SubscriptionGone`]; the
//! crate never prunes anything itself.
//!
//! # Modules
//!
//! - [`transport`] - Request assembly and delivery
//! - [`vapid`] - Sender identity and token signing
//! - [`crypto`] - Key agreement, derivation and record encryption
//! - [`subscription`] - Browser subscription record
//! - [`config`] - HTTP client configuration
//! - [`error`] - Error taxonomy

pub mod config;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod subscription;
pub mod transport;
pub mod vapid;

// Re-export commonly used types
pub use config::PushConfig;
pub use crypto::EncryptedRecord;
pub use error::{Disposition, PushError};
pub use subscription::{ClientKeys, Subscription, SubscriptionKeys};
pub use transport::{PreparedPush, PushTransport, SendRequest};
pub use vapid::{Urgency, VapidAuthorizer, VapidIdentity, VapidKeys};

pub use tokio_util::sync::CancellationToken;
