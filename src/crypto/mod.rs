//! Message-scoped cryptography for Web Push payloads (RFC 8291).
//!
//! ```text
//! ClientKeys ──► agreement::agree ──► derivation::derive ──► record::encrypt
//!               (ephemeral P-256)     (CEK + nonce)          (aes128gcm record)
//! ```
//!
//! Every key pair, shared secret and derived key is created for one message
//! and dropped (zeroized) when that message's record is built. Nothing here
//! is cached or pooled.

pub mod agreement;
pub mod derivation;
pub mod record;

pub use agreement::{agree, AgreedKeys};
pub use derivation::{derive, DerivedSecrets};
pub use record::{decrypt, decrypt_padded, encrypt, EncryptedRecord};
