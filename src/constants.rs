//! Protocol constants for Web Push delivery.
//!
//! Wire-format sizes are fixed by RFC 8188 / RFC 8291 and must match the
//! receiving browser byte for byte. Header values come from RFC 8030 and
//! RFC 8292.
//!
//! # Categories
//!
//! - **Headers**: values sent with every push request
//! - **Record framing**: sizes of the aes128gcm record header and body
//! - **Key derivation**: info strings fed into the HMAC chain
//! - **Timeouts**: HTTP client defaults

use std::time::Duration;

// ============================================================================
// Headers
// ============================================================================

/// `TTL` header value: how long the push service may queue the message.
pub const TTL_SECONDS: u32 = 86_400;

/// `Content-Encoding` header value for the single supported scheme.
pub const CONTENT_ENCODING: &str = "aes128gcm";

/// Lifetime of a VAPID token, measured from the moment it is signed.
pub const TOKEN_LIFETIME: Duration = Duration::from_secs(12 * 60 * 60);

// ============================================================================
// Record framing
// ============================================================================

/// Random salt at the start of every record.
pub const SALT_LEN: usize = 16;

/// Subscription auth secret length.
pub const AUTH_SECRET_LEN: usize = 16;

/// Uncompressed SEC1 P-256 point (`0x04 || x || y`).
pub const PUBLIC_KEY_LEN: usize = 65;

/// Leading byte of an uncompressed SEC1 point.
pub const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

/// Raw ECDH shared secret (x coordinate).
pub const SHARED_SECRET_LEN: usize = 32;

/// AES-128-GCM key length.
pub const CONTENT_KEY_LEN: usize = 16;

/// AES-GCM nonce length.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length.
pub const TAG_LEN: usize = 16;

/// Added to the padded plaintext length to form the `rs` header field:
/// 16 for the tag plus 16 for the historical buffer-length constant.
pub const RECORD_SIZE_OVERHEAD: usize = 32;

/// Delimiter appended to the plaintext of the last (and only) record.
pub const PADDING_DELIMITER: u8 = 0x02;

/// `salt(16) || rs(4) || idlen(1) || keyid(65)`.
pub const HEADER_LEN: usize = SALT_LEN + 4 + 1 + PUBLIC_KEY_LEN;

// ============================================================================
// Key derivation
// ============================================================================

/// Prefix of the info string used to derive the input keying material.
pub const WEBPUSH_INFO: &[u8] = b"WebPush: info\0";

/// Info string for the content-encryption key.
pub const CEK_INFO: &[u8] = b"Content-Encoding: aes128gcm\0";

/// Info string for the nonce.
pub const NONCE_INFO: &[u8] = b"Content-Encoding: nonce\0";

/// Output size of one HMAC-SHA-256 block; the single-round expand never
/// produces more than this.
pub const HMAC_BLOCK_LEN: usize = 32;

// ============================================================================
// Timeouts
// ============================================================================

/// Default total timeout for one push request.
///
/// Push services normally answer within a second; 30 seconds leaves room
/// for slow TLS handshakes without letting a send hang indefinitely.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default TCP/TLS connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
