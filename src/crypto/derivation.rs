//! Two-stage HMAC-SHA-256 derivation of the content key and nonce (RFC 8291 §3.4).
//!
//! ```text
//! auth_info = HMAC(auth_secret, shared_secret)
//! ikm       = expand(auth_info, "WebPush: info\0" || ua_public || as_public, 32)
//! prk       = HMAC(salt, ikm)
//! cek       = expand(prk, "Content-Encoding: aes128gcm\0", 16)
//! nonce     = expand(prk, "Content-Encoding: nonce\0", 12)
//! ```
//!
//! `expand` is a single HMAC round truncated to the requested length. No
//! output in this scheme exceeds one SHA-256 block, so that is all the
//! expansion ever needs; [`expand`] refuses longer outputs at compile time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{
    AUTH_SECRET_LEN, CEK_INFO, CONTENT_KEY_LEN, HMAC_BLOCK_LEN, NONCE_INFO, NONCE_LEN,
    PUBLIC_KEY_LEN, SALT_LEN, SHARED_SECRET_LEN, WEBPUSH_INFO,
};
use crate::error::PushError;

type HmacSha256 = Hmac<Sha256>;

/// Symmetric material for encrypting one record. Wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedSecrets {
    /// AES-128-GCM key.
    pub content_encryption_key: [u8; CONTENT_KEY_LEN],
    /// AES-GCM nonce.
    pub nonce: [u8; NONCE_LEN],
}

impl std::fmt::Debug for DerivedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedSecrets(<redacted>)")
    }
}

/// Derive the content-encryption key and nonce for one message.
///
/// Deterministic for identical inputs.
pub fn derive(
    auth_secret: &[u8; AUTH_SECRET_LEN],
    shared_secret: &[u8; SHARED_SECRET_LEN],
    client_public: &[u8; PUBLIC_KEY_LEN],
    server_public: &[u8; PUBLIC_KEY_LEN],
    salt: &[u8; SALT_LEN],
) -> Result<DerivedSecrets, PushError> {
    let mut auth_info = hmac(auth_secret, &[shared_secret.as_slice()])?;

    let mut ikm: [u8; HMAC_BLOCK_LEN] = expand(
        &auth_info,
        &[WEBPUSH_INFO, client_public.as_slice(), server_public.as_slice()],
    )?;
    auth_info.zeroize();

    let mut prk = hmac(salt, &[ikm.as_slice()])?;
    ikm.zeroize();

    let content_encryption_key = expand(&prk, &[CEK_INFO]);
    let nonce = expand(&prk, &[NONCE_INFO]);
    prk.zeroize();

    Ok(DerivedSecrets {
        content_encryption_key: content_encryption_key?,
        nonce: nonce?,
    })
}

fn hmac(key: &[u8], parts: &[&[u8]]) -> Result<[u8; HMAC_BLOCK_LEN], PushError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| PushError::EncryptionFailure(format!("HMAC key rejected: {e}")))?;
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; HMAC_BLOCK_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// Single-round HKDF-Expand: `HMAC(key, info || 0x01)[..N]`.
fn expand<const N: usize>(key: &[u8], info: &[&[u8]]) -> Result<[u8; N], PushError> {
    const { assert!(N <= HMAC_BLOCK_LEN, "single-round expand yields at most one block") };

    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| PushError::EncryptionFailure(format!("HMAC key rejected: {e}")))?;
    for part in info {
        mac.update(part);
    }
    mac.update(&[0x01]);

    let block = mac.finalize().into_bytes();
    let mut out = [0u8; N];
    out.copy_from_slice(&block[..N]);
    Ok(out)
}
