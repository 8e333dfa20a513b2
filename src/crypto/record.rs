//! aes128gcm record encryption for a single-record push body.
//!
//! # Wire Format
//!
//! ```text
//! +-----------+--------+-----------+-----------------+--------------------------+
//! | salt (16) | rs (4) | idlen (1) | keyid (65)      | ciphertext || tag (16)   |
//! +-----------+--------+-----------+-----------------+--------------------------+
//!                 BE      = 0x41     ephemeral point
//! ```
//!
//! The plaintext is padded with a single `0x02` delimiter and no padding
//! zeros. `rs` is always `len(padded) + 32`.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Nonce,
};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::SecretKey;
use rand::RngCore;

use crate::constants::{
    HEADER_LEN, PADDING_DELIMITER, PUBLIC_KEY_LEN, RECORD_SIZE_OVERHEAD, SALT_LEN, TAG_LEN,
};
use crate::crypto::agreement::{self, AgreedKeys};
use crate::crypto::derivation::{self, DerivedSecrets};
use crate::error::PushError;
use crate::subscription::ClientKeys;

/// One encrypted push record, ready to be sent as the request body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedRecord {
    /// Random per-message salt.
    pub salt: [u8; SALT_LEN],
    /// Record size header field.
    pub record_size: u32,
    /// Ephemeral server public key (the record's key id).
    pub server_public_key: [u8; PUBLIC_KEY_LEN],
    /// AES-128-GCM ciphertext followed by the 16-byte tag.
    pub ciphertext: Vec<u8>,
}

impl EncryptedRecord {
    fn encoded_len(&self) -> usize {
        HEADER_LEN + self.ciphertext.len()
    }

    /// Serialize header and ciphertext into the request body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.record_size.to_be_bytes());
        out.push(PUBLIC_KEY_LEN as u8);
        out.extend_from_slice(&self.server_public_key);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parse a record body. Only the 65-byte key id used by Web Push is accepted.
    pub fn parse(body: &[u8]) -> Result<Self, PushError> {
        if body.len() < HEADER_LEN + TAG_LEN {
            return Err(PushError::InvalidRecord(format!(
                "record is {} bytes, shorter than header plus tag",
                body.len()
            )));
        }

        let (salt, rest) = body.split_at(SALT_LEN);
        let (rs, rest) = rest.split_at(4);
        let (idlen, rest) = rest.split_at(1);
        if usize::from(idlen[0]) != PUBLIC_KEY_LEN {
            return Err(PushError::InvalidRecord(format!(
                "key id length must be {PUBLIC_KEY_LEN}, got {}",
                idlen[0]
            )));
        }
        let (keyid, ciphertext) = rest.split_at(PUBLIC_KEY_LEN);

        let mut record = Self {
            salt: [0u8; SALT_LEN],
            record_size: u32::from_be_bytes([rs[0], rs[1], rs[2], rs[3]]),
            server_public_key: [0u8; PUBLIC_KEY_LEN],
            ciphertext: ciphertext.to_vec(),
        };
        record.salt.copy_from_slice(salt);
        record.server_public_key.copy_from_slice(keyid);
        Ok(record)
    }
}

/// Encrypt a payload for one subscriber.
///
/// Uses a fresh salt and a fresh ephemeral key pair on every call.
pub fn encrypt(payload: &[u8], client: &ClientKeys) -> Result<EncryptedRecord, PushError> {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);

    let agreed = agreement::agree(client)?;
    seal(payload, client, &agreed, salt)
}

/// Encrypt with a fixed server key and salt.
pub(crate) fn encrypt_with(
    payload: &[u8],
    client: &ClientKeys,
    server: &SecretKey,
    salt: [u8; SALT_LEN],
) -> Result<EncryptedRecord, PushError> {
    let agreed = agreement::agree_with(server, client)?;
    seal(payload, client, &agreed, salt)
}

fn seal(
    payload: &[u8],
    client: &ClientKeys,
    agreed: &AgreedKeys,
    salt: [u8; SALT_LEN],
) -> Result<EncryptedRecord, PushError> {
    let secrets = derivation::derive(
        client.auth_secret(),
        &agreed.shared_secret,
        client.public_key_bytes(),
        &agreed.server_public_key,
        &salt,
    )?;

    let mut padded = Vec::with_capacity(payload.len() + 1);
    padded.extend_from_slice(payload);
    padded.push(PADDING_DELIMITER);

    let record_size = u32::try_from(padded.len() + RECORD_SIZE_OVERHEAD).map_err(|_e| {
        PushError::EncryptionFailure(format!(
            "payload of {} bytes does not fit in a single record",
            payload.len()
        ))
    })?;

    let ciphertext = aead_seal(&secrets, &padded)?;

    Ok(EncryptedRecord {
        salt,
        record_size,
        server_public_key: agreed.server_public_key,
        ciphertext,
    })
}

fn aead_seal(secrets: &DerivedSecrets, padded: &[u8]) -> Result<Vec<u8>, PushError> {
    let cipher = Aes128Gcm::new_from_slice(&secrets.content_encryption_key)
        .map_err(|e| PushError::EncryptionFailure(format!("invalid content key: {e}")))?;
    cipher
        .encrypt(Nonce::from_slice(&secrets.nonce), padded)
        .map_err(|e| PushError::EncryptionFailure(format!("AES-GCM seal failed: {e}")))
}

/// Open a record as the subscriber would, returning the padded plaintext.
///
/// `client_secret` is the subscriber's private key; `auth_secret` the
/// subscription's auth secret.
pub fn decrypt_padded(
    body: &[u8],
    client_secret: &SecretKey,
    auth_secret: &[u8],
) -> Result<Vec<u8>, PushError> {
    let record = EncryptedRecord::parse(body)?;

    let client_public = client_secret.public_key().to_encoded_point(false);
    let client = ClientKeys::from_bytes(client_public.as_bytes(), auth_secret)
        .map_err(|e| PushError::InvalidRecord(format!("client key material: {e}")))?;

    let server_public = p256::PublicKey::from_sec1_bytes(&record.server_public_key)
        .map_err(|_e| PushError::InvalidRecord("key id is not a P-256 point".to_string()))?;
    let shared = p256::ecdh::diffie_hellman(
        client_secret.to_nonzero_scalar(),
        server_public.as_affine(),
    );
    let mut shared_secret = [0u8; 32];
    shared_secret.copy_from_slice(shared.raw_secret_bytes().as_slice());

    let secrets = derivation::derive(
        client.auth_secret(),
        &shared_secret,
        client.public_key_bytes(),
        &record.server_public_key,
        &record.salt,
    )?;

    let cipher = Aes128Gcm::new_from_slice(&secrets.content_encryption_key)
        .map_err(|e| PushError::InvalidRecord(format!("invalid content key: {e}")))?;
    cipher
        .decrypt(Nonce::from_slice(&secrets.nonce), record.ciphertext.as_slice())
        .map_err(|e| PushError::InvalidRecord(format!("AES-GCM open failed: {e}")))
}

/// Open a record and strip its padding, returning the original payload.
///
/// The last non-zero byte must be the `0x02` last-record delimiter.
pub fn decrypt(
    body: &[u8],
    client_secret: &SecretKey,
    auth_secret: &[u8],
) -> Result<Vec<u8>, PushError> {
    let mut padded = decrypt_padded(body, client_secret, auth_secret)?;

    let delimiter_index = padded
        .iter()
        .rposition(|&b| b != 0)
        .ok_or_else(|| PushError::InvalidRecord("padding delimiter not found".to_string()))?;
    if padded[delimiter_index] != PADDING_DELIMITER {
        return Err(PushError::InvalidRecord(format!(
            "invalid padding delimiter: {:#04x}",
            padded[delimiter_index]
        )));
    }

    padded.truncate(delimiter_index);
    Ok(padded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::elliptic_curve::rand_core::OsRng;

    fn subscriber() -> (SecretKey, ClientKeys) {
        let secret = SecretKey::random(&mut OsRng);
        let public = secret.public_key().to_encoded_point(false);
        let keys = ClientKeys::from_bytes(public.as_bytes(), &[0x5a; 16]).expect("client keys");
        (secret, keys)
    }

    #[test]
    fn test_roundtrip_recovers_payload() {
        let (secret, keys) = subscriber();
        let payload = br#"{"title":"Agent completed","body":"PR #42 is ready"}"#;

        let record = encrypt(payload, &keys).expect("encrypt");
        let decrypted = decrypt(&record.to_bytes(), &secret, keys.auth_secret()).expect("decrypt");

        assert_eq!(decrypted, payload);
    }

    #[test]
    fn test_fixed_inputs_pad_hello_with_delimiter() {
        let (secret, keys) = subscriber();
        let server = SecretKey::from_slice(&[0x11; 32]).expect("server key");

        let record = encrypt_with(b"hello", &keys, &server, [0x22; 16]).expect("encrypt");
        let padded =
            decrypt_padded(&record.to_bytes(), &secret, keys.auth_secret()).expect("decrypt");

        assert_eq!(padded, b"hello\x02");
        assert_eq!(record.salt, [0x22; 16]);
    }

    #[test]
    fn test_fixed_inputs_are_deterministic() {
        let (_, keys) = subscriber();
        let server = SecretKey::from_slice(&[0x11; 32]).expect("server key");

        let a = encrypt_with(b"hello", &keys, &server, [0x22; 16]).expect("encrypt");
        let b = encrypt_with(b"hello", &keys, &server, [0x22; 16]).expect("encrypt");
        assert_eq!(a, b);
    }

    #[test]
    fn test_header_layout() {
        let (_, keys) = subscriber();
        let payload = b"test payload";
        let record = encrypt(payload, &keys).expect("encrypt");
        let body = record.to_bytes();

        let padded_len = payload.len() + 1;
        assert_eq!(record.record_size as usize, padded_len + 32);
        assert_eq!(&body[..16], &record.salt);
        assert_eq!(
            u32::from_be_bytes([body[16], body[17], body[18], body[19]]),
            record.record_size
        );
        assert_eq!(body[20], 0x41);
        assert_eq!(&body[21..86], &record.server_public_key);
        assert_eq!(body.len(), 86 + padded_len + 16);
        assert_eq!(body.len(), record.encoded_len());
    }

    #[test]
    fn test_empty_payload_still_carries_delimiter() {
        let (secret, keys) = subscriber();
        let record = encrypt(b"", &keys).expect("encrypt");
        assert_eq!(record.record_size, 33);

        let padded =
            decrypt_padded(&record.to_bytes(), &secret, keys.auth_secret()).expect("decrypt");
        assert_eq!(padded, [0x02]);
        let payload = decrypt(&record.to_bytes(), &secret, keys.auth_secret()).expect("decrypt");
        assert!(payload.is_empty());
    }

    #[test]
    fn test_identical_inputs_produce_distinct_records() {
        let (secret, keys) = subscriber();
        let a = encrypt(b"same", &keys).expect("encrypt");
        let b = encrypt(b"same", &keys).expect("encrypt");

        assert_ne!(a.salt, b.salt);
        assert_ne!(a.server_public_key, b.server_public_key);
        assert_ne!(a.ciphertext, b.ciphertext);

        let auth = keys.auth_secret();
        assert_eq!(
            decrypt(&a.to_bytes(), &secret, auth).expect("decrypt"),
            decrypt(&b.to_bytes(), &secret, auth).expect("decrypt"),
        );
    }

    #[test]
    fn test_parse_roundtrip() {
        let (_, keys) = subscriber();
        let record = encrypt(b"abc", &keys).expect("encrypt");
        let parsed = EncryptedRecord::parse(&record.to_bytes()).expect("parse");
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_tampered_ciphertext_rejected() {
        let (secret, keys) = subscriber();
        let mut body = encrypt(b"hello", &keys).expect("encrypt").to_bytes();
        let last = body.len() - 1;
        body[last] ^= 0x01;

        assert!(matches!(
            decrypt(&body, &secret, keys.auth_secret()),
            Err(PushError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_wrong_auth_secret_rejected() {
        let (secret, keys) = subscriber();
        let body = encrypt(b"hello", &keys).expect("encrypt").to_bytes();
        assert!(decrypt(&body, &secret, &[0u8; 16]).is_err());
    }

    #[test]
    fn test_truncated_record_rejected() {
        assert!(matches!(
            EncryptedRecord::parse(&[0u8; 40]),
            Err(PushError::InvalidRecord(_))
        ));

        let mut body = vec![0u8; 120];
        body[20] = 32;
        assert!(matches!(
            EncryptedRecord::parse(&body),
            Err(PushError::InvalidRecord(_))
        ));
    }
}
