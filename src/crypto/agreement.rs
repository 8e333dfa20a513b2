//! Ephemeral P-256 key agreement, one key pair per message.

use p256::elliptic_curve::rand_core::OsRng;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::SecretKey;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{PUBLIC_KEY_LEN, SHARED_SECRET_LEN};
use crate::error::PushError;
use crate::subscription::ClientKeys;

/// Result of one ECDH exchange with a subscriber.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct AgreedKeys {
    /// Uncompressed public half of the ephemeral key pair.
    pub server_public_key: [u8; PUBLIC_KEY_LEN],
    /// Raw ECDH shared secret (x coordinate).
    pub shared_secret: [u8; SHARED_SECRET_LEN],
}

impl std::fmt::Debug for AgreedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgreedKeys")
            .field("server_public_key", &self.server_public_key)
            .field("shared_secret", &"<redacted>")
            .finish()
    }
}

/// Generate a fresh key pair and agree on a shared secret with the client.
///
/// The ephemeral secret lives only for the duration of this call.
pub fn agree(client: &ClientKeys) -> Result<AgreedKeys, PushError> {
    let ephemeral = SecretKey::random(&mut OsRng);
    agree_with(&ephemeral, client)
}

/// Agree using a caller-provided server secret.
pub(crate) fn agree_with(server: &SecretKey, client: &ClientKeys) -> Result<AgreedKeys, PushError> {
    let shared = p256::ecdh::diffie_hellman(
        server.to_nonzero_scalar(),
        client.public_key().as_affine(),
    );

    let encoded = server.public_key().to_encoded_point(false);
    let server_public_key: [u8; PUBLIC_KEY_LEN] =
        encoded.as_bytes().try_into().map_err(|_e| {
            PushError::EncryptionFailure(format!(
                "ephemeral public key is not {PUBLIC_KEY_LEN} bytes"
            ))
        })?;

    let mut shared_secret = [0u8; SHARED_SECRET_LEN];
    shared_secret.copy_from_slice(shared.raw_secret_bytes().as_slice());

    Ok(AgreedKeys {
        server_public_key,
        shared_secret,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> (SecretKey, ClientKeys) {
        let secret = SecretKey::random(&mut OsRng);
        let public = secret.public_key().to_encoded_point(false);
        let keys = ClientKeys::from_bytes(public.as_bytes(), &[9u8; 16]).expect("client keys");
        (secret, keys)
    }

    #[test]
    fn test_both_sides_agree() {
        let (client_secret, client_keys) = client();
        let agreed = agree(&client_keys).expect("agree");

        let server_public =
            p256::PublicKey::from_sec1_bytes(&agreed.server_public_key).expect("server key");
        let client_side =
            p256::ecdh::diffie_hellman(client_secret.to_nonzero_scalar(), server_public.as_affine());

        assert_eq!(client_side.raw_secret_bytes().as_slice(), &agreed.shared_secret);
        assert_eq!(agreed.server_public_key[0], 0x04);
    }

    #[test]
    fn test_each_call_uses_a_fresh_key_pair() {
        let (_, client_keys) = client();
        let first = agree(&client_keys).expect("agree");
        let second = agree(&client_keys).expect("agree");

        assert_ne!(first.server_public_key, second.server_public_key);
        assert_ne!(first.shared_secret, second.shared_secret);
    }
}
