//! Browser push subscription record.
//!
//! Mirrors the JSON produced by `PushSubscription.toJSON()` in the browser.
//! The record is owned by the caller; a send only reads it.

// Rust guideline compliant 2026-02

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use p256::PublicKey;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::constants::{AUTH_SECRET_LEN, PUBLIC_KEY_LEN, UNCOMPRESSED_POINT_TAG};
use crate::error::PushError;

/// Base64url decoder that tolerates both padded and unpadded input.
///
/// Browsers emit unpadded base64url, but subscriptions relayed through other
/// tooling sometimes arrive padded.
pub(crate) const BASE64URL_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A browser's push subscription.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Push service endpoint URL.
    pub endpoint: String,
    /// Client key material.
    pub keys: SubscriptionKeys,
    /// Expiration as reported by the browser (milliseconds since epoch).
    #[serde(default)]
    pub expiration_time: Option<f64>,
}

/// Key material of a subscription, base64url-encoded as on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    /// Browser's P-256 ECDH public key (uncompressed point).
    pub p256dh: String,
    /// Shared auth secret (16 bytes).
    pub auth: String,
}

/// Decoded and validated client key material.
#[derive(Clone, Debug)]
pub struct ClientKeys {
    public_key: PublicKey,
    public_key_bytes: [u8; PUBLIC_KEY_LEN],
    auth_secret: [u8; AUTH_SECRET_LEN],
}

impl Subscription {
    /// Build a subscription from its endpoint and base64url keys.
    pub fn new(
        endpoint: impl Into<String>,
        p256dh: impl Into<String>,
        auth: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            keys: SubscriptionKeys {
                p256dh: p256dh.into(),
                auth: auth.into(),
            },
            expiration_time: None,
        }
    }

    /// Parse the endpoint. Only `http` and `https` endpoints are accepted.
    pub fn endpoint_url(&self) -> Result<Url, PushError> {
        let url = Url::parse(&self.endpoint).map_err(|e| {
            PushError::MalformedSubscription(format!("invalid endpoint URL: {e}"))
        })?;
        match url.scheme() {
            "https" | "http" if url.host_str().is_some() => Ok(url),
            scheme => Err(PushError::MalformedSubscription(format!(
                "endpoint must be an http(s) URL with a host, got scheme '{scheme}'"
            ))),
        }
    }

    /// Decode and validate `keys.p256dh` and `keys.auth`.
    pub fn client_keys(&self) -> Result<ClientKeys, PushError> {
        ClientKeys::from_base64url(&self.keys.p256dh, &self.keys.auth)
    }
}

impl ClientKeys {
    /// Decode base64url key material from a subscription.
    pub fn from_base64url(p256dh: &str, auth: &str) -> Result<Self, PushError> {
        let public = BASE64URL_LENIENT.decode(p256dh).map_err(|e| {
            PushError::MalformedSubscription(format!("invalid base64url for p256dh: {e}"))
        })?;
        let auth = BASE64URL_LENIENT.decode(auth).map_err(|e| {
            PushError::MalformedSubscription(format!("invalid base64url for auth: {e}"))
        })?;
        Self::from_bytes(&public, &auth)
    }

    /// Validate raw key material.
    ///
    /// The public key must be a 65-byte uncompressed point on P-256 and the
    /// auth secret exactly 16 bytes.
    pub fn from_bytes(public_key: &[u8], auth_secret: &[u8]) -> Result<Self, PushError> {
        let public_key_bytes: [u8; PUBLIC_KEY_LEN] = public_key.try_into().map_err(|_e| {
            PushError::MalformedSubscription(format!(
                "p256dh must be a {PUBLIC_KEY_LEN}-byte uncompressed P-256 point, got {} bytes",
                public_key.len()
            ))
        })?;
        if public_key_bytes[0] != UNCOMPRESSED_POINT_TAG {
            return Err(PushError::MalformedSubscription(
                "p256dh must be an uncompressed point (0x04 prefix)".to_string(),
            ));
        }
        let public_key = PublicKey::from_sec1_bytes(&public_key_bytes).map_err(|_e| {
            PushError::MalformedSubscription("p256dh is not a point on P-256".to_string())
        })?;

        let auth_secret: [u8; AUTH_SECRET_LEN] = auth_secret.try_into().map_err(|_e| {
            PushError::MalformedSubscription(format!(
                "auth secret must be {AUTH_SECRET_LEN} bytes, got {} bytes",
                auth_secret.len()
            ))
        })?;

        Ok(Self {
            public_key,
            public_key_bytes,
            auth_secret,
        })
    }

    /// Parsed client public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Uncompressed client public key bytes.
    pub fn public_key_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public_key_bytes
    }

    /// Subscription auth secret.
    pub fn auth_secret(&self) -> &[u8; AUTH_SECRET_LEN] {
        &self.auth_secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL;
    use p256::elliptic_curve::rand_core::OsRng;
    use p256::elliptic_curve::sec1::ToEncodedPoint;
    use p256::SecretKey;

    fn client_public_b64() -> String {
        let secret = SecretKey::random(&mut OsRng);
        BASE64URL.encode(secret.public_key().to_encoded_point(false).as_bytes())
    }

    #[test]
    fn test_deserialize_browser_json() {
        let json = r#"{
            "endpoint": "https://fcm.googleapis.com/fcm/send/abc",
            "expirationTime": null,
            "keys": { "p256dh": "BAAA", "auth": "AAAA" }
        }"#;
        let sub: Subscription = serde_json::from_str(json).expect("deserialize");
        assert_eq!(sub.endpoint, "https://fcm.googleapis.com/fcm/send/abc");
        assert_eq!(sub.keys.p256dh, "BAAA");
        assert!(sub.expiration_time.is_none());

        let out = serde_json::to_value(&sub).expect("serialize");
        assert!(out.get("expirationTime").is_some(), "camelCase on the wire");
    }

    #[test]
    fn test_valid_keys_decode() {
        let sub = Subscription::new(
            "https://push.example.com/1",
            client_public_b64(),
            BASE64URL.encode([7u8; 16]),
        );
        let keys = sub.client_keys().expect("valid keys");
        assert_eq!(keys.public_key_bytes()[0], 0x04);
        assert_eq!(keys.auth_secret(), &[7u8; 16]);
    }

    #[test]
    fn test_padded_base64url_is_accepted() {
        let sub = Subscription::new(
            "https://push.example.com/1",
            client_public_b64(),
            base64::engine::general_purpose::URL_SAFE.encode([1u8; 16]),
        );
        assert!(sub.client_keys().is_ok());
    }

    #[test]
    fn test_wrong_length_public_key_rejected() {
        let sub = Subscription::new(
            "https://push.example.com/1",
            BASE64URL.encode([4u8; 33]),
            BASE64URL.encode([0u8; 16]),
        );
        assert!(matches!(
            sub.client_keys(),
            Err(PushError::MalformedSubscription(_))
        ));
    }

    #[test]
    fn test_point_not_on_curve_rejected() {
        let mut bytes = [0xffu8; 65];
        bytes[0] = 0x04;
        let result = ClientKeys::from_bytes(&bytes, &[0u8; 16]);
        assert!(matches!(result, Err(PushError::MalformedSubscription(_))));
    }

    #[test]
    fn test_compressed_point_rejected() {
        let secret = SecretKey::random(&mut OsRng);
        let compressed = secret.public_key().to_encoded_point(true);
        let result = ClientKeys::from_bytes(compressed.as_bytes(), &[0u8; 16]);
        assert!(matches!(result, Err(PushError::MalformedSubscription(_))));
    }

    #[test]
    fn test_short_auth_secret_rejected() {
        let sub = Subscription::new(
            "https://push.example.com/1",
            client_public_b64(),
            BASE64URL.encode([0u8; 12]),
        );
        assert!(matches!(
            sub.client_keys(),
            Err(PushError::MalformedSubscription(_))
        ));
    }

    #[test]
    fn test_endpoint_scheme_checked() {
        let mut sub = Subscription::new("ftp://push.example.com/1", "", "");
        assert!(sub.endpoint_url().is_err());
        sub.endpoint = "not a url".to_string();
        assert!(sub.endpoint_url().is_err());
        sub.endpoint = "https://push.example.com/send/xyz".to_string();
        assert!(sub.endpoint_url().is_ok());
    }
}
