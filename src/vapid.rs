//! VAPID sender identity and request authorization (RFC 8292).
//!
//! The application owns a long-lived P-256 identity. For every send,
//! [`VapidAuthorizer`] signs a fresh ES256 JWT scoped to the push service's
//! origin and valid for exactly 12 hours, then assembles the request headers:
//!
//! ```text
//! Authorization: vapid t=<header.claims.signature>, k=<public key>
//! TTL: 86400
//! Content-Encoding: aes128gcm
//! Urgency: high            (only when supplied)
//! Topic: <topic>           (only when supplied)
//! ```

// Rust guideline compliant 2026-02

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL, Engine};
use chrono::{DateTime, Utc};
use p256::ecdsa::{signature::Signer, Signature, SigningKey};
use p256::elliptic_curve::rand_core::OsRng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_ENCODING};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::constants::{
    CONTENT_ENCODING as AES128GCM, PUBLIC_KEY_LEN, TOKEN_LIFETIME, TTL_SECONDS,
    UNCOMPRESSED_POINT_TAG,
};
use crate::error::PushError;
use crate::subscription::BASE64URL_LENIENT;

/// Application server identity used to sign VAPID tokens.
///
/// Holds the signing key in memory only; loading and storing it is the
/// application's job.
#[derive(Clone)]
pub struct VapidIdentity {
    signing_key: SigningKey,
    public_key: [u8; PUBLIC_KEY_LEN],
    subject: String,
}

impl fmt::Debug for VapidIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VapidIdentity")
            .field("public_key", &self.public_key_base64url())
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

impl VapidIdentity {
    /// Generate a fresh identity.
    pub fn generate(subject: impl Into<String>) -> Result<Self, PushError> {
        Self::from_signing_key(SigningKey::random(&mut OsRng), subject)
    }

    /// Build an identity around an existing signing key.
    pub fn from_signing_key(
        signing_key: SigningKey,
        subject: impl Into<String>,
    ) -> Result<Self, PushError> {
        let subject = validate_subject(subject.into())?;

        // SEC1 uncompressed public key (65 bytes: 0x04 || x || y)
        let encoded = signing_key.verifying_key().to_encoded_point(false);
        let public_key: [u8; PUBLIC_KEY_LEN] = encoded.as_bytes().try_into().map_err(|_e| {
            PushError::InvalidVapidCredentials("public key is not an uncompressed point".into())
        })?;

        Ok(Self {
            signing_key,
            public_key,
            subject,
        })
    }

    /// Reconstruct from base64url strings.
    ///
    /// The private key is the raw 32-byte scalar; the public key the 65-byte
    /// uncompressed point and must belong to that scalar.
    pub fn from_base64url(
        public_key_b64: &str,
        private_key_b64: &str,
        subject: impl Into<String>,
    ) -> Result<Self, PushError> {
        let pub_bytes = BASE64URL_LENIENT.decode(public_key_b64).map_err(|e| {
            PushError::InvalidVapidCredentials(format!("invalid base64url for public key: {e}"))
        })?;
        if pub_bytes.len() != PUBLIC_KEY_LEN || pub_bytes[0] != UNCOMPRESSED_POINT_TAG {
            return Err(PushError::InvalidVapidCredentials(
                "public key must be 65-byte uncompressed P-256 point".into(),
            ));
        }

        let priv_bytes = BASE64URL_LENIENT.decode(private_key_b64).map_err(|e| {
            PushError::InvalidVapidCredentials(format!("invalid base64url for private key: {e}"))
        })?;
        if priv_bytes.len() != 32 {
            return Err(PushError::InvalidVapidCredentials(format!(
                "private key must be 32-byte P-256 scalar, got {} bytes",
                priv_bytes.len()
            )));
        }
        let signing_key = SigningKey::from_slice(&priv_bytes).map_err(|_e| {
            PushError::InvalidVapidCredentials("private key is not a valid P-256 scalar".into())
        })?;

        let identity = Self::from_signing_key(signing_key, subject)?;
        if identity.public_key.as_slice() != pub_bytes.as_slice() {
            return Err(PushError::InvalidVapidCredentials(
                "public key does not match private key".into(),
            ));
        }
        Ok(identity)
    }

    /// Load a PEM private key (PKCS#8 `PRIVATE KEY`, or SEC1 `EC PRIVATE KEY`).
    pub fn from_pem(private_key_pem: &str, subject: impl Into<String>) -> Result<Self, PushError> {
        use p256::pkcs8::DecodePrivateKey;

        let signing_key = match SigningKey::from_pkcs8_pem(private_key_pem) {
            Ok(key) => key,
            Err(_) => p256::SecretKey::from_sec1_pem(private_key_pem)
                .map(SigningKey::from)
                .map_err(|_e| {
                    PushError::InvalidVapidCredentials(
                        "private key is not a PKCS#8 or SEC1 PEM P-256 key".into(),
                    )
                })?,
        };
        Self::from_signing_key(signing_key, subject)
    }

    /// Load a binary private key: raw 32-byte scalar, SEC1 DER, or PKCS#8 DER.
    pub fn from_der(private_key: &[u8], subject: impl Into<String>) -> Result<Self, PushError> {
        use p256::pkcs8::DecodePrivateKey;

        let signing_key = if private_key.len() == 32 {
            SigningKey::from_slice(private_key).ok()
        } else if let Ok(sk) = p256::SecretKey::from_sec1_der(private_key) {
            Some(SigningKey::from(sk))
        } else {
            SigningKey::from_pkcs8_der(private_key).ok()
        };

        let signing_key = signing_key.ok_or_else(|| {
            PushError::InvalidVapidCredentials(
                "private key is not a valid 32-byte scalar, SEC1 DER, or PKCS#8 DER".into(),
            )
        })?;
        Self::from_signing_key(signing_key, subject)
    }

    /// Uncompressed public key bytes (65 bytes).
    pub fn public_key_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public_key
    }

    /// Base64url-encoded public key, the browser's `applicationServerKey`.
    pub fn public_key_base64url(&self) -> String {
        BASE64URL.encode(self.public_key)
    }

    /// Base64url-encoded raw 32-byte private key scalar.
    pub fn private_key_base64url(&self) -> String {
        BASE64URL.encode(self.signing_key.to_bytes())
    }

    /// Contact URI placed in the token's `sub` claim.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Verifying half of the signing key.
    pub fn verifying_key(&self) -> &p256::ecdsa::VerifyingKey {
        self.signing_key.verifying_key()
    }
}

fn validate_subject(subject: String) -> Result<String, PushError> {
    if subject.starts_with("mailto:") || subject.starts_with("https:") {
        Ok(subject)
    } else {
        Err(PushError::InvalidVapidCredentials(format!(
            "subject must be a mailto: or https: URI, got '{subject}'"
        )))
    }
}

/// Serialized form of a VAPID identity (base64url keys).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VapidKeys {
    /// Uncompressed public key (base64url, 65 bytes decoded).
    pub public_key: String,
    /// Raw 32-byte private key scalar (base64url).
    pub private_key: String,
    /// Contact URI (`mailto:` or `https:`).
    pub subject: String,
}

impl TryFrom<VapidKeys> for VapidIdentity {
    type Error = PushError;

    fn try_from(keys: VapidKeys) -> Result<Self, Self::Error> {
        Self::from_base64url(&keys.public_key, &keys.private_key, keys.subject)
    }
}

impl From<&VapidIdentity> for VapidKeys {
    fn from(identity: &VapidIdentity) -> Self {
        Self {
            public_key: identity.public_key_base64url(),
            private_key: identity.private_key_base64url(),
            subject: identity.subject.clone(),
        }
    }
}

/// Message urgency (RFC 8030 §5.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    /// On power and Wi-Fi only.
    VeryLow,
    /// On either power or Wi-Fi.
    Low,
    /// On neither power nor Wi-Fi.
    Normal,
    /// Low battery included.
    High,
}

impl Urgency {
    /// Header value for this level.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryLow => "very-low",
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = PushError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "very-low" => Ok(Self::VeryLow),
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            other => Err(PushError::InvalidHeader(format!("unknown urgency '{other}'"))),
        }
    }
}

#[derive(Serialize)]
struct JwtHeader {
    typ: &'static str,
    alg: &'static str,
}

/// Claims carried by a VAPID token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VapidClaims {
    /// Origin of the push service.
    pub aud: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    /// Sender contact URI.
    pub sub: String,
}

/// Builds signed authorization headers for one push request.
#[derive(Debug, Clone, Copy)]
pub struct VapidAuthorizer<'a> {
    identity: &'a VapidIdentity,
}

impl<'a> VapidAuthorizer<'a> {
    /// Borrow an identity for signing.
    pub fn new(identity: &'a VapidIdentity) -> Self {
        Self { identity }
    }

    /// Token audience: the origin (`scheme://host[:port]`) of the endpoint.
    pub fn audience(endpoint: &Url) -> Result<String, PushError> {
        let origin = endpoint.origin();
        if !origin.is_tuple() {
            return Err(PushError::MalformedSubscription(format!(
                "endpoint '{endpoint}' has no origin"
            )));
        }
        Ok(origin.ascii_serialization())
    }

    /// Sign a compact ES256 JWT with the given claims.
    ///
    /// The signature is raw `r || s` (64 bytes), not DER.
    pub fn token(&self, claims: &VapidClaims) -> Result<String, PushError> {
        let header = JwtHeader {
            typ: "JWT",
            alg: "ES256",
        };
        let header = serde_json::to_vec(&header)
            .map_err(|e| PushError::InvalidVapidCredentials(format!("JWT header: {e}")))?;
        let claims = serde_json::to_vec(claims)
            .map_err(|e| PushError::InvalidVapidCredentials(format!("JWT claims: {e}")))?;

        let unsigned = format!("{}.{}", BASE64URL.encode(header), BASE64URL.encode(claims));
        let signature: Signature = self
            .identity
            .signing_key
            .try_sign(unsigned.as_bytes())
            .map_err(|e| PushError::InvalidVapidCredentials(format!("ES256 signing failed: {e}")))?;

        Ok(format!("{unsigned}.{}", BASE64URL.encode(signature.to_bytes())))
    }

    /// Claims for a token issued at `issued_at`.
    pub fn claims_at(
        &self,
        endpoint: &Url,
        issued_at: DateTime<Utc>,
    ) -> Result<VapidClaims, PushError> {
        Ok(VapidClaims {
            aud: Self::audience(endpoint)?,
            exp: issued_at.timestamp() + TOKEN_LIFETIME.as_secs() as i64,
            sub: self.identity.subject.clone(),
        })
    }

    /// `Authorization` header value for a token issued now.
    pub fn authorization(&self, endpoint: &Url) -> Result<String, PushError> {
        self.authorization_at(endpoint, Utc::now())
    }

    /// `Authorization` header value for a token issued at `issued_at`.
    pub fn authorization_at(
        &self,
        endpoint: &Url,
        issued_at: DateTime<Utc>,
    ) -> Result<String, PushError> {
        let claims = self.claims_at(endpoint, issued_at)?;
        let jwt = self.token(&claims)?;
        Ok(format!(
            "vapid t={jwt}, k={}",
            self.identity.public_key_base64url()
        ))
    }

    /// Every header a push request carries besides the body framing.
    pub fn headers(
        &self,
        endpoint: &Url,
        urgency: Option<Urgency>,
        topic: Option<&str>,
    ) -> Result<HeaderMap, PushError> {
        let authorization = self.authorization(endpoint)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&authorization)
                .map_err(|e| PushError::InvalidHeader(format!("Authorization: {e}")))?,
        );
        headers.insert(HeaderName::from_static("ttl"), HeaderValue::from(TTL_SECONDS));
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static(AES128GCM));

        if let Some(urgency) = urgency {
            headers.insert(
                HeaderName::from_static("urgency"),
                HeaderValue::from_static(urgency.as_str()),
            );
        }

        if let Some(topic) = topic {
            let value = HeaderValue::from_str(topic)
                .map_err(|e| PushError::InvalidHeader(format!("Topic '{topic}': {e}")))?;
            headers.insert(HeaderName::from_static("topic"), value);
        }

        Ok(headers)
    }
}
