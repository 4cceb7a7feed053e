//! Turning a validated claims model into a compact token.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::Header;
use thiserror::Error;
use tracing::debug;

use crate::codec::jwe::{self, JweError};
use crate::codec::{Audience, WireClaims};
use crate::keys::{EncryptionKey, KeyError, SigningKey};
use crate::properties::TokenProperties;

/// Errors producing a token. These are infrastructure failures (bad key
/// material, a failing random source), not validation findings.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Key material could not be prepared for signing.
    #[error("unable to prepare signing key: {0}")]
    Key(#[from] KeyError),

    /// The JWT library refused to sign the claim set.
    #[error("unable to sign token: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),

    /// The claim set could not be serialized.
    #[error("unable to serialize token claims: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The signed token could not be wrapped in its JWE envelope.
    #[error("unable to encrypt token: {0}")]
    Encrypt(#[from] JweError),
}

/// Generates compact entitlement tokens from a [`TokenProperties`].
///
/// With no signing key the token is emitted in the unsigned `alg: none`
/// form, useful for development and for tests that exercise claim
/// handling without key material. With an encryption key the signed
/// token is additionally wrapped in a compact JWE.
#[derive(Debug, Clone)]
pub struct TokenGenerator {
    signing_key: Option<SigningKey>,
    encryption_key: Option<EncryptionKey>,
}

impl TokenGenerator {
    #[must_use]
    pub fn new(signing_key: Option<SigningKey>, encryption_key: Option<EncryptionKey>) -> Self {
        TokenGenerator {
            signing_key,
            encryption_key,
        }
    }

    /// Generate the compact token for `properties`.
    ///
    /// # Errors
    ///
    /// Fails only on unusable key material or a failing crypto primitive;
    /// the claim set itself was already validated by the builder.
    pub fn generate(&self, properties: &TokenProperties) -> Result<String, GenerateError> {
        let claims = wire_claims(properties);
        log_claims(properties);

        let token = match &self.signing_key {
            Some(key) => {
                let header = Header::new(key.algorithm());
                jsonwebtoken::encode(&header, &claims, &key.encoding_key()?)?
            }
            None => unsigned_token(&claims)?,
        };

        match &self.encryption_key {
            Some(key) => Ok(jwe::encrypt(token.as_bytes(), key)?),
            None => Ok(token),
        }
    }
}

fn wire_claims(properties: &TokenProperties) -> WireClaims {
    let optional = |value: &str| (!value.is_empty()).then(|| value.to_string());
    WireClaims {
        aud: Some(Audience::One(properties.audience().to_string())),
        iss: Some(properties.issuer().to_string()),
        iat: Some(properties.issued_at().timestamp()),
        nbf: Some(properties.not_before().timestamp()),
        exp: Some(properties.not_after().timestamp()),
        applications: properties.applications().iter().cloned().collect(),
        ip_addresses: properties
            .ip_addresses()
            .iter()
            .map(ToString::to_string)
            .collect(),
        virtual_machine_id: optional(properties.virtual_machine_id()),
        token_id: optional(properties.identifier()),
    }
}

/// Compact serialization of an `alg: none` token: signed-token shape
/// with an empty signature segment.
fn unsigned_token(claims: &WireClaims) -> Result<String, GenerateError> {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    Ok(format!("{header}.{payload}."))
}

fn log_claims(properties: &TokenProperties) {
    debug!(
        target: "entitlements.codec",
        identifier = properties.identifier(),
        virtual_machine_id = properties.virtual_machine_id(),
        not_before = %properties.not_before(),
        not_after = %properties.not_after(),
        issued_at = %properties.issued_at(),
        audience = properties.audience(),
        issuer = properties.issuer(),
        applications = ?properties.applications(),
        ip_addresses = ?properties.ip_addresses(),
        "generating entitlement token"
    );
}
