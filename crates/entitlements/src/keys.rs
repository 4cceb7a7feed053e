//! Signing and encryption key material.
//!
//! The pipeline trusts whatever key material it is handed; this module
//! only wraps it in types the codec can consume, mapping HMAC secrets to
//! HS256 and Ed25519 PEM material to EdDSA. Unusable material (wrong
//! length, missing half of a keypair, undecodable PEM) is an
//! infrastructure error, reported through [`KeyError`] rather than the
//! validation taxonomy.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use thiserror::Error;

/// Minimum HMAC secret length in bytes.
///
/// Anything shorter is trivially brute-forceable and almost certainly a
/// configuration mistake.
pub const MIN_HMAC_SECRET_BYTES: usize = 16;

/// AES-256-GCM key length for token encryption.
pub const ENCRYPTION_KEY_BYTES: usize = 32;

/// Errors preparing key material for use.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The HMAC secret is too short to be taken seriously.
    #[error("HMAC secret must be at least {MIN_HMAC_SECRET_BYTES} bytes, got {0}")]
    HmacSecretTooShort(usize),

    /// Base64-encoded key material could not be decoded.
    #[error("Key material is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// A signing operation needs a private key this material lacks.
    #[error("Signing requires a private key, but only a public key was supplied")]
    MissingPrivateKey,

    /// PEM material was rejected by the JWT library.
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// The encryption key is not the right length for AES-256-GCM.
    #[error("Encryption key must be exactly {ENCRYPTION_KEY_BYTES} bytes, got {0}")]
    InvalidEncryptionKeyLength(usize),
}

#[derive(Clone)]
enum SigningKeyInner {
    Hmac(Vec<u8>),
    /// PKCS#8 private key PEM; signs and (via the embedded public half
    /// being unavailable to `jsonwebtoken`) cannot verify.
    Ed25519PrivatePem(String),
    /// SPKI public key PEM; verifies only.
    Ed25519PublicPem(String),
}

/// Key material used to sign or verify a token signature.
#[derive(Clone)]
pub struct SigningKey {
    inner: SigningKeyInner,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material never appears in logs.
        let kind = match &self.inner {
            SigningKeyInner::Hmac(_) => "Hmac",
            SigningKeyInner::Ed25519PrivatePem(_) => "Ed25519Private",
            SigningKeyInner::Ed25519PublicPem(_) => "Ed25519Public",
        };
        f.debug_struct("SigningKey").field("kind", &kind).finish()
    }
}

impl SigningKey {
    /// An HMAC secret, used symmetrically for signing and verification.
    ///
    /// # Errors
    ///
    /// Fails if the secret is shorter than [`MIN_HMAC_SECRET_BYTES`].
    pub fn hmac(secret: impl Into<Vec<u8>>) -> Result<Self, KeyError> {
        let secret = secret.into();
        if secret.len() < MIN_HMAC_SECRET_BYTES {
            return Err(KeyError::HmacSecretTooShort(secret.len()));
        }
        Ok(SigningKey {
            inner: SigningKeyInner::Hmac(secret),
        })
    }

    /// An HMAC secret supplied as standard base64.
    ///
    /// # Errors
    ///
    /// Fails on undecodable base64 or a too-short secret.
    pub fn hmac_base64(secret: &str) -> Result<Self, KeyError> {
        Self::hmac(STANDARD.decode(secret.trim())?)
    }

    /// An Ed25519 private key in PKCS#8 PEM form; signs tokens.
    #[must_use]
    pub fn ed25519_private_pem(pem: impl Into<String>) -> Self {
        SigningKey {
            inner: SigningKeyInner::Ed25519PrivatePem(pem.into()),
        }
    }

    /// An Ed25519 public key in SPKI PEM form; verifies token signatures.
    #[must_use]
    pub fn ed25519_public_pem(pem: impl Into<String>) -> Self {
        SigningKey {
            inner: SigningKeyInner::Ed25519PublicPem(pem.into()),
        }
    }

    /// The JWT algorithm this key signs/verifies with.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        match &self.inner {
            SigningKeyInner::Hmac(_) => Algorithm::HS256,
            SigningKeyInner::Ed25519PrivatePem(_) | SigningKeyInner::Ed25519PublicPem(_) => {
                Algorithm::EdDSA
            }
        }
    }

    /// The key in a form `jsonwebtoken` can sign with.
    ///
    /// # Errors
    ///
    /// Fails for public-only material or undecodable PEM.
    pub fn encoding_key(&self) -> Result<EncodingKey, KeyError> {
        match &self.inner {
            SigningKeyInner::Hmac(secret) => Ok(EncodingKey::from_secret(secret)),
            SigningKeyInner::Ed25519PrivatePem(pem) => EncodingKey::from_ed_pem(pem.as_bytes())
                .map_err(|e| KeyError::InvalidKeyMaterial(e.to_string())),
            SigningKeyInner::Ed25519PublicPem(_) => Err(KeyError::MissingPrivateKey),
        }
    }

    /// The key in a form `jsonwebtoken` can verify with.
    ///
    /// # Errors
    ///
    /// Fails for undecodable PEM, or for private-only Ed25519 material
    /// (the public half must be supplied separately for verification).
    pub fn decoding_key(&self) -> Result<DecodingKey, KeyError> {
        match &self.inner {
            SigningKeyInner::Hmac(secret) => Ok(DecodingKey::from_secret(secret)),
            SigningKeyInner::Ed25519PublicPem(pem) => DecodingKey::from_ed_pem(pem.as_bytes())
                .map_err(|e| KeyError::InvalidKeyMaterial(e.to_string())),
            SigningKeyInner::Ed25519PrivatePem(_) => Err(KeyError::InvalidKeyMaterial(
                "verification requires the Ed25519 public key, not the private key".to_string(),
            )),
        }
    }
}

/// A 32-byte AES-256-GCM key used to encrypt/decrypt tokens.
#[derive(Clone)]
pub struct EncryptionKey {
    bytes: [u8; ENCRYPTION_KEY_BYTES],
}

impl EncryptionKey {
    /// Wrap an existing 32-byte key.
    #[must_use]
    pub fn new(bytes: [u8; ENCRYPTION_KEY_BYTES]) -> Self {
        EncryptionKey { bytes }
    }

    /// Accept a key of any slice length, checking it.
    ///
    /// # Errors
    ///
    /// Fails unless the slice is exactly [`ENCRYPTION_KEY_BYTES`] long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; ENCRYPTION_KEY_BYTES] = bytes
            .try_into()
            .map_err(|_| KeyError::InvalidEncryptionKeyLength(bytes.len()))?;
        Ok(EncryptionKey { bytes })
    }

    /// Accept a key supplied as standard base64.
    ///
    /// # Errors
    ///
    /// Fails on undecodable base64 or a wrong-length key.
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        Self::from_slice(&STANDARD.decode(encoded.trim())?)
    }

    /// The raw key bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material never appears in logs.
        f.debug_struct("EncryptionKey").finish_non_exhaustive()
    }
}
