//! Compact JWE framing over AES-256-GCM.
//!
//! Encrypted tokens use direct key agreement (`alg: dir`) with a single
//! symmetric content key, so the encrypted-key segment is empty. The
//! protected header is authenticated as additional data, per RFC 7516.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keys::EncryptionKey;

/// Errors producing or unwrapping the JWE envelope.
#[derive(Debug, Error)]
pub enum JweError {
    /// The token does not have the five-segment compact JWE shape.
    #[error("token is not a compact JWE")]
    Malformed,

    /// The header names an algorithm this codec does not speak.
    #[error("unsupported JWE algorithm {alg}/{enc}")]
    UnsupportedAlgorithm { alg: String, enc: String },

    /// The system random source failed.
    #[error("unable to generate a nonce")]
    Random,

    /// Authentication failed; the token was tampered with or the key is
    /// wrong.
    #[error("token decryption failed")]
    Decryption,
}

const DIRECT_ALG: &str = "dir";
const CONTENT_ENC: &str = "A256GCM";

#[derive(Debug, Serialize, Deserialize)]
struct JweHeader {
    alg: String,
    enc: String,
}

/// Wrap `plaintext` (a serialized JWT) in a compact JWE.
pub fn encrypt(plaintext: &[u8], key: &EncryptionKey) -> Result<String, JweError> {
    let header = JweHeader {
        alg: DIRECT_ALG.to_string(),
        enc: CONTENT_ENC.to_string(),
    };
    // Header serialization cannot fail for this struct shape.
    let header_json = serde_json::to_vec(&header).map_err(|_| JweError::Malformed)?;
    let protected = URL_SAFE_NO_PAD.encode(header_json);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| JweError::Random)?;
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let unbound = UnboundKey::new(&AES_256_GCM, key.bytes()).map_err(|_| JweError::Decryption)?;
    let sealing = LessSafeKey::new(unbound);

    let mut in_out = plaintext.to_vec();
    let tag = sealing
        .seal_in_place_separate_tag(nonce, Aad::from(protected.as_bytes()), &mut in_out)
        .map_err(|_| JweError::Decryption)?;

    Ok(format!(
        "{protected}..{}.{}.{}",
        URL_SAFE_NO_PAD.encode(nonce_bytes),
        URL_SAFE_NO_PAD.encode(&in_out),
        URL_SAFE_NO_PAD.encode(tag.as_ref()),
    ))
}

/// Unwrap a compact JWE back to its serialized-JWT plaintext.
pub fn decrypt(token: &str, key: &EncryptionKey) -> Result<Vec<u8>, JweError> {
    let mut segments = token.split('.');
    let (protected, encrypted_key, iv, ciphertext, tag) = match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(h), Some(k), Some(i), Some(c), Some(t), None) => (h, k, i, c, t),
        _ => return Err(JweError::Malformed),
    };
    if !encrypted_key.is_empty() {
        // Direct key agreement carries no encrypted key.
        return Err(JweError::Malformed);
    }

    let header_json = URL_SAFE_NO_PAD
        .decode(protected)
        .map_err(|_| JweError::Malformed)?;
    let header: JweHeader =
        serde_json::from_slice(&header_json).map_err(|_| JweError::Malformed)?;
    if header.alg != DIRECT_ALG || header.enc != CONTENT_ENC {
        return Err(JweError::UnsupportedAlgorithm {
            alg: header.alg,
            enc: header.enc,
        });
    }

    let nonce_bytes = URL_SAFE_NO_PAD.decode(iv).map_err(|_| JweError::Malformed)?;
    let nonce =
        Nonce::try_assume_unique_for_key(&nonce_bytes).map_err(|_| JweError::Malformed)?;

    let mut in_out = URL_SAFE_NO_PAD
        .decode(ciphertext)
        .map_err(|_| JweError::Malformed)?;
    in_out.extend_from_slice(
        &URL_SAFE_NO_PAD.decode(tag).map_err(|_| JweError::Malformed)?,
    );

    let unbound = UnboundKey::new(&AES_256_GCM, key.bytes()).map_err(|_| JweError::Decryption)?;
    let opening = LessSafeKey::new(unbound);
    let plaintext = opening
        .open_in_place(nonce, Aad::from(protected.as_bytes()), &mut in_out)
        .map_err(|_| JweError::Decryption)?;

    Ok(plaintext.to_vec())
}

/// Whether a compact token has the five-segment JWE shape rather than
/// the three-segment JWS shape.
pub fn looks_encrypted(token: &str) -> bool {
    token.matches('.').count() == 4
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn key() -> EncryptionKey {
        EncryptionKey::new([0x2a; 32])
    }

    #[test]
    fn round_trips_plaintext() {
        let sealed = encrypt(b"header.payload.signature", &key()).unwrap();
        assert!(looks_encrypted(&sealed));
        let opened = decrypt(&sealed, &key()).unwrap();
        assert_eq!(opened, b"header.payload.signature");
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let sealed = encrypt(b"secret", &key()).unwrap();
        let other = EncryptionKey::new([0x2b; 32]);
        assert!(matches!(decrypt(&sealed, &other), Err(JweError::Decryption)));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let sealed = encrypt(b"secret", &key()).unwrap();
        // Flip a character in the ciphertext segment.
        let mut parts: Vec<String> = sealed.split('.').map(str::to_string).collect();
        let ct = parts.get_mut(3).unwrap();
        let flipped = if ct.starts_with('A') { "B" } else { "A" };
        ct.replace_range(0..1, flipped);
        assert!(matches!(
            decrypt(&parts.join("."), &key()),
            Err(JweError::Decryption)
        ));
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert!(matches!(
            decrypt("only.three.segments", &key()),
            Err(JweError::Malformed)
        ));
    }

    #[test]
    fn rejects_unknown_algorithm() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RSA-OAEP","enc":"A256GCM"}"#);
        let token = format!("{header}..AAAAAAAAAAAAAAAA.AAAA.AAAA");
        assert!(matches!(
            decrypt(&token, &key()),
            Err(JweError::UnsupportedAlgorithm { .. })
        ));
    }
}
