//! Token wire format: signing, optional encryption, and reading.
//!
//! Tokens are standard JWTs carrying the registered `aud`/`iss`/`iat`/
//! `nbf`/`exp` claims plus the entitlement claims from [`crate::claims`].
//! Signed tokens use HS256 or EdDSA; unsigned tokens use the `alg: none`
//! compact form. An encrypted token wraps the signed JWT in a compact
//! JWE (`dir` + `A256GCM`).

pub mod generate;
pub mod jwe;
pub mod read;

pub use generate::{GenerateError, TokenGenerator};
pub use read::TokenReader;

use serde::{Deserialize, Deserializer, Serialize};

/// The `aud` claim, which appears on the wire as either a single string
/// or an array of strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum Audience {
    One(String),
    Many(Vec<String>),
}

/// Claims as they appear in the token payload.
///
/// Everything is optional on the read side; the reader reports missing
/// claims through the validation pipeline rather than a serde error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireClaims {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(
        rename = "app",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub applications: Vec<String>,
    #[serde(
        rename = "ip",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub ip_addresses: Vec<String>,
    #[serde(
        rename = "vmid",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub virtual_machine_id: Option<String>,
    #[serde(
        rename = "id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub token_id: Option<String>,
}

/// A repeatable claim arrives as either a bare string (one value) or an
/// array; normalize to a list either way.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn repeatable_claims_accept_a_bare_string() {
        let claims: WireClaims = serde_json::from_str(
            r#"{"exp": 1, "app": "contosoapp", "ip": ["127.0.0.1"]}"#,
        )
        .unwrap();
        assert_eq!(claims.applications, vec!["contosoapp"]);
        assert_eq!(claims.ip_addresses, vec!["127.0.0.1"]);
    }

    #[test]
    fn audience_accepts_string_or_array() {
        let single: WireClaims = serde_json::from_str(r#"{"aud": "https://a"}"#).unwrap();
        assert!(matches!(single.aud, Some(Audience::One(_))));
        let many: WireClaims = serde_json::from_str(r#"{"aud": ["https://a"]}"#).unwrap();
        assert!(matches!(many.aud, Some(Audience::Many(_))));
    }
}
