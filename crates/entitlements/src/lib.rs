//! Issuing and verifying machine-bound software entitlement tokens.
//!
//! An entitlement token is a signed (optionally encrypted) JWT asserting
//! that a set of applications may run on a specific machine/IP address
//! until a given expiry. This crate owns the claims model, the mapping
//! between domain claims and wire claims, the validation taxonomy around
//! decoding, and the request-verification rules; all cryptography is
//! delegated to `jsonwebtoken` and `ring`.
//!
//! Generation: [`TokenProperties`] → [`TokenGenerator::generate`] → token.
//! Verification: token → [`TokenReader::read`] (library validation, error
//! taxonomy, re-validation of the claim set) → [`EntitlementVerifier`]
//! against a [`VerificationRequest`].

#![warn(clippy::pedantic)]

/// Module for wire claim names and self-signed defaults
pub mod claims;

/// Module for the immutable claims model and the accumulating builder
pub mod properties;

/// Module for the property-source abstraction
pub mod source;

/// Module for signing and encryption key material
pub mod keys;

/// Module for the JWT codec (encode, decode, error taxonomy)
pub mod codec;

/// Module for request verification against decoded claims
pub mod verify;

/// Module for the in-memory entitlement event store
pub mod store;

pub use codec::generate::TokenGenerator;
pub use codec::read::TokenReader;
pub use keys::{EncryptionKey, SigningKey};
pub use properties::TokenProperties;
pub use source::PropertySource;
pub use store::{EntitlementProperties, EntitlementStore};
pub use verify::{EntitlementVerifier, VerificationRequest};
