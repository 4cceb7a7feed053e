//! End-to-end exercise of the token lifecycle: build a claims model,
//! generate a token, read it back, verify a request against it, and
//! track the entitlement's events in the store.

#![allow(clippy::expect_used)]

use chrono::{Duration, Utc};
use std::net::IpAddr;
use uuid::Uuid;

use entitlements::store::EntitlementProperties;
use entitlements::{
    EncryptionKey, EntitlementStore, EntitlementVerifier, SigningKey, TokenGenerator,
    TokenProperties, TokenReader, VerificationRequest,
};

fn signing_key() -> SigningKey {
    SigningKey::hmac(vec![42u8; 32]).expect("32-byte secret is long enough")
}

fn entitled_properties(identifier: &str) -> TokenProperties {
    let now = Utc::now();
    TokenProperties::default()
        .with_identifier(identifier)
        .with_virtual_machine_id("vm-lifecycle")
        .from_instant(now - Duration::minutes(1))
        .until_instant(now + Duration::days(7))
        .with_issued_at(now)
        .add_application("contosoapp")
        .add_application("maximumapp")
        .with_ip_addresses([
            "127.0.0.1".parse::<IpAddr>().expect("valid address"),
            "fe80::5".parse::<IpAddr>().expect("valid address"),
        ])
}

#[test]
fn signed_token_grants_and_denies_requests() {
    let identifier = format!("entitlement-{}", Uuid::new_v4());
    let token = TokenGenerator::new(Some(signing_key()), None)
        .generate(&entitled_properties(&identifier))
        .expect("generation succeeds");

    let verifier = EntitlementVerifier::new(TokenReader::new(Some(signing_key()), None));

    let granted = verifier.verify_token(
        &token,
        &VerificationRequest::new("contosoapp", "127.0.0.1".parse().expect("valid address")),
    );
    let properties = granted.into_result().expect("request is entitled");
    assert_eq!(properties.identifier(), identifier);

    let denied = verifier.verify_token(
        &token,
        &VerificationRequest::new("otherapp", "10.1.2.3".parse().expect("valid address")),
    );
    let errors = denied.into_result().expect_err("request is not entitled");
    assert!(errors.any_contains("Token does not grant entitlement for otherapp"));
    assert!(errors.any_contains("Token does not grant entitlement for 10.1.2.3"));
}

#[test]
fn encrypted_token_round_trips_through_the_verifier() {
    let encryption = EncryptionKey::new([9u8; 32]);
    let identifier = format!("entitlement-{}", Uuid::new_v4());
    let token = TokenGenerator::new(Some(signing_key()), Some(encryption.clone()))
        .generate(&entitled_properties(&identifier))
        .expect("generation succeeds");

    // Five segments on the wire, none of them readable without the key.
    assert_eq!(token.matches('.').count(), 4);
    assert!(!token.contains("contosoapp"));

    let verifier =
        EntitlementVerifier::new(TokenReader::new(Some(signing_key()), Some(encryption)));
    let granted = verifier.verify_token(
        &token,
        &VerificationRequest::new("maximumapp", "fe80::5".parse().expect("valid address")),
    );
    assert!(granted.has_value());
}

#[test]
fn lifecycle_events_follow_the_token() {
    let identifier = format!("entitlement-{}", Uuid::new_v4());
    let store = EntitlementStore::new();
    let acquired = Utc::now();

    store
        .add(EntitlementProperties::new(&identifier, acquired))
        .into_result()
        .expect("fresh entitlement stores");
    store
        .renew(&identifier, acquired + Duration::minutes(10))
        .into_result()
        .expect("renewal stores");
    let released = store
        .release(&identifier, acquired + Duration::minutes(20))
        .into_result()
        .expect("release stores");

    assert!(released.is_released());
    assert_eq!(released.renewals().len(), 1);

    let errors = store
        .renew(&identifier, acquired + Duration::minutes(30))
        .into_result()
        .expect_err("released entitlements cannot renew");
    assert!(errors.any_contains("is already released"));
}
