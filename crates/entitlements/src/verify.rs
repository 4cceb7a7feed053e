//! Checking a verification request against a token's claims.
//!
//! A request asks "may application X run at address Y under this
//! token?". The checks are independent, so a request that fails several
//! of them gets every denial in one response.

use std::net::IpAddr;
use tracing::debug;

use common::{Combine, Validated};

use crate::codec::read::TokenReader;
use crate::properties::TokenProperties;

/// What a client asks to have verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub application_id: String,
    pub ip_address: IpAddr,
}

impl VerificationRequest {
    #[must_use]
    pub fn new(application_id: impl Into<String>, ip_address: IpAddr) -> Self {
        VerificationRequest {
            application_id: application_id.into(),
            ip_address,
        }
    }
}

/// Verifies requests against entitlement tokens.
#[derive(Debug, Clone)]
pub struct EntitlementVerifier {
    reader: TokenReader,
}

impl EntitlementVerifier {
    #[must_use]
    pub fn new(reader: TokenReader) -> Self {
        EntitlementVerifier { reader }
    }

    /// Read `token` and check `request` against it.
    ///
    /// Reading is a dependent step (there is nothing to check if the
    /// token itself is bad), so its failures short-circuit; the request
    /// checks themselves accumulate.
    pub fn verify_token(
        &self,
        token: &str,
        request: &VerificationRequest,
    ) -> Validated<TokenProperties> {
        self.reader
            .read(token)
            .and_then(|properties| verify(properties, request))
    }
}

/// Check a request against an already-decoded claims model.
///
/// All three checks run regardless of earlier failures, and every
/// denial is included in the result.
pub fn verify(
    properties: TokenProperties,
    request: &VerificationRequest,
) -> Validated<TokenProperties> {
    debug!(
        target: "entitlements.verify",
        application_id = %request.application_id,
        ip_address = %request.ip_address,
        token_id = properties.identifier(),
        "verifying entitlement request"
    );

    let failures = [
        application_error(&properties, &request.application_id),
        ip_address_error(&properties, request.ip_address),
        identifier_error(&properties),
    ]
    .into_iter()
    .flatten()
    .reduce(Combine::combine);

    match failures {
        Some(errors) => Validated::Invalid(errors),
        None => Validated::ok(properties),
    }
}

// Application ids compare case-insensitively.
fn application_error(
    properties: &TokenProperties,
    application_id: &str,
) -> Option<common::ErrorSet> {
    let entitled = properties
        .applications()
        .iter()
        .any(|app| app.eq_ignore_ascii_case(application_id));
    (!entitled).then(|| {
        common::ErrorSet::of(format!(
            "Token does not grant entitlement for {application_id}"
        ))
    })
}

fn ip_address_error(properties: &TokenProperties, ip_address: IpAddr) -> Option<common::ErrorSet> {
    (!properties.ip_addresses().contains(&ip_address)).then(|| {
        common::ErrorSet::of(format!(
            "Token does not grant entitlement for {ip_address}"
        ))
    })
}

fn identifier_error(properties: &TokenProperties) -> Option<common::ErrorSet> {
    properties.identifier().is_empty().then(|| {
        common::ErrorSet::of("Entitlement identifier missing from entitlement token")
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn entitled_properties() -> TokenProperties {
        let now = Utc::now();
        TokenProperties::default()
            .with_identifier("entitlement-abc")
            .from_instant(now - Duration::minutes(5))
            .until_instant(now + Duration::days(1))
            .with_issued_at(now)
            .add_application("contosoapp")
            .with_ip_addresses(["127.0.0.1".parse::<IpAddr>().unwrap()])
    }

    fn request(application: &str, address: &str) -> VerificationRequest {
        VerificationRequest::new(application, address.parse().unwrap())
    }

    #[test]
    fn grants_matching_request() {
        let result = verify(entitled_properties(), &request("contosoapp", "127.0.0.1"));
        assert!(result.has_value());
    }

    #[test]
    fn application_match_is_case_insensitive() {
        let result = verify(entitled_properties(), &request("ContosoApp", "127.0.0.1"));
        assert!(result.has_value());
    }

    #[test]
    fn denies_unentitled_application() {
        let errors = verify(entitled_properties(), &request("maximumapp", "127.0.0.1"))
            .into_result()
            .unwrap_err();
        assert!(errors.any_contains("Token does not grant entitlement for maximumapp"));
    }

    #[test]
    fn denies_unentitled_address() {
        let errors = verify(entitled_properties(), &request("contosoapp", "10.0.0.7"))
            .into_result()
            .unwrap_err();
        assert!(errors.any_contains("Token does not grant entitlement for 10.0.0.7"));
    }

    #[test]
    fn denies_missing_identifier() {
        let properties = entitled_properties().with_identifier("");
        let errors = verify(properties, &request("contosoapp", "127.0.0.1"))
            .into_result()
            .unwrap_err();
        assert!(errors.any_contains("Entitlement identifier missing from entitlement token"));
    }

    #[test]
    fn all_denials_are_reported_together() {
        let properties = entitled_properties().with_identifier("");
        let errors = verify(properties, &request("maximumapp", "10.0.0.7"))
            .into_result()
            .unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
