//! The immutable claims model for an entitlement token.
//!
//! A [`TokenProperties`] value is created once per generation (or once per
//! successful decode) and never mutated: every `with_*` method consumes the
//! value and returns a new one with a single field replaced. Assembly from
//! a [`PropertySource`] happens through the accumulating [`build`]
//! associated function, so every failing field is reported together.

use crate::source::PropertySource;
use chrono::{DateTime, Utc};
use common::timestamp::format_timestamp;
use common::{ErrorSet, Validated};
use std::collections::BTreeSet;
use std::net::IpAddr;

use crate::claims;

/// The properties encoded in a token for a specific compute node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenProperties {
    identifier: String,
    virtual_machine_id: String,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    issued_at: DateTime<Utc>,
    audience: String,
    issuer: String,
    applications: BTreeSet<String>,
    ip_addresses: BTreeSet<IpAddr>,
}

impl Default for TokenProperties {
    fn default() -> Self {
        let epoch = DateTime::UNIX_EPOCH;
        TokenProperties {
            identifier: String::new(),
            virtual_machine_id: String::new(),
            not_before: epoch,
            not_after: epoch,
            issued_at: epoch,
            audience: claims::DEFAULT_AUDIENCE.to_string(),
            issuer: claims::DEFAULT_ISSUER.to_string(),
            applications: BTreeSet::new(),
            ip_addresses: BTreeSet::new(),
        }
    }
}

impl TokenProperties {
    /// Assemble a validated claims model from a property source.
    ///
    /// Every one of the nine fields is read and validated independently;
    /// the result is valid only if all of them were, and otherwise carries
    /// the union of every individual failure (a token missing both an
    /// audience and an application id reports both problems, not just the
    /// first encountered).
    pub fn build<P: PropertySource>(source: &P) -> Validated<TokenProperties> {
        Validated::ok(TokenProperties::default())
            .with(source.not_before(), Self::from_instant)
            .with(source.not_after(), Self::until_instant)
            .with(source.issued_at(), Self::with_issued_at)
            .with(source.issuer(), Self::with_issuer)
            .with(source.audience(), Self::with_audience)
            .with(source.application_ids(), Self::with_applications)
            .with(source.ip_addresses(), Self::with_ip_addresses)
            .with(source.virtual_machine_id(), Self::with_virtual_machine_id)
            .with(source.token_id(), Self::with_identifier)
            .check(Self::window_order_error)
    }

    // An inverted validity window is a business-rule failure, reported
    // through the accumulating path rather than enforced in the model.
    fn window_order_error(&self) -> Option<ErrorSet> {
        (self.not_after < self.not_before).then(|| {
            ErrorSet::of(format!(
                "Token expiry {} is earlier than token validity start {}",
                format_timestamp(self.not_after),
                format_timestamp(self.not_before),
            ))
        })
    }

    /// Specify the earliest instant at which the token is active.
    #[must_use]
    pub fn from_instant(self, not_before: DateTime<Utc>) -> Self {
        TokenProperties { not_before, ..self }
    }

    /// Specify the latest instant at which the token is active.
    #[must_use]
    pub fn until_instant(self, not_after: DateTime<Utc>) -> Self {
        TokenProperties { not_after, ..self }
    }

    /// Specify the instant at which the token is issued.
    #[must_use]
    pub fn with_issued_at(self, issued_at: DateTime<Utc>) -> Self {
        TokenProperties { issued_at, ..self }
    }

    /// Specify the virtual machine id of the entitled machine (may be
    /// empty).
    #[must_use]
    pub fn with_virtual_machine_id(self, virtual_machine_id: impl Into<String>) -> Self {
        TokenProperties {
            virtual_machine_id: virtual_machine_id.into(),
            ..self
        }
    }

    /// Specify the entitled applications, trimmed and deduplicated.
    #[must_use]
    pub fn with_applications<I, S>(self, applications: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let applications = applications
            .into_iter()
            .map(|app| app.as_ref().trim().to_string())
            .collect();
        TokenProperties {
            applications,
            ..self
        }
    }

    /// Add a single entitled application.
    #[must_use]
    pub fn add_application(mut self, application: &str) -> Self {
        self.applications.insert(application.trim().to_string());
        self
    }

    /// Specify the IP addresses of the entitled machine, deduplicated.
    #[must_use]
    pub fn with_ip_addresses(self, ip_addresses: impl IntoIterator<Item = IpAddr>) -> Self {
        TokenProperties {
            ip_addresses: ip_addresses.into_iter().collect(),
            ..self
        }
    }

    /// Specify the unique token identifier used for correlating activity.
    #[must_use]
    pub fn with_identifier(self, identifier: impl Into<String>) -> Self {
        TokenProperties {
            identifier: identifier.into(),
            ..self
        }
    }

    /// Specify the audience for whom the token is intended.
    ///
    /// An empty audience is a contract violation, distinct from the soft
    /// validation failures carried by [`Validated`].
    #[must_use]
    pub fn with_audience(self, audience: impl Into<String>) -> Self {
        let audience = audience.into();
        assert!(!audience.is_empty(), "expect to have an audience");
        TokenProperties { audience, ..self }
    }

    /// Specify the issuer who hands out entitlement tokens.
    ///
    /// An empty issuer is a contract violation.
    #[must_use]
    pub fn with_issuer(self, issuer: impl Into<String>) -> Self {
        let issuer = issuer.into();
        assert!(!issuer.is_empty(), "expect to have an issuer");
        TokenProperties { issuer, ..self }
    }

    /// The unique identifier of this token (empty if never assigned).
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The virtual machine id of the entitled machine (may be empty).
    #[must_use]
    pub fn virtual_machine_id(&self) -> &str {
        &self.virtual_machine_id
    }

    /// The earliest instant at which the token is active.
    #[must_use]
    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    /// The latest instant at which the token is active.
    #[must_use]
    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// The instant at which the token was issued.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// The audience for whom the token is intended.
    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// The issuer who handed out the token.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// The set of applications entitled to run.
    #[must_use]
    pub fn applications(&self) -> &BTreeSet<String> {
        &self.applications
    }

    /// The IP addresses of the entitled machine.
    #[must_use]
    pub fn ip_addresses(&self) -> &BTreeSet<IpAddr> {
        &self.ip_addresses
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn with_methods_leave_original_untouched() {
        let original = TokenProperties::default();
        let modified = original.clone().with_virtual_machine_id("vm-42");
        assert_eq!(original.virtual_machine_id(), "");
        assert_eq!(modified.virtual_machine_id(), "vm-42");
    }

    #[test]
    fn applications_are_trimmed_and_deduplicated() {
        let properties = TokenProperties::default()
            .with_applications(["  contosoapp ", "contosoapp", "other"]);
        assert_eq!(
            properties.applications().iter().collect::<Vec<_>>(),
            vec!["contosoapp", "other"],
        );
    }

    #[test]
    fn ip_addresses_are_deduplicated() {
        let loopback: IpAddr = "127.0.0.1".parse().unwrap();
        let properties =
            TokenProperties::default().with_ip_addresses([loopback, loopback]);
        assert_eq!(properties.ip_addresses().len(), 1);
    }

    #[test]
    #[should_panic(expected = "expect to have an audience")]
    fn empty_audience_is_a_contract_violation() {
        let _ = TokenProperties::default().with_audience("");
    }

    #[test]
    #[should_panic(expected = "expect to have an issuer")]
    fn empty_issuer_is_a_contract_violation() {
        let _ = TokenProperties::default().with_issuer("");
    }

    #[test]
    fn validity_window_setters_replace_independently() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let finish = Utc.with_ymd_and_hms(2026, 1, 8, 0, 0, 0).unwrap();
        let properties = TokenProperties::default()
            .from_instant(start)
            .until_instant(finish);
        assert_eq!(properties.not_before(), start);
        assert_eq!(properties.not_after(), finish);
    }
}
