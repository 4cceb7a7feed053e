//! Token properties sourced from command-line options.
//!
//! Anything the user does not supply falls back to a sensible default:
//! the validity window starts now and runs for seven days, the machine's
//! own network addresses stand in for `--address`, and a fresh
//! `entitlement-<uuid>` identifier is minted. Only applications have no
//! default; a token that entitles nothing is never useful.

use chrono::{DateTime, Duration, Utc};
use std::net::IpAddr;
use tracing::debug;
use uuid::Uuid;

use common::timestamp::parse_timestamp;
use common::validated::reduce;
use common::Validated;
use entitlements::claims;
use entitlements::PropertySource;

use crate::commands::generate::GenerateArgs;

/// Default validity window length when `--not-after` is omitted.
const DEFAULT_LIFETIME_DAYS: i64 = 7;

pub struct CommandLineSource {
    now: DateTime<Utc>,
    not_before: Option<String>,
    not_after: Option<String>,
    audience: Option<String>,
    issuer: Option<String>,
    applications: Vec<String>,
    addresses: Vec<String>,
    virtual_machine_id: Option<String>,
    token_id: String,
}

impl CommandLineSource {
    /// Capture the arguments and a single `now`, so every defaulted
    /// field is derived from the same instant.
    #[must_use]
    pub fn new(args: &GenerateArgs) -> Self {
        CommandLineSource {
            now: Utc::now(),
            not_before: args.not_before.clone(),
            not_after: args.not_after.clone(),
            audience: args.audience.clone(),
            issuer: args.issuer.clone(),
            applications: args.applications.clone(),
            addresses: args.addresses.clone(),
            virtual_machine_id: args.virtual_machine_id.clone(),
            token_id: args
                .token_id
                .clone()
                .unwrap_or_else(|| format!("entitlement-{}", Uuid::new_v4())),
        }
    }
}

impl PropertySource for CommandLineSource {
    fn not_before(&self) -> Validated<DateTime<Utc>> {
        match &self.not_before {
            Some(value) => parse_timestamp(value, "not-before"),
            None => Validated::ok(self.now),
        }
    }

    fn not_after(&self) -> Validated<DateTime<Utc>> {
        match &self.not_after {
            Some(value) => parse_timestamp(value, "not-after"),
            None => Validated::ok(self.now + Duration::days(DEFAULT_LIFETIME_DAYS)),
        }
    }

    fn issued_at(&self) -> Validated<DateTime<Utc>> {
        Validated::ok(self.now)
    }

    // An absent or empty --audience/--issuer means "use the self-signed
    // default"; the claims model's non-empty contract only ever sees a
    // real value.
    fn audience(&self) -> Validated<String> {
        Validated::ok(non_empty_or(
            self.audience.as_deref(),
            claims::DEFAULT_AUDIENCE,
        ))
    }

    fn issuer(&self) -> Validated<String> {
        Validated::ok(non_empty_or(self.issuer.as_deref(), claims::DEFAULT_ISSUER))
    }

    fn application_ids(&self) -> Validated<Vec<String>> {
        if self.applications.is_empty() {
            Validated::fail("No applications specified.")
        } else {
            Validated::ok(self.applications.clone())
        }
    }

    fn ip_addresses(&self) -> Validated<Vec<IpAddr>> {
        if self.addresses.is_empty() {
            return local_addresses();
        }
        reduce(self.addresses.iter().map(|value| {
            match value.parse::<IpAddr>() {
                Ok(address) => Validated::ok(address),
                Err(_) => Validated::fail(format!(
                    "IP address '{value}' is not in an expected format (IPv4 and IPv6 supported)."
                )),
            }
        }))
    }

    fn virtual_machine_id(&self) -> Validated<String> {
        Validated::ok(self.virtual_machine_id.clone().unwrap_or_default())
    }

    fn token_id(&self) -> Validated<String> {
        Validated::ok(self.token_id.clone())
    }
}

fn non_empty_or(value: Option<&str>, default: &str) -> String {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => default.to_string(),
    }
}

/// All addresses of the local interfaces, for binding a token to the
/// machine it was generated on.
fn local_addresses() -> Validated<Vec<IpAddr>> {
    match if_addrs::get_if_addrs() {
        Ok(interfaces) => {
            let addresses: Vec<IpAddr> = interfaces.into_iter().map(|i| i.ip()).collect();
            debug!(target: "cli", ?addresses, "using local machine addresses");
            Validated::ok(addresses)
        }
        Err(e) => Validated::fail(format!("Unable to enumerate local network addresses ({e})")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args() -> GenerateArgs {
        GenerateArgs {
            applications: vec!["contosoapp".to_string()],
            addresses: vec!["127.0.0.1".to_string()],
            virtual_machine_id: None,
            not_before: None,
            not_after: None,
            audience: None,
            issuer: None,
            token_id: None,
            sign_key: None,
            encrypt_key: None,
            output: None,
        }
    }

    #[test]
    fn window_defaults_to_seven_days_from_now() {
        let source = CommandLineSource::new(&args());
        let from = source.not_before().into_result().unwrap();
        let until = source.not_after().into_result().unwrap();
        assert_eq!(until - from, Duration::days(DEFAULT_LIFETIME_DAYS));
        assert_eq!(source.issued_at().into_result().unwrap(), from);
    }

    #[test]
    fn explicit_window_is_parsed() {
        let mut args = args();
        args.not_before = Some("09:00 1-Jun-2026".to_string());
        args.not_after = Some("09:00 8-Jun-2026".to_string());
        let source = CommandLineSource::new(&args);
        let from = source.not_before().into_result().unwrap();
        let until = source.not_after().into_result().unwrap();
        assert_eq!(until - from, Duration::days(7));
    }

    #[test]
    fn unparseable_timestamp_names_the_option() {
        let mut args = args();
        args.not_before = Some("next tuesday".to_string());
        let errors = CommandLineSource::new(&args)
            .not_before()
            .into_result()
            .unwrap_err();
        assert!(errors.any_contains("not-before"));
        assert!(errors.any_contains("next tuesday"));
    }

    #[test]
    fn empty_audience_and_issuer_fall_back_to_the_defaults() {
        let mut args = args();
        args.audience = Some(String::new());
        args.issuer = Some("   ".to_string());
        let source = CommandLineSource::new(&args);
        assert_eq!(
            source.audience().into_result().unwrap(),
            claims::DEFAULT_AUDIENCE
        );
        assert_eq!(
            source.issuer().into_result().unwrap(),
            claims::DEFAULT_ISSUER
        );

        // The full build must come back as a validation outcome, never
        // trip the claim model's non-empty contract.
        let properties = entitlements::TokenProperties::build(&source)
            .into_result()
            .unwrap();
        assert_eq!(properties.audience(), claims::DEFAULT_AUDIENCE);
        assert_eq!(properties.issuer(), claims::DEFAULT_ISSUER);
    }

    #[test]
    fn missing_applications_are_reported() {
        let mut args = args();
        args.applications.clear();
        let errors = CommandLineSource::new(&args)
            .application_ids()
            .into_result()
            .unwrap_err();
        assert!(errors.any_contains("No applications specified."));
    }

    #[test]
    fn malformed_addresses_are_reported_individually() {
        let mut args = args();
        args.addresses = vec!["not-an-address".to_string(), "10.0.0.1".to_string()];
        let errors = CommandLineSource::new(&args)
            .ip_addresses()
            .into_result()
            .unwrap_err();
        assert!(errors.any_contains(
            "IP address 'not-an-address' is not in an expected format (IPv4 and IPv6 supported)."
        ));
    }

    #[test]
    fn token_id_defaults_to_a_fresh_entitlement_id() {
        let source = CommandLineSource::new(&args());
        let id = source.token_id().into_result().unwrap();
        assert!(id.starts_with("entitlement-"));
        // Stable across repeated reads of the same source.
        assert_eq!(source.token_id().into_result().unwrap(), id);
    }
}
