//! Where the values of a token's properties come from.
//!
//! A [`PropertySource`] supplies each claim field individually, each
//! wrapped in [`Validated`] so that the builder can run every extraction
//! and report all the failures together. Implementations exist for
//! command-line input (with defaults) and for the claim set of a decoded
//! token; the builder neither knows nor cares which.

use chrono::{DateTime, Utc};
use common::Validated;
use std::net::IpAddr;

/// A source of individually-fallible token property values.
pub trait PropertySource {
    /// The earliest instant at which the token is active.
    fn not_before(&self) -> Validated<DateTime<Utc>>;

    /// The latest instant at which the token is active.
    fn not_after(&self) -> Validated<DateTime<Utc>>;

    /// The instant at which the token is issued.
    fn issued_at(&self) -> Validated<DateTime<Utc>>;

    /// The audience for whom the token is intended.
    fn audience(&self) -> Validated<String>;

    /// The issuer who hands out entitlement tokens.
    fn issuer(&self) -> Validated<String>;

    /// The ids of the applications entitled to run.
    fn application_ids(&self) -> Validated<Vec<String>>;

    /// The IP addresses of the entitled machine.
    fn ip_addresses(&self) -> Validated<Vec<IpAddr>>;

    /// The virtual machine id of the entitled machine (may be empty).
    fn virtual_machine_id(&self) -> Validated<String>;

    /// The unique identifier for the token.
    fn token_id(&self) -> Validated<String>;
}
