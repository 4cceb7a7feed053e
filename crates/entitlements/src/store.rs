//! In-memory record of entitlement lifecycle events.
//!
//! Each entitlement accumulates an acquisition event, any number of
//! renewals, and at most one release. Updates use optimistic
//! concurrency: callers read a versioned snapshot, derive the new
//! state, and the write succeeds only if nothing changed in between.
//! A lost race is reported, not retried; the caller decides whether to
//! go again.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

use common::Validated;

/// The recorded lifecycle of one entitlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementProperties {
    entitlement_id: String,
    acquisition_time: DateTime<Utc>,
    renewals: Vec<DateTime<Utc>>,
    release_time: Option<DateTime<Utc>>,
}

impl EntitlementProperties {
    /// A freshly-acquired entitlement with no further events.
    #[must_use]
    pub fn new(entitlement_id: impl Into<String>, acquisition_time: DateTime<Utc>) -> Self {
        EntitlementProperties {
            entitlement_id: entitlement_id.into(),
            acquisition_time,
            renewals: Vec::new(),
            release_time: None,
        }
    }

    /// A copy with one more renewal recorded.
    #[must_use]
    pub fn with_renewal(mut self, renewal_time: DateTime<Utc>) -> Self {
        self.renewals.push(renewal_time);
        self
    }

    /// A copy marked released.
    #[must_use]
    pub fn with_release(mut self, release_time: DateTime<Utc>) -> Self {
        self.release_time = Some(release_time);
        self
    }

    #[must_use]
    pub fn entitlement_id(&self) -> &str {
        &self.entitlement_id
    }

    #[must_use]
    pub fn acquisition_time(&self) -> DateTime<Utc> {
        self.acquisition_time
    }

    #[must_use]
    pub fn renewals(&self) -> &[DateTime<Utc>] {
        &self.renewals
    }

    /// The most recent renewal, or the acquisition if never renewed.
    #[must_use]
    pub fn last_renewal(&self) -> DateTime<Utc> {
        self.renewals
            .last()
            .copied()
            .unwrap_or(self.acquisition_time)
    }

    #[must_use]
    pub fn release_time(&self) -> Option<DateTime<Utc>> {
        self.release_time
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.release_time.is_some()
    }
}

#[derive(Debug, Clone)]
struct Versioned {
    version: u64,
    properties: EntitlementProperties,
}

/// Thread-safe in-memory store of entitlement lifecycle records.
#[derive(Debug, Default)]
pub struct EntitlementStore {
    entries: RwLock<HashMap<String, Versioned>>,
}

impl EntitlementStore {
    #[must_use]
    pub fn new() -> Self {
        EntitlementStore::default()
    }

    /// Record the acquisition of a new entitlement.
    pub fn add(&self, properties: EntitlementProperties) -> Validated<EntitlementProperties> {
        let id = properties.entitlement_id().to_string();
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(_) => return Validated::fail(format!("Unable to store entitlement {id}")),
        };
        if entries.contains_key(&id) {
            return Validated::fail(format!("Unable to store entitlement {id}"));
        }
        debug!(target: "entitlements.store", entitlement_id = %id, "entitlement stored");
        entries.insert(
            id,
            Versioned {
                version: 1,
                properties: properties.clone(),
            },
        );
        Validated::ok(properties)
    }

    /// Look up an entitlement by id.
    pub fn find(&self, entitlement_id: &str) -> Validated<EntitlementProperties> {
        match self.snapshot(entitlement_id) {
            Some(entry) => Validated::ok(entry.properties),
            None => Validated::fail(format!("Entitlement {entitlement_id} not found")),
        }
    }

    /// Record a renewal event.
    ///
    /// Fails for an unknown or released entitlement, and for a write
    /// that lost a race with a concurrent update.
    pub fn renew(
        &self,
        entitlement_id: &str,
        renewal_time: DateTime<Utc>,
    ) -> Validated<EntitlementProperties> {
        let Some(entry) = self.snapshot(entitlement_id) else {
            return Validated::fail(format!("Entitlement {entitlement_id} not found"));
        };
        if entry.properties.is_released() {
            return Validated::fail(format!("Entitlement {entitlement_id} is already released"));
        }

        let updated = entry.properties.with_renewal(renewal_time);
        if self.try_replace(entitlement_id, entry.version, updated.clone()) {
            debug!(
                target: "entitlements.store",
                entitlement_id,
                renewals = updated.renewals().len(),
                "renewal stored"
            );
            Validated::ok(updated)
        } else {
            Validated::fail(format!(
                "Unable to store renewal event for entitlement {entitlement_id}"
            ))
        }
    }

    /// Record the release of an entitlement.
    ///
    /// Fails for an unknown or already-released entitlement, and for a
    /// write that lost a race with a concurrent update.
    pub fn release(
        &self,
        entitlement_id: &str,
        release_time: DateTime<Utc>,
    ) -> Validated<EntitlementProperties> {
        let Some(entry) = self.snapshot(entitlement_id) else {
            return Validated::fail(format!("Entitlement {entitlement_id} not found"));
        };
        if entry.properties.is_released() {
            return Validated::fail(format!("Entitlement {entitlement_id} is already released"));
        }

        let updated = entry.properties.with_release(release_time);
        if self.try_replace(entitlement_id, entry.version, updated.clone()) {
            debug!(target: "entitlements.store", entitlement_id, "release stored");
            Validated::ok(updated)
        } else {
            Validated::fail(format!(
                "Unable to store release event for entitlement {entitlement_id}"
            ))
        }
    }

    fn snapshot(&self, entitlement_id: &str) -> Option<Versioned> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(entitlement_id).cloned())
    }

    // Compare-and-swap on the entry version.
    fn try_replace(
        &self,
        entitlement_id: &str,
        expected_version: u64,
        properties: EntitlementProperties,
    ) -> bool {
        let Ok(mut entries) = self.entries.write() else {
            return false;
        };
        match entries.get_mut(entitlement_id) {
            Some(entry) if entry.version == expected_version => {
                entry.version += 1;
                entry.properties = properties;
                true
            }
            _ => false,
        }
    }
}
