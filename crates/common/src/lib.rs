//! Foundations shared across the entitlement components.

#![warn(clippy::pedantic)]

/// Module for the accumulating validation result type
pub mod validated;

/// Module for deduplicating sets of error messages
pub mod error_set;

/// Module for human-facing timestamp parsing and formatting
pub mod timestamp;

/// Module for certificate thumbprints
pub mod thumbprint;

/// Module for the certificate store collaborator
pub mod certificates;

pub use error_set::ErrorSet;
pub use validated::{Combine, Validated};
