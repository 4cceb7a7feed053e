//! Certificate thumbprints as a semantic type.
//!
//! Thumbprints arrive from humans who copied them out of certificate
//! tooling, complete with spaces, separators and the occasional invisible
//! directionality marker. `Thumbprint` sanitizes on construction (keeping
//! only ASCII alphanumerics, uppercased) so equality is insensitive to
//! case, whitespace and separators, and sanitizing twice is a no-op.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A sanitized certificate thumbprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Thumbprint {
    canonical: String,
}

/// Errors constructing a [`Thumbprint`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ThumbprintError {
    /// The input contained no alphanumeric characters at all.
    #[error("No thumbprint specified")]
    Empty,
}

impl Thumbprint {
    /// Reduce a candidate thumbprint to its canonical form: ASCII
    /// alphanumerics only, uppercased.
    #[must_use]
    pub fn sanitize(raw: &str) -> String {
        raw.chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_uppercase())
            .collect()
    }

    /// Does this thumbprint match the given string, ignoring formatting?
    #[must_use]
    pub fn matches(&self, raw: &str) -> bool {
        self.canonical == Self::sanitize(raw)
    }
}

impl FromStr for Thumbprint {
    type Err = ThumbprintError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let canonical = Self::sanitize(raw);
        if canonical.is_empty() {
            return Err(ThumbprintError::Empty);
        }
        Ok(Thumbprint { canonical })
    }
}

impl fmt::Display for Thumbprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_whitespace_and_separators() {
        assert_eq!(Thumbprint::sanitize("e0 00:bf-ae"), "E000BFAE");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let once = Thumbprint::sanitize("e0 00 bf ae");
        let twice = Thumbprint::sanitize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn equality_ignores_case_and_formatting() {
        let spaced: Thumbprint = "e0 00 bf ae".parse().unwrap();
        let compact: Thumbprint = "E000BFAE".parse().unwrap();
        assert_eq!(spaced, compact);
    }

    #[test]
    fn matches_ignores_formatting() {
        let thumbprint: Thumbprint = "E000BFAE".parse().unwrap();
        assert!(thumbprint.matches("e0 00 bf ae"));
        assert!(!thumbprint.matches("deadbeef"));
    }

    #[test]
    fn rejects_input_with_no_alphanumerics() {
        assert_eq!(
            "  --  ".parse::<Thumbprint>(),
            Err(ThumbprintError::Empty)
        );
    }

    #[test]
    fn strips_invisible_markers() {
        // Left-to-right mark ahead of a pasted thumbprint.
        let pasted = format!("\u{200e}{}", "E000BFAE");
        let thumbprint: Thumbprint = pasted.parse().unwrap();
        assert_eq!(thumbprint.to_string(), "E000BFAE");
    }
}
