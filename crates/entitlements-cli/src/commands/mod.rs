//! Command implementations.
//!
//! Every command returns a process exit code: 0 for success, 1 when the
//! request was understood but failed validation, 2 for internal or
//! usage errors.

pub mod generate;
pub mod verify;

/// The request succeeded.
pub const EXIT_OK: u8 = 0;

/// The request was well formed but failed validation.
pub const EXIT_VALIDATION_FAILED: u8 = 1;

/// Bad usage or an internal failure.
pub const EXIT_INTERNAL_ERROR: u8 = 2;
