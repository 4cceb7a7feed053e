//! Names of the claims carried in an entitlement token.

/// Claim holding an entitled application id (repeatable).
pub const APPLICATION: &str = "app";

/// Claim holding an authorized IP address (repeatable).
pub const IP_ADDRESS: &str = "ip";

/// Claim holding the entitled virtual machine identifier.
pub const VIRTUAL_MACHINE_ID: &str = "vmid";

/// Claim holding the unique token identifier.
pub const TOKEN_ID: &str = "id";

/// The default audience for an entitlement token (essentially we
/// self-sign; in production the audience is the account the token is
/// issued for).
pub const DEFAULT_AUDIENCE: &str = "https://entitlements.test/software-entitlement";

/// The default issuer of an entitlement token.
pub const DEFAULT_ISSUER: &str = "https://entitlements.test/software-entitlement";
