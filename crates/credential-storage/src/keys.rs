//! Storage key constants.

/// Storage keys for the credential pair.
pub struct StorageKeys;

impl StorageKeys {
    /// Access credential (bearer token)
    pub const ACCESS_TOKEN: &'static str = "access_token";

    /// Refresh credential
    pub const REFRESH_TOKEN: &'static str = "refresh_token";
}
