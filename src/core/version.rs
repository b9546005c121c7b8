//! Build metadata accessors.
//! Includes the version.rs generated by the build script, providing a single
//! source of truth for the crate version and the store key-schema version.

include!(concat!(env!("OUT_DIR"), "/version.rs"));

/// Version of the store key layout written by this crate
pub fn key_schema_version() -> u32 {
    KEY_SCHEMA_VERSION
}

/// Check that a deployment expecting key schema `expected` can use this build
///
/// Brokers of different schema versions sharing a namespace would misread each
/// other's keys, so any mismatch is refused.
pub fn check_key_schema_version(expected: u32) -> Result<(), String> {
    if expected == KEY_SCHEMA_VERSION {
        Ok(())
    } else {
        Err(format!(
            "deployment uses key schema v{}, this build (reliable-pubsub {}) writes v{}",
            expected, PKG_VERSION, KEY_SCHEMA_VERSION
        ))
    }
}

pub fn crate_version() -> &'static str {
    PKG_VERSION
}

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script, `unknown` outside a checkout
pub fn git_hash() -> &'static str {
    GIT_HASH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_metadata_present() {
        assert_eq!(key_schema_version(), 1);
        assert_eq!(crate_version(), env!("CARGO_PKG_VERSION"));
        assert!(build_time().ends_with("UTC"));
        assert!(!git_hash().is_empty());
    }

    #[test]
    fn test_key_schema_check() {
        assert!(check_key_schema_version(key_schema_version()).is_ok());

        let err = check_key_schema_version(key_schema_version() + 1).unwrap_err();
        assert!(err.contains("key schema v2"));
        assert!(err.contains("writes v1"));
    }
}
