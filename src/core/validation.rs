//! Validation utilities for names and limits
//!
//! Namespaces, queue names and consumer identities become segments of
//! dot-joined store keys, so they are checked before they ever reach the store.

/// Separator between key segments
pub const KEY_SEPARATOR: char = '.';

/// Characters with special meaning in store key patterns (Redis `KEYS`, glob)
pub const PATTERN_METACHARACTERS: &[char] = &['*', '?', '[', ']', '\\'];

/// Longest accepted message time-to-live, roughly 136 years
pub const MAX_TTL_SECS: u64 = u32::MAX as u64;

/// Validate a single key segment (namespace, queue name or consumer identity)
///
/// A segment must be non-empty and must not contain the key separator or
/// whitespace; either would let two different (queue, identity) pairs map to
/// the same store key.
pub fn validate_key_segment(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("cannot be empty".to_string());
    }

    if value.contains(KEY_SEPARATOR) {
        return Err(format!(
            "cannot contain the key separator '{}'",
            KEY_SEPARATOR
        ));
    }

    if value.chars().any(char::is_whitespace) {
        return Err("cannot contain whitespace".to_string());
    }

    Ok(())
}

/// Validate a namespace
///
/// On top of the key segment rules, a namespace is used verbatim in the
/// pattern that enumerates its keys, so pattern metacharacters are refused.
pub fn validate_namespace(value: &str) -> Result<(), String> {
    validate_key_segment(value)?;

    if let Some(c) = value.chars().find(|c| PATTERN_METACHARACTERS.contains(c)) {
        return Err(format!("cannot contain the pattern character '{}'", c));
    }

    Ok(())
}

/// Validate a message time-to-live in seconds
pub fn validate_ttl_secs(ttl_secs: u64) -> Result<u64, String> {
    match ttl_secs {
        0 => Err("TTL must be at least 1 second".to_string()),
        n if n > MAX_TTL_SECS => Err(format!("TTL must be at most {} seconds", MAX_TTL_SECS)),
        n => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_segments() {
        for name in ["orders", "fulfillment-1", "inv_2", "ÜberQueue", "a:b"] {
            assert!(validate_key_segment(name).is_ok(), "{} should be valid", name);
        }
    }

    #[test]
    fn test_invalid_segments() {
        assert_eq!(validate_key_segment(""), Err("cannot be empty".to_string()));
        assert!(validate_key_segment("orders.eu")
            .unwrap_err()
            .contains("separator"));
        assert!(validate_key_segment("my queue")
            .unwrap_err()
            .contains("whitespace"));
        assert!(validate_key_segment("tab\there").is_err());
    }

    #[test]
    fn test_ttl_validation() {
        assert_eq!(validate_ttl_secs(3600), Ok(3600));
        assert_eq!(validate_ttl_secs(1), Ok(1));
        assert!(validate_ttl_secs(0).is_err());
        assert_eq!(validate_ttl_secs(MAX_TTL_SECS), Ok(MAX_TTL_SECS));
        assert_eq!(
            validate_ttl_secs(MAX_TTL_SECS + 1),
            Err("TTL must be at most 4294967295 seconds".to_string())
        );
        assert!(validate_ttl_secs(u64::MAX).is_err());
    }

    #[test]
    fn test_namespace_validation() {
        for name in ["shop", "a:b", "tenant-{7}", "ns_1"] {
            assert!(validate_namespace(name).is_ok(), "{} should be valid", name);
        }
        for name in ["ns[", "ns]", "ns*", "n?s", "ns\\x"] {
            assert!(
                validate_namespace(name).unwrap_err().contains("pattern character"),
                "{} should be rejected",
                name
            );
        }
        // Segment rules still apply first
        assert_eq!(validate_namespace(""), Err("cannot be empty".to_string()));

        // Queue names and identities may use them; they never reach a pattern
        assert!(validate_key_segment("jobs[eu]").is_ok());
    }
}
