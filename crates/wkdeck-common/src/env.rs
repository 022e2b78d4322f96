//! Typed access to environment variables
//!
//! Unset or blank variables fall back to the supplied default. A variable
//! that is set but cannot be parsed is a configuration error rather than a
//! silent fallback, so a typo in `.env` surfaces before any work starts.

use crate::error::{Result, WkError};
use std::str::FromStr;

/// Read a variable, treating blank values as unset
pub fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a variable or fall back to `default`
pub fn env_or(key: &str, default: &str) -> String {
    env_var(key).unwrap_or_else(|| default.to_string())
}

/// Parse a variable with [`FromStr`], falling back to `default` when unset
pub fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| WkError::config(format!("{key}={raw:?} is invalid: {e}"))),
        None => Ok(default),
    }
}

/// Parse a boolean flag
///
/// Accepts `true/false`, `1/0`, `yes/no` and `on/off` in any case.
pub fn env_flag(key: &str, default: bool) -> Result<bool> {
    match env_var(key) {
        Some(raw) => parse_flag(&raw)
            .ok_or_else(|| WkError::config(format!("{key}={raw:?} is not a boolean"))),
        None => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_flag_variants() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("yes"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("Off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    #[serial]
    fn test_env_parse_falls_back_when_unset() {
        std::env::remove_var("WKDECK_TEST_NUMBER");
        assert_eq!(env_parse("WKDECK_TEST_NUMBER", 7u32).unwrap(), 7);
    }

    #[test]
    #[serial]
    fn test_env_parse_rejects_garbage() {
        std::env::set_var("WKDECK_TEST_NUMBER", "seven");
        let err = env_parse("WKDECK_TEST_NUMBER", 7u32).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("WKDECK_TEST_NUMBER"));
        std::env::remove_var("WKDECK_TEST_NUMBER");
    }

    #[test]
    #[serial]
    fn test_blank_value_counts_as_unset() {
        std::env::set_var("WKDECK_TEST_TEXT", "   ");
        assert_eq!(env_or("WKDECK_TEST_TEXT", "fallback"), "fallback");
        assert!(env_flag("WKDECK_TEST_TEXT", true).unwrap());
        std::env::remove_var("WKDECK_TEST_TEXT");
    }
}
