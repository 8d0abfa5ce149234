//! Environment variable parsing helpers shared by the pool and service config.

use std::str::FromStr;

/// Parse an environment variable, falling back to `default` when it is
/// missing or does not parse.
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    parse_env_optional(key).unwrap_or(default)
}

/// Parse an environment variable, returning `None` if missing or invalid.
pub fn parse_env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn test_parse_env_with_default() {
        let result: u32 = parse_env_with_default("ALUMNI_NONEXISTENT_VAR", 42);
        assert_eq!(result, 42);

        std::env::set_var("ALUMNI_TEST_PORT", " 8080 ");
        let result: u16 = parse_env_with_default("ALUMNI_TEST_PORT", 3000);
        assert_eq!(result, 8080);
        std::env::remove_var("ALUMNI_TEST_PORT");
    }

    #[test]
    #[serial_test::serial]
    fn test_parse_env_optional_invalid() {
        std::env::set_var("ALUMNI_TEST_OPT", "abc");
        assert_eq!(parse_env_optional::<u32>("ALUMNI_TEST_OPT"), None);
        std::env::remove_var("ALUMNI_TEST_OPT");
    }
}
