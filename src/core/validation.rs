//! Validation utilities for configuration values
//!
//! Shared by the CLI argument parser (as clap value parsers) and by the
//! TOML configuration loader.

/// Validate positive integer value
pub fn validate_positive_int(value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err("Value must be greater than 0".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{}' is not a valid positive integer", value)),
    }
}

/// Validate a handler or sink name
pub fn validate_name(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty".to_string());
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(format!("Name '{}' contains control characters", trimmed.escape_default()));
    }
    Ok(trimmed.to_string())
}

/// Validate a duration given in milliseconds (must be positive)
pub fn validate_millis(value: &str) -> Result<u64, String> {
    validate_positive_int(value).map(|n| n as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive_int() {
        assert_eq!(validate_positive_int("42"), Ok(42));
        assert_eq!(validate_positive_int(" 7 "), Ok(7));
        assert!(validate_positive_int("0").unwrap_err().contains("greater than 0"));
        assert!(validate_positive_int("-3").unwrap_err().contains("not a valid"));
        assert!(validate_positive_int("abc").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  audit  "), Ok("audit".to_string()));
        assert!(validate_name("   ").is_err());
        assert!(validate_name("bad\u{7}name").is_err());
    }

    #[test]
    fn test_validate_millis() {
        assert_eq!(validate_millis("50"), Ok(50));
        assert!(validate_millis("0").is_err());
    }
}
