use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// 去除首尾空白并转小写
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 校验并返回规范化后的邮箱
pub fn validate_email(email: &str) -> AppResult<String> {
    let normalized = normalize_email(email);
    if normalized.len() > 254 || !EMAIL_REGEX.is_match(&normalized) {
        return Err(AppError::ValidationError(
            "Invalid email address".to_string(),
        ));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Fan@Example.COM "), "fan@example.com");
        assert_eq!(normalize_email("a@b.co"), "a@b.co");
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" Fan@Example.com").unwrap(), "fan@example.com");
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("two@@example.com").is_err());
        assert!(validate_email("spaces in@example.com").is_err());
        assert!(validate_email("missing@tld").is_err());
    }
}
