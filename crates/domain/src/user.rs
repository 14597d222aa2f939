//! User domain types and validation rules.
//!
//! Follows the OWASP Authentication and Password Storage cheat sheets for
//! password strength and email validation rules.

use leadflow_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one `@`,
    /// local part and domain are non-empty, domain contains at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let parts: Vec<&str> = trimmed.splitn(2, '@').collect();
        if parts.len() != 2 {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        let local = parts[0];
        let domain = parts[1];

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Minimum username length.
pub const USERNAME_MIN_LENGTH: usize = 3;

/// Maximum username length.
pub const USERNAME_MAX_LENGTH: usize = 32;

/// Validated login name: lowercase alphanumerics plus `.`, `_` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// Creates a validated username.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        let char_count = trimmed.chars().count();
        if char_count < USERNAME_MIN_LENGTH {
            return Err(AppError::Validation(format!(
                "username must be at least {USERNAME_MIN_LENGTH} characters"
            )));
        }

        if char_count > USERNAME_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "username must not exceed {USERNAME_MAX_LENGTH} characters"
            )));
        }

        let valid = trimmed
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'));
        if !valid {
            return Err(AppError::Validation(
                "username may only contain letters, digits, '.', '_' and '-'".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated username string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

/// Minimum password length (NIST SP800-63B, no second factor).
pub const PASSWORD_MIN_LENGTH: usize = 10;

/// Maximum password length to allow passphrases (OWASP recommendation: at least 64).
pub const PASSWORD_MAX_LENGTH: usize = 128;

/// Validates a plaintext password against OWASP and NIST rules.
///
/// - Length between 10 and 128 characters.
/// - Rejects common breached passwords from an embedded list.
pub fn validate_password(password: &str) -> AppResult<()> {
    let char_count = password.chars().count();

    if char_count < PASSWORD_MIN_LENGTH {
        return Err(AppError::Validation(format!(
            "password must be at least {PASSWORD_MIN_LENGTH} characters"
        )));
    }

    if char_count > PASSWORD_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "password must not exceed {PASSWORD_MAX_LENGTH} characters"
        )));
    }

    if is_common_password(password) {
        return Err(AppError::Validation(
            "this password is too common and has appeared in data breaches".to_owned(),
        ));
    }

    Ok(())
}

/// Checks whether a password appears in the embedded common passwords list.
fn is_common_password(password: &str) -> bool {
    let lowered = password.to_lowercase();
    COMMON_PASSWORDS.iter().any(|entry| *entry == lowered)
}

/// Top breached passwords (subset for fast embedded check).
/// Production deployments should integrate HaveIBeenPwned k-anonymity API.
static COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "password123",
    "1234567890",
    "qwertyuiop",
    "1q2w3e4r5t",
    "iloveyou12",
    "trustno1!!",
    "welcome123",
    "letmein123",
    "sunshine123",
    "princess123",
    "football123",
    "superman123",
    "qwerty12345",
    "admin12345",
    "passw0rd12",
    "changeme123",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_is_accepted_and_lowercased() {
        let email = EmailAddress::new("USER@Example.COM");
        assert!(email.is_ok());
        assert_eq!(
            email.unwrap_or_else(|_| panic!("test")).as_str(),
            "user@example.com"
        );
    }

    #[test]
    fn email_without_at_is_rejected() {
        assert!(EmailAddress::new("noatsign").is_err());
    }

    #[test]
    fn email_without_domain_dot_is_rejected() {
        assert!(EmailAddress::new("user@nodot").is_err());
    }

    #[test]
    fn empty_email_is_rejected() {
        assert!(EmailAddress::new("").is_err());
    }

    #[test]
    fn username_is_normalized_to_lowercase() {
        let username = Username::new("  Alice.Smith ");
        assert_eq!(
            username.unwrap_or_else(|_| panic!("test")).as_str(),
            "alice.smith"
        );
    }

    #[test]
    fn short_username_is_rejected() {
        assert!(Username::new("ab").is_err());
    }

    #[test]
    fn username_with_spaces_is_rejected() {
        assert!(Username::new("alice smith").is_err());
    }

    #[test]
    fn short_password_is_rejected() {
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn adequate_password_is_accepted() {
        assert!(validate_password("a-reasonable-passphrase").is_ok());
    }

    #[test]
    fn common_password_is_rejected() {
        assert!(validate_password("password123").is_err());
    }

    #[test]
    fn very_long_password_is_rejected() {
        let long = "a".repeat(PASSWORD_MAX_LENGTH + 1);
        assert!(validate_password(&long).is_err());
    }

    #[test]
    fn max_length_password_is_accepted() {
        let max = "b".repeat(PASSWORD_MAX_LENGTH);
        assert!(validate_password(&max).is_ok());
    }
}
