//! User field validation

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::entity::Gender;

/// Errors reported by user validation, one per validated field
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum UserValidationError {
    #[error("invalid first name")]
    InvalidFirstName,

    #[error("invalid last name")]
    InvalidLastName,

    #[error("invalid gender")]
    InvalidGender,

    #[error("invalid date of birth")]
    InvalidDateOfBirth,

    #[error("invalid phone number")]
    InvalidPhoneNumber,

    #[error("invalid email")]
    InvalidEmail,
}

impl UserValidationError {
    /// Field name the error refers to
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidFirstName => "first_name",
            Self::InvalidLastName => "last_name",
            Self::InvalidGender => "gender",
            Self::InvalidDateOfBirth => "date_of_birth",
            Self::InvalidPhoneNumber => "phone_number",
            Self::InvalidEmail => "email",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFirstName => "invalid_first_name",
            Self::InvalidLastName => "invalid_last_name",
            Self::InvalidGender => "invalid_gender",
            Self::InvalidDateOfBirth => "invalid_date_of_birth",
            Self::InvalidPhoneNumber => "invalid_phone_number",
            Self::InvalidEmail => "invalid_email",
        }
    }
}

pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_NAME_LENGTH: usize = 50;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

/// E.164: `+`, a non-zero digit, then 1 to 14 more digits
static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+[1-9][0-9]{1,14}$").unwrap());

/// Validate an email address
///
/// Rules:
/// - Cannot be empty
/// - Maximum 254 characters
/// - `local@domain.tld` shape with a TLD of at least two letters
pub fn validate_email(email: &str) -> bool {
    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
        return false;
    }

    EMAIL_PATTERN.is_match(email)
}

/// Validate an E.164 phone number
pub fn validate_phone_number(phone: &str) -> bool {
    !phone.is_empty() && PHONE_PATTERN.is_match(phone)
}

/// Validate a first name (2 to 50 characters)
pub fn validate_first_name(first_name: &str) -> bool {
    validate_name(first_name)
}

/// Validate a last name (2 to 50 characters)
pub fn validate_last_name(last_name: &str) -> bool {
    validate_name(last_name)
}

fn validate_name(name: &str) -> bool {
    let length = name.chars().count();
    (MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&length)
}

/// Validate a gender value; case-sensitive
pub fn validate_gender(gender: &str) -> bool {
    gender.parse::<Gender>().is_ok()
}

/// A date of birth must be set and must not lie in the future
pub fn validate_date_of_birth(date_of_birth: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    matches!(date_of_birth, Some(dob) if dob <= now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_valid_emails() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("user@mail.example.com"));
        assert!(validate_email("user123@example.com"));
        assert!(validate_email("user+tag@example.com"));
        assert!(validate_email("first.last_name%x@sub-domain.example.org"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!validate_email(""));
        assert!(!validate_email("userexample.com"));
        assert!(!validate_email("user@"));
        assert!(!validate_email("user @example.com"));
        assert!(!validate_email("user@example.c"));
        assert!(!validate_email("user@example.c0m"));
    }

    #[test]
    fn test_email_too_long() {
        let local = "a".repeat(250);
        let email = format!("{}@example.com", local);
        assert!(email.len() > MAX_EMAIL_LENGTH);
        assert!(!validate_email(&email));
    }

    #[test]
    fn test_valid_phone_numbers() {
        assert!(validate_phone_number("+12015550123"));
        assert!(validate_phone_number("+919876543210"));
        assert!(validate_phone_number("+447911123456"));
        assert!(validate_phone_number("+12"));
        assert!(validate_phone_number("+123456789012345"));
    }

    #[test]
    fn test_invalid_phone_numbers() {
        assert!(!validate_phone_number(""));
        assert!(!validate_phone_number("12015550123"));
        assert!(!validate_phone_number("+1 201 555 0123"));
        assert!(!validate_phone_number("+1"));
        assert!(!validate_phone_number("+01234567890"));
        assert!(!validate_phone_number("+1201555ABCD"));
        assert!(!validate_phone_number("+1234567890123456"));
    }

    #[test]
    fn test_name_length_bounds() {
        assert!(!validate_first_name(""));
        assert!(!validate_first_name("J"));
        assert!(validate_first_name("Jo"));
        assert!(validate_first_name(&"a".repeat(50)));
        assert!(!validate_first_name(&"a".repeat(51)));

        assert!(!validate_last_name("D"));
        assert!(validate_last_name("Doe"));
    }

    #[test]
    fn test_name_length_counts_characters() {
        assert!(validate_first_name("Zoë"));
        assert!(validate_last_name(&"é".repeat(50)));
    }

    #[test]
    fn test_gender() {
        assert!(validate_gender("male"));
        assert!(validate_gender("female"));
        assert!(validate_gender("other"));
        assert!(!validate_gender("Male"));
        assert!(!validate_gender(""));
        assert!(!validate_gender("unknown"));
    }

    #[test]
    fn test_date_of_birth() {
        let now = Utc::now();

        assert!(validate_date_of_birth(Some(now - Duration::days(365 * 30)), now));
        assert!(validate_date_of_birth(Some(now), now));
        assert!(!validate_date_of_birth(Some(now + Duration::days(1)), now));
        assert!(!validate_date_of_birth(None, now));
    }

    #[test]
    fn test_error_field_and_code() {
        assert_eq!(UserValidationError::InvalidFirstName.field(), "first_name");
        assert_eq!(UserValidationError::InvalidEmail.code(), "invalid_email");
        assert_eq!(
            UserValidationError::InvalidPhoneNumber.to_string(),
            "invalid phone number"
        );
    }
}
