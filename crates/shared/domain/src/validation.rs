//! Field validation and normalization for identity records.
//!
//! Every check runs before the directory touches storage, so invalid input
//! never produces index rows.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::constants::{
    DISCRIMINATOR_WIDTH, MAX_BIO_LENGTH, MAX_CUSTOM_STATUS_LENGTH, MAX_DISCRIMINATOR,
    MAX_DISPLAY_NAME_LENGTH, MAX_USERNAME_LENGTH, MIN_ACCOUNT_AGE_YEARS, MIN_DISCRIMINATOR,
    MIN_USERNAME_LENGTH, RESERVED_USERNAMES,
};
use crate::error::{DomainError, DomainResult};

const MAX_EMAIL_LENGTH: usize = 254;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("static email pattern"))
}

fn locale_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z]{2}-[A-Z]{2}$").expect("static locale pattern"))
}

fn accent_color_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("static color pattern"))
}

/// Trim and lowercase an email address.
///
/// Index keys are always the normalized form, so `A@X.com` and `a@x.com`
/// claim the same row.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Validate an email and return its normalized form.
pub fn validate_email(email: &str) -> DomainResult<String> {
    let normalized = normalize_email(email);
    if normalized.is_empty() {
        return Err(DomainError::validation("The email field is required"));
    }
    if normalized.len() > MAX_EMAIL_LENGTH || !email_pattern().is_match(&normalized) {
        return Err(DomainError::validation(
            "The email that you have provided does not seem to be correct",
        ));
    }
    Ok(normalized)
}

pub fn validate_username(username: &str) -> DomainResult<()> {
    let len = username.chars().count();
    if len < MIN_USERNAME_LENGTH {
        return Err(DomainError::validation("The username cannot be empty"));
    }
    if len > MAX_USERNAME_LENGTH {
        return Err(DomainError::validation(format!(
            "The username cannot be more than {} characters long",
            MAX_USERNAME_LENGTH
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(DomainError::validation(
            "The username should only include letters, numbers and underscores",
        ));
    }
    if RESERVED_USERNAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(username))
    {
        return Err(DomainError::validation(format!(
            "Your username cannot be '{}'",
            username
        )));
    }
    Ok(())
}

/// Validate a discriminator string such as `"0001"`.
pub fn validate_discriminator(discriminator: &str) -> DomainResult<()> {
    parse_discriminator(discriminator).map(|_| ())
}

/// Parse a fixed-width discriminator into its numeric value.
pub fn parse_discriminator(discriminator: &str) -> DomainResult<u16> {
    if discriminator.len() != DISCRIMINATOR_WIDTH
        || !discriminator.chars().all(|c| c.is_ascii_digit())
    {
        return Err(DomainError::validation(format!(
            "The discriminator must be a {}-digit number",
            DISCRIMINATOR_WIDTH
        )));
    }
    let value: u16 = discriminator
        .parse()
        .map_err(|_| DomainError::validation("The discriminator must be a number"))?;
    if !(MIN_DISCRIMINATOR..=MAX_DISCRIMINATOR).contains(&value) {
        return Err(DomainError::validation(format!(
            "The discriminator must be between {:04} and {:04}",
            MIN_DISCRIMINATOR, MAX_DISCRIMINATOR
        )));
    }
    Ok(value)
}

/// Render a numeric discriminator in its fixed-width form.
pub fn format_discriminator(value: u16) -> String {
    format!("{:0width$}", value, width = DISCRIMINATOR_WIDTH)
}

/// Server-assigned discriminator candidates, lowest first.
pub fn discriminator_candidates(limit: usize) -> impl Iterator<Item = String> {
    (MIN_DISCRIMINATOR..=MAX_DISCRIMINATOR)
        .take(limit)
        .map(format_discriminator)
}

pub fn validate_locale(locale: &str) -> DomainResult<()> {
    if !locale_pattern().is_match(locale) {
        return Err(DomainError::validation(
            "The locale should look like 'en-US'",
        ));
    }
    Ok(())
}

pub fn validate_accent_color(color: &str) -> DomainResult<()> {
    if !accent_color_pattern().is_match(color) {
        return Err(DomainError::validation(
            "The accent color should be a hex color such as '#5865F2'",
        ));
    }
    Ok(())
}

pub fn validate_display_name(name: &str) -> DomainResult<()> {
    check_max_len("display name", name, MAX_DISPLAY_NAME_LENGTH)
}

pub fn validate_bio(field: &str, text: &str) -> DomainResult<()> {
    check_max_len(field, text, MAX_BIO_LENGTH)
}

pub fn validate_custom_status(text: &str) -> DomainResult<()> {
    check_max_len("custom status", text, MAX_CUSTOM_STATUS_LENGTH)
}

/// Registration requires a minimum age relative to `today`.
pub fn validate_date_of_birth(dob: NaiveDate, today: NaiveDate) -> DomainResult<()> {
    if dob > today {
        return Err(DomainError::validation(
            "The date of birth cannot be in the future",
        ));
    }
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    if age < MIN_ACCOUNT_AGE_YEARS as i32 {
        return Err(DomainError::validation(format!(
            "You must be at least {} years old to register",
            MIN_ACCOUNT_AGE_YEARS
        )));
    }
    Ok(())
}

fn check_max_len(field: &str, value: &str, max: usize) -> DomainResult<()> {
    if value.chars().count() > max {
        return Err(DomainError::validation(format!(
            "The {} cannot be more than {} characters long",
            field, max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_normalized() {
        assert_eq!(validate_email("  Neo@Matrix.IO ").unwrap(), "neo@matrix.io");
    }

    #[test]
    fn test_email_shape() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("two@@x.com").is_err());
        assert!(validate_email("a@nodot").is_err());
        assert!(validate_email("spa ce@x.com").is_err());
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("neo").is_ok());
        assert!(validate_username("trinity_99").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
        assert!(validate_username(&"a".repeat(32)).is_ok());
        assert!(validate_username("agent smith").is_err());
        assert!(validate_username("Everyone").is_err());
        assert!(validate_username("here").is_err());
    }

    #[test]
    fn test_discriminator_format() {
        assert_eq!(parse_discriminator("0001").unwrap(), 1);
        assert_eq!(parse_discriminator("9999").unwrap(), 9999);
        assert!(validate_discriminator("0000").is_err());
        assert!(validate_discriminator("1").is_err());
        assert!(validate_discriminator("00a1").is_err());
        assert!(validate_discriminator("10000").is_err());
    }

    #[test]
    fn test_candidates_are_ascending_and_bounded() {
        let candidates: Vec<String> = discriminator_candidates(3).collect();
        assert_eq!(candidates, vec!["0001", "0002", "0003"]);
        assert_eq!(discriminator_candidates(usize::MAX).count(), 9999);
    }

    #[test]
    fn test_locale_and_color() {
        assert!(validate_locale("en-US").is_ok());
        assert!(validate_locale("english").is_err());
        assert!(validate_accent_color("#5865F2").is_ok());
        assert!(validate_accent_color("5865F2").is_err());
    }

    #[test]
    fn test_minimum_age() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let thirteen_today = NaiveDate::from_ymd_opt(2011, 6, 15).unwrap();
        let thirteen_tomorrow = NaiveDate::from_ymd_opt(2011, 6, 16).unwrap();

        assert!(validate_date_of_birth(thirteen_today, today).is_ok());
        assert!(validate_date_of_birth(thirteen_tomorrow, today).is_err());
        assert!(validate_date_of_birth(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(), today).is_err());
    }
}
