//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Handles
// =============================================================================

/// Minimum username length
pub const MIN_USERNAME_LENGTH: usize = 1;

/// Maximum username length
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Usernames that collide with mention keywords
pub const RESERVED_USERNAMES: &[&str] = &["everyone", "here"];

/// Discriminators are rendered as fixed-width numeric strings
pub const DISCRIMINATOR_WIDTH: usize = 4;

/// Lowest assignable discriminator value
pub const MIN_DISCRIMINATOR: u16 = 1;

/// Highest assignable discriminator value
pub const MAX_DISCRIMINATOR: u16 = 9999;

// =============================================================================
// Profile
// =============================================================================

/// Maximum display name length
pub const MAX_DISPLAY_NAME_LENGTH: usize = 32;

/// Maximum length for bio and about-me text
pub const MAX_BIO_LENGTH: usize = 190;

/// Maximum length for a custom presence status
pub const MAX_CUSTOM_STATUS_LENGTH: usize = 128;

/// Locale assigned when registration omits one
pub const DEFAULT_LOCALE: &str = "en-US";

/// Minimum age (in years) required to register
pub const MIN_ACCOUNT_AGE_YEARS: u32 = 13;

// =============================================================================
// Credentials
// =============================================================================

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length accepted before hashing
pub const MAX_PASSWORD_LENGTH: usize = 128;
