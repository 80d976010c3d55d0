//! Account entity, its two index projections, and the inputs that create
//! or mutate it.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DEFAULT_LOCALE;
use crate::error::{DomainError, DomainResult};
use crate::flags::UserFlags;
use crate::validation::{
    validate_accent_color, validate_bio, validate_custom_status, validate_date_of_birth,
    validate_discriminator, validate_display_name, validate_email, validate_locale,
    validate_username,
};

// =============================================================================
// Credential
// =============================================================================

/// Opaque secret material produced by the caller's security layer.
///
/// The directory stores it verbatim and never inspects it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordCredential(String);

impl PasswordCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PasswordCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordCredential([REDACTED])")
    }
}

// =============================================================================
// Presence
// =============================================================================

/// Presence status values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Idle,
    Dnd,
    Invisible,
    #[default]
    Offline,
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PresenceStatus::Online => "online",
            PresenceStatus::Idle => "idle",
            PresenceStatus::Dnd => "dnd",
            PresenceStatus::Invisible => "invisible",
            PresenceStatus::Offline => "offline",
        };
        f.write_str(s)
    }
}

/// Presence embedded on the account row for single-read profile fetches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Presence {
    pub online: bool,
    pub status: PresenceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_status: Option<String>,
}

// =============================================================================
// Handle
// =============================================================================

/// The globally unique (username, discriminator) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle {
    pub username: String,
    pub discriminator: String,
}

impl Handle {
    pub fn new(username: impl Into<String>, discriminator: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            discriminator: discriminator.into(),
        }
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.username, self.discriminator)
    }
}

// =============================================================================
// Account
// =============================================================================

/// Canonical account record, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password: PasswordCredential,
    pub username: String,
    pub discriminator: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
    pub bio: Option<String>,
    pub about_me: Option<String>,
    pub accent_color: Option<String>,
    pub locale: String,
    pub is_bot: bool,
    pub is_system: bool,
    #[serde(default)]
    pub bot_owner_ids: BTreeSet<Uuid>,
    pub flags: UserFlags,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub presence: Presence,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Build a fresh account from a validated draft.
    pub fn from_draft(
        id: Uuid,
        draft: AccountDraft,
        discriminator: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email: draft.email,
            password: draft.password,
            username: draft.username,
            discriminator,
            display_name: draft.display_name,
            avatar: None,
            banner: None,
            bio: None,
            about_me: None,
            accent_color: None,
            locale: draft.locale.unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            is_bot: false,
            is_system: false,
            bot_owner_ids: BTreeSet::new(),
            flags: UserFlags::empty(),
            date_of_birth: draft.date_of_birth,
            presence: Presence::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn handle(&self) -> Handle {
        Handle::new(self.username.clone(), self.discriminator.clone())
    }

    pub fn email_index(&self, now: DateTime<Utc>) -> EmailIndexEntry {
        EmailIndexEntry {
            email: self.email.clone(),
            account_id: self.id,
            created_at: now,
        }
    }

    pub fn handle_index(&self, now: DateTime<Utc>) -> HandleIndexEntry {
        HandleIndexEntry {
            handle: self.handle(),
            account_id: self.id,
            created_at: now,
        }
    }

    /// Apply a validated profile patch and refresh `updated_at`.
    pub fn apply_profile(&mut self, patch: ProfilePatch, now: DateTime<Utc>) {
        apply_optional(&mut self.display_name, patch.display_name);
        apply_optional(&mut self.avatar, patch.avatar);
        apply_optional(&mut self.banner, patch.banner);
        apply_optional(&mut self.bio, patch.bio);
        apply_optional(&mut self.about_me, patch.about_me);
        apply_optional(&mut self.accent_color, patch.accent_color);
        if let Some(locale) = patch.locale {
            self.locale = locale;
        }
        if let Some(presence) = patch.presence {
            self.presence = presence;
        }
        if let Some(flags) = patch.flags {
            self.flags = flags;
        }
        self.updated_at = now;
    }
}

/// `Some("")` clears the attribute, `Some(v)` sets it, `None` keeps it.
fn apply_optional(field: &mut Option<String>, update: Option<String>) {
    if let Some(value) = update {
        *field = if value.is_empty() { None } else { Some(value) };
    }
}

// =============================================================================
// Index projections
// =============================================================================

/// `accounts_by_email` row: email → account id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailIndexEntry {
    pub email: String,
    pub account_id: Uuid,
    /// When the row was claimed; used to age dangling rows.
    pub created_at: DateTime<Utc>,
}

/// `accounts_by_handle` row: (username, discriminator) → account id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleIndexEntry {
    pub handle: Handle,
    pub account_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Inputs
// =============================================================================

/// Account creation input.
#[derive(Debug, Clone)]
pub struct AccountDraft {
    pub email: String,
    pub username: String,
    /// `None` lets the directory assign the lowest free discriminator
    pub discriminator: Option<String>,
    pub password: PasswordCredential,
    pub display_name: Option<String>,
    pub date_of_birth: NaiveDate,
    pub locale: Option<String>,
}

impl AccountDraft {
    /// Validate every field and normalize the email.
    pub fn validate(mut self, today: NaiveDate) -> DomainResult<Self> {
        self.email = validate_email(&self.email)?;
        validate_username(&self.username)?;
        if let Some(discriminator) = &self.discriminator {
            validate_discriminator(discriminator)?;
        }
        if self.password.expose().is_empty() {
            return Err(DomainError::validation("A password credential is required"));
        }
        if let Some(name) = &self.display_name {
            validate_display_name(name)?;
        }
        if let Some(locale) = &self.locale {
            validate_locale(locale)?;
        }
        validate_date_of_birth(self.date_of_birth, today)?;
        Ok(self)
    }
}

/// Update of non-identifying attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
    pub bio: Option<String>,
    pub about_me: Option<String>,
    pub accent_color: Option<String>,
    pub locale: Option<String>,
    pub presence: Option<Presence>,
    pub flags: Option<UserFlags>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        *self == ProfilePatch::default()
    }

    pub fn validate(self) -> DomainResult<Self> {
        if self.is_empty() {
            return Err(DomainError::validation("At least one field must be updated"));
        }
        if let Some(name) = non_empty(&self.display_name) {
            validate_display_name(name)?;
        }
        if let Some(bio) = non_empty(&self.bio) {
            validate_bio("bio", bio)?;
        }
        if let Some(about_me) = non_empty(&self.about_me) {
            validate_bio("about me", about_me)?;
        }
        if let Some(color) = non_empty(&self.accent_color) {
            validate_accent_color(color)?;
        }
        if let Some(locale) = &self.locale {
            validate_locale(locale)?;
        }
        if let Some(status) = self
            .presence
            .as_ref()
            .and_then(|p| p.custom_status.as_deref())
        {
            validate_custom_status(status)?;
        }
        Ok(self)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Re-keying request for the unique identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IdentifierChange {
    pub email: Option<String>,
    pub username: Option<String>,
    pub discriminator: Option<String>,
}

impl IdentifierChange {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.username.is_none() && self.discriminator.is_none()
    }

    /// Validate and normalize the email.
    pub fn validate(mut self) -> DomainResult<Self> {
        if self.is_empty() {
            return Err(DomainError::validation(
                "Provide a new email, username or discriminator",
            ));
        }
        if let Some(email) = &self.email {
            self.email = Some(validate_email(email)?);
        }
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        if let Some(discriminator) = &self.discriminator {
            validate_discriminator(discriminator)?;
        }
        Ok(self)
    }

    /// Target identifiers after applying this change to `account`.
    pub fn resolve(&self, account: &Account) -> (String, Handle) {
        let email = self.email.clone().unwrap_or_else(|| account.email.clone());
        let handle = Handle::new(
            self.username.clone().unwrap_or_else(|| account.username.clone()),
            self.discriminator
                .clone()
                .unwrap_or_else(|| account.discriminator.clone()),
        );
        (email, handle)
    }
}

// =============================================================================
// Response
// =============================================================================

/// Public projection of an account (no credential).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AccountResponse {
    /// Unique account identifier
    pub id: Uuid,
    /// Account email address
    pub email: String,
    /// Display handle
    pub username: String,
    /// Four-digit handle suffix
    pub discriminator: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
    pub bio: Option<String>,
    pub about_me: Option<String>,
    pub accent_color: Option<String>,
    pub locale: String,
    pub bot: bool,
    pub system: bool,
    pub bot_owner_ids: Vec<Uuid>,
    /// Badge bitset
    pub flags: UserFlags,
    pub date_of_birth: NaiveDate,
    pub presence: Presence,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            username: account.username,
            discriminator: account.discriminator,
            display_name: account.display_name,
            avatar: account.avatar,
            banner: account.banner,
            bio: account.bio,
            about_me: account.about_me,
            accent_color: account.accent_color,
            locale: account.locale,
            bot: account.is_bot,
            system: account.is_system,
            bot_owner_ids: account.bot_owner_ids.into_iter().collect(),
            flags: account.flags,
            date_of_birth: account.date_of_birth,
            presence: account.presence,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn draft() -> AccountDraft {
        AccountDraft {
            email: "Neo@Matrix.io".to_string(),
            username: "neo".to_string(),
            discriminator: Some("0001".to_string()),
            password: PasswordCredential::new("$argon2id$hash"),
            display_name: Some("Thomas".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 3, 11).unwrap(),
            locale: None,
        }
    }

    fn account() -> Account {
        let draft = draft().validate(today()).unwrap();
        Account::from_draft(Uuid::new_v4(), draft, "0001".to_string(), Utc::now())
    }

    #[test]
    fn test_draft_validation_normalizes_email() {
        let draft = draft().validate(today()).unwrap();
        assert_eq!(draft.email, "neo@matrix.io");
    }

    #[test]
    fn test_draft_rejects_bad_fields() {
        let mut bad = draft();
        bad.discriminator = Some("1".to_string());
        assert!(bad.validate(today()).is_err());

        let mut bad = draft();
        bad.password = PasswordCredential::new("");
        assert!(bad.validate(today()).is_err());

        let mut bad = draft();
        bad.date_of_birth = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert!(bad.validate(today()).is_err());
    }

    #[test]
    fn test_new_account_defaults() {
        let account = account();
        assert_eq!(account.locale, DEFAULT_LOCALE);
        assert!(account.flags.is_empty());
        assert!(!account.presence.online);
        assert_eq!(account.presence.status, PresenceStatus::Offline);
        assert_eq!(account.created_at, account.updated_at);
        assert_eq!(account.handle().to_string(), "neo#0001");
    }

    #[test]
    fn test_apply_profile_sets_and_clears() {
        let mut account = account();
        let later = account.updated_at + chrono::Duration::seconds(5);

        let patch = ProfilePatch {
            bio: Some("Wake up".to_string()),
            display_name: Some(String::new()),
            flags: Some(UserFlags::EARLY_ADOPTER),
            ..Default::default()
        };
        account.apply_profile(patch.validate().unwrap(), later);

        assert_eq!(account.bio.as_deref(), Some("Wake up"));
        assert_eq!(account.display_name, None);
        assert!(account.flags.contains(UserFlags::EARLY_ADOPTER));
        assert_eq!(account.updated_at, later);
    }

    #[test]
    fn test_empty_patch_is_rejected() {
        assert!(ProfilePatch::default().validate().is_err());
        let bad_color = ProfilePatch {
            accent_color: Some("red".to_string()),
            ..Default::default()
        };
        assert!(bad_color.validate().is_err());
    }

    #[test]
    fn test_identifier_change_resolution() {
        let account = account();
        let change = IdentifierChange {
            username: Some("theone".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();

        let (email, handle) = change.resolve(&account);
        assert_eq!(email, account.email);
        assert_eq!(handle, Handle::new("theone", "0001"));
        assert!(IdentifierChange::default().validate().is_err());
    }

    #[test]
    fn test_response_hides_credential() {
        let account = account();
        let json = serde_json::to_string(&AccountResponse::from(account)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let account = account();
        assert!(!format!("{:?}", account).contains("argon2"));
    }
}
