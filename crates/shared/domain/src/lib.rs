//! Identity record model - accounts and their index projections.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! The directory service and the HTTP gateway both build on these types.

pub mod account;
pub mod constants;
pub mod error;
pub mod flags;
pub mod password;
pub mod validation;

pub use account::{
    Account, AccountDraft, AccountResponse, EmailIndexEntry, Handle, HandleIndexEntry,
    IdentifierChange, PasswordCredential, Presence, PresenceStatus, ProfilePatch,
};
pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use flags::UserFlags;
pub use password::Password;
