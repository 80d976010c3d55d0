//! `accounts` table.

use std::collections::BTreeSet;

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use common::{AppError, AppResult};
use domain::{Account, PasswordCredential, Presence, UserFlags};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub email: String,
    pub password: String,
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
    #[sea_orm(column_type = "JsonBinary")]
    pub bot_owner_ids: Json,
    pub flags: i64,
    pub date_of_birth: Date,
    #[sea_orm(column_type = "JsonBinary")]
    pub presence: Json,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl TryFrom<Model> for Account {
    type Error = AppError;

    fn try_from(model: Model) -> AppResult<Self> {
        let bot_owner_ids: BTreeSet<Uuid> = serde_json::from_value(model.bot_owner_ids)
            .map_err(|e| AppError::internal(format!("Corrupt bot_owner_ids column: {}", e)))?;
        let presence: Presence = serde_json::from_value(model.presence)
            .map_err(|e| AppError::internal(format!("Corrupt presence column: {}", e)))?;
        let flags = u32::try_from(model.flags)
            .map(UserFlags::from_bits_truncate)
            .map_err(|_| AppError::internal(format!("Corrupt flags column: {}", model.flags)))?;

        Ok(Account {
            id: model.id,
            email: model.email,
            password: PasswordCredential::new(model.password),
            username: model.username,
            discriminator: model.discriminator,
            display_name: model.display_name,
            avatar: model.avatar,
            banner: model.banner,
            bio: model.bio,
            about_me: model.about_me,
            accent_color: model.accent_color,
            locale: model.locale,
            is_bot: model.is_bot,
            is_system: model.is_system,
            bot_owner_ids,
            flags,
            date_of_birth: model.date_of_birth,
            presence,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

// Every column is set so the same model serves insert and upsert.
impl TryFrom<&Account> for ActiveModel {
    type Error = AppError;

    fn try_from(account: &Account) -> AppResult<Self> {
        let bot_owner_ids = serde_json::to_value(&account.bot_owner_ids)
            .map_err(|e| AppError::internal(format!("Serialization error: {}", e)))?;
        let presence = serde_json::to_value(&account.presence)
            .map_err(|e| AppError::internal(format!("Serialization error: {}", e)))?;

        Ok(ActiveModel {
            id: Set(account.id),
            email: Set(account.email.clone()),
            password: Set(account.password.expose().to_string()),
            username: Set(account.username.clone()),
            discriminator: Set(account.discriminator.clone()),
            display_name: Set(account.display_name.clone()),
            avatar: Set(account.avatar.clone()),
            banner: Set(account.banner.clone()),
            bio: Set(account.bio.clone()),
            about_me: Set(account.about_me.clone()),
            accent_color: Set(account.accent_color.clone()),
            locale: Set(account.locale.clone()),
            is_bot: Set(account.is_bot),
            is_system: Set(account.is_system),
            bot_owner_ids: Set(bot_owner_ids),
            flags: Set(i64::from(account.flags.bits())),
            date_of_birth: Set(account.date_of_birth),
            presence: Set(presence),
            created_at: Set(account.created_at),
            updated_at: Set(account.updated_at),
        })
    }
}

/// Columns rewritten by an upsert (everything except the key).
pub fn mutable_columns() -> Vec<Column> {
    vec![
        Column::Email,
        Column::Password,
        Column::Username,
        Column::Discriminator,
        Column::DisplayName,
        Column::Avatar,
        Column::Banner,
        Column::Bio,
        Column::AboutMe,
        Column::AccentColor,
        Column::Locale,
        Column::IsBot,
        Column::IsSystem,
        Column::BotOwnerIds,
        Column::Flags,
        Column::DateOfBirth,
        Column::Presence,
        Column::CreatedAt,
        Column::UpdatedAt,
    ]
}
