//! `accounts_by_handle` index table, keyed by (username, discriminator).

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use domain::{Handle, HandleIndexEntry};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts_by_handle")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub discriminator: String,
    pub account_id: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for HandleIndexEntry {
    fn from(model: Model) -> Self {
        HandleIndexEntry {
            handle: Handle::new(model.username, model.discriminator),
            account_id: model.account_id,
            created_at: model.created_at,
        }
    }
}

impl From<&HandleIndexEntry> for ActiveModel {
    fn from(entry: &HandleIndexEntry) -> Self {
        ActiveModel {
            username: Set(entry.handle.username.clone()),
            discriminator: Set(entry.handle.discriminator.clone()),
            account_id: Set(entry.account_id),
            created_at: Set(entry.created_at),
        }
    }
}
