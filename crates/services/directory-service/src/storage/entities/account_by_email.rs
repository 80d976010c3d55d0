//! `accounts_by_email` index table.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use domain::EmailIndexEntry;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts_by_email")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub email: String,
    pub account_id: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for EmailIndexEntry {
    fn from(model: Model) -> Self {
        EmailIndexEntry {
            email: model.email,
            account_id: model.account_id,
            created_at: model.created_at,
        }
    }
}

impl From<&EmailIndexEntry> for ActiveModel {
    fn from(entry: &EmailIndexEntry) -> Self {
        ActiveModel {
            email: Set(entry.email.clone()),
            account_id: Set(entry.account_id),
            created_at: Set(entry.created_at),
        }
    }
}
