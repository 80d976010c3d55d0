//! SeaORM/Postgres store.
//!
//! `insert_if_absent` is `INSERT .. ON CONFLICT DO NOTHING`; the affected
//! row count tells the caller whether it won the key. No statement spans
//! more than one table.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Statement};

use common::{AppError, AppResult, OptionExt};
use domain::Account;

use super::entities::{account, account_by_email, account_by_handle};
use super::{with_deadline, Deadline, Row, RowKey, StorageAdapter};

/// Postgres-backed implementation of StorageAdapter
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn insert_row(&self, row: Row) -> AppResult<bool> {
        let affected = match &row {
            Row::Account(account) => {
                account::Entity::insert(account::ActiveModel::try_from(account)?)
                    .on_conflict(
                        OnConflict::column(account::Column::Id)
                            .do_nothing()
                            .to_owned(),
                    )
                    .exec_without_returning(&self.db)
                    .await
            }
            Row::Email(entry) => {
                account_by_email::Entity::insert(account_by_email::ActiveModel::from(entry))
                    .on_conflict(
                        OnConflict::column(account_by_email::Column::Email)
                            .do_nothing()
                            .to_owned(),
                    )
                    .exec_without_returning(&self.db)
                    .await
            }
            Row::Handle(entry) => {
                account_by_handle::Entity::insert(account_by_handle::ActiveModel::from(entry))
                    .on_conflict(
                        OnConflict::columns([
                            account_by_handle::Column::Username,
                            account_by_handle::Column::Discriminator,
                        ])
                        .do_nothing()
                        .to_owned(),
                    )
                    .exec_without_returning(&self.db)
                    .await
            }
        }
        .map_err(db_error)?;

        Ok(affected > 0)
    }

    async fn upsert_row(&self, row: Row) -> AppResult<()> {
        match &row {
            Row::Account(account) => {
                account::Entity::insert(account::ActiveModel::try_from(account)?)
                    .on_conflict(
                        OnConflict::column(account::Column::Id)
                            .update_columns(account::mutable_columns())
                            .to_owned(),
                    )
                    .exec_without_returning(&self.db)
                    .await
            }
            Row::Email(entry) => {
                account_by_email::Entity::insert(account_by_email::ActiveModel::from(entry))
                    .on_conflict(
                        OnConflict::column(account_by_email::Column::Email)
                            .update_columns([
                                account_by_email::Column::AccountId,
                                account_by_email::Column::CreatedAt,
                            ])
                            .to_owned(),
                    )
                    .exec_without_returning(&self.db)
                    .await
            }
            Row::Handle(entry) => {
                account_by_handle::Entity::insert(account_by_handle::ActiveModel::from(entry))
                    .on_conflict(
                        OnConflict::columns([
                            account_by_handle::Column::Username,
                            account_by_handle::Column::Discriminator,
                        ])
                        .update_columns([
                            account_by_handle::Column::AccountId,
                            account_by_handle::Column::CreatedAt,
                        ])
                        .to_owned(),
                    )
                    .exec_without_returning(&self.db)
                    .await
            }
        }
        .map_err(db_error)?;

        Ok(())
    }

    async fn find_row(&self, key: RowKey) -> AppResult<Row> {
        match key {
            RowKey::Account(id) => {
                let model = account::Entity::find_by_id(id)
                    .one(&self.db)
                    .await
                    .map_err(db_error)?
                    .ok_or_not_found()?;
                Ok(Row::Account(Account::try_from(model)?))
            }
            RowKey::Email(email) => {
                let model = account_by_email::Entity::find_by_id(email)
                    .one(&self.db)
                    .await
                    .map_err(db_error)?
                    .ok_or_not_found()?;
                Ok(Row::Email(model.into()))
            }
            RowKey::Handle(handle) => {
                let model = account_by_handle::Entity::find_by_id((
                    handle.username,
                    handle.discriminator,
                ))
                .one(&self.db)
                .await
                .map_err(db_error)?
                .ok_or_not_found()?;
                Ok(Row::Handle(model.into()))
            }
        }
    }

    async fn delete_row(&self, key: RowKey) -> AppResult<()> {
        match key {
            RowKey::Account(id) => account::Entity::delete_by_id(id).exec(&self.db).await,
            RowKey::Email(email) => {
                account_by_email::Entity::delete_by_id(email)
                    .exec(&self.db)
                    .await
            }
            RowKey::Handle(handle) => {
                account_by_handle::Entity::delete_by_id((handle.username, handle.discriminator))
                    .exec(&self.db)
                    .await
            }
        }
        .map_err(db_error)?;
        Ok(())
    }
}

fn db_error(err: DbErr) -> AppError {
    AppError::storage(err.to_string())
}

#[async_trait]
impl StorageAdapter for SeaOrmStore {
    async fn insert_if_absent(&self, row: Row, deadline: Deadline) -> AppResult<bool> {
        with_deadline(deadline, "insert_if_absent", self.insert_row(row)).await
    }

    async fn get(&self, key: RowKey, deadline: Deadline) -> AppResult<Row> {
        with_deadline(deadline, "get", self.find_row(key)).await
    }

    async fn put(&self, row: Row, deadline: Deadline) -> AppResult<()> {
        with_deadline(deadline, "put", self.upsert_row(row)).await
    }

    async fn delete(&self, key: RowKey, deadline: Deadline) -> AppResult<()> {
        with_deadline(deadline, "delete", self.delete_row(key)).await
    }

    async fn ping(&self, deadline: Deadline) -> AppResult<()> {
        with_deadline(deadline, "ping", async {
            self.db
                .execute(Statement::from_string(
                    self.db.get_database_backend(),
                    "SELECT 1".to_string(),
                ))
                .await
                .map_err(db_error)?;
            Ok(())
        })
        .await
    }
}
