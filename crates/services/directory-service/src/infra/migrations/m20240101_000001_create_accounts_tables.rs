use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::Email).string().not_null())
                    .col(ColumnDef::new(Accounts::Password).text().not_null())
                    .col(ColumnDef::new(Accounts::Username).string_len(32).not_null())
                    .col(ColumnDef::new(Accounts::Discriminator).char_len(4).not_null())
                    .col(ColumnDef::new(Accounts::DisplayName).string_len(32).null())
                    .col(ColumnDef::new(Accounts::Avatar).string().null())
                    .col(ColumnDef::new(Accounts::Banner).string().null())
                    .col(ColumnDef::new(Accounts::Bio).string_len(190).null())
                    .col(ColumnDef::new(Accounts::AboutMe).string_len(190).null())
                    .col(ColumnDef::new(Accounts::AccentColor).string_len(7).null())
                    .col(ColumnDef::new(Accounts::Locale).string_len(5).not_null())
                    .col(ColumnDef::new(Accounts::IsBot).boolean().not_null().default(false))
                    .col(ColumnDef::new(Accounts::IsSystem).boolean().not_null().default(false))
                    .col(ColumnDef::new(Accounts::BotOwnerIds).json_binary().not_null())
                    .col(ColumnDef::new(Accounts::Flags).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Accounts::DateOfBirth).date().not_null())
                    .col(ColumnDef::new(Accounts::Presence).json_binary().not_null())
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Accounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AccountsByEmail::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountsByEmail::Email)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccountsByEmail::AccountId).uuid().not_null())
                    .col(
                        ColumnDef::new(AccountsByEmail::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AccountsByHandle::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountsByHandle::Username)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountsByHandle::Discriminator)
                            .char_len(4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccountsByHandle::AccountId).uuid().not_null())
                    .col(
                        ColumnDef::new(AccountsByHandle::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(AccountsByHandle::Username)
                            .col(AccountsByHandle::Discriminator),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccountsByHandle::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AccountsByEmail::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    Email,
    Password,
    Username,
    Discriminator,
    DisplayName,
    Avatar,
    Banner,
    Bio,
    AboutMe,
    AccentColor,
    Locale,
    IsBot,
    IsSystem,
    BotOwnerIds,
    Flags,
    DateOfBirth,
    Presence,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AccountsByEmail {
    Table,
    Email,
    AccountId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AccountsByHandle {
    Table,
    Username,
    Discriminator,
    AccountId,
    CreatedAt,
}
