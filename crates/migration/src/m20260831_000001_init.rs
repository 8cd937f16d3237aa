use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    OwnerId,
    Name,
    NameNorm,
    Kind,
    Currency,
    BalanceMinor,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    OwnerId,
    Name,
    NameNorm,
    Kind,
    IsParent,
    ParentId,
    Archived,
}

#[derive(Iden)]
enum Reservations {
    Table,
    Id,
    OwnerId,
    CategoryId,
    AccountId,
    Currency,
    ReservedMinor,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    OwnerId,
    Kind,
    AmountMinor,
    Currency,
    FromAccountId,
    ToAccountId,
    CategoryId,
    AdjustedMinor,
    Note,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::OwnerId).string().not_null())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::NameNorm).string().not_null())
                    .col(ColumnDef::new(Accounts::Kind).string().not_null())
                    .col(ColumnDef::new(Accounts::Currency).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::BalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-owner_id-name_norm")
                    .table(Accounts::Table)
                    .col(Accounts::OwnerId)
                    .col(Accounts::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::OwnerId).string().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::NameNorm).string().not_null())
                    .col(ColumnDef::new(Categories::Kind).string().not_null())
                    .col(ColumnDef::new(Categories::IsParent).boolean().not_null())
                    .col(ColumnDef::new(Categories::ParentId).blob())
                    .col(ColumnDef::new(Categories::Archived).boolean().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-owner_id-name_norm")
                    .table(Categories::Table)
                    .col(Categories::OwnerId)
                    .col(Categories::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Reservations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reservations::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reservations::OwnerId).string().not_null())
                    .col(ColumnDef::new(Reservations::CategoryId).blob().not_null())
                    .col(ColumnDef::new(Reservations::AccountId).blob().not_null())
                    .col(ColumnDef::new(Reservations::Currency).string().not_null())
                    .col(
                        ColumnDef::new(Reservations::ReservedMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reservations-category_id")
                            .from(Reservations::Table, Reservations::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reservations-account_id")
                            .from(Reservations::Table, Reservations::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-reservations-category_id-account_id")
                    .table(Reservations::Table)
                    .col(Reservations::CategoryId)
                    .col(Reservations::AccountId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-reservations-account_id")
                    .table(Reservations::Table)
                    .col(Reservations::AccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::OwnerId).string().not_null())
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Currency).string().not_null())
                    .col(ColumnDef::new(Transactions::FromAccountId).blob())
                    .col(ColumnDef::new(Transactions::ToAccountId).blob())
                    .col(ColumnDef::new(Transactions::CategoryId).blob())
                    .col(ColumnDef::new(Transactions::AdjustedMinor).big_integer())
                    .col(ColumnDef::new(Transactions::Note).string())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-owner_id-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::OwnerId)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-from_account_id")
                    .table(Transactions::Table)
                    .col(Transactions::FromAccountId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-to_account_id")
                    .table(Transactions::Table)
                    .col(Transactions::ToAccountId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Reservations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
