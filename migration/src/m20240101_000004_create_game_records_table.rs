use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GameRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GameRecords::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GameRecords::UserId).string().not_null())
                    .col(ColumnDef::new(GameRecords::Score).integer().not_null())
                    .col(ColumnDef::new(GameRecords::Won).boolean().not_null())
                    .col(ColumnDef::new(GameRecords::Word).string().not_null())
                    .col(
                        ColumnDef::new(GameRecords::Timestamp)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create index for per-user history queries
        manager
            .create_index(
                Index::create()
                    .name("idx_game_records_user_timestamp")
                    .table(GameRecords::Table)
                    .col(GameRecords::UserId)
                    .col(GameRecords::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GameRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GameRecords {
    Table,
    Id,
    UserId,
    Score,
    Won,
    Word,
    Timestamp,
}
