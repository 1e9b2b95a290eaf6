use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Leaderboard::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Leaderboard::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    // One entry per user
                    .col(
                        ColumnDef::new(Leaderboard::UserId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Leaderboard::Username).string().not_null())
                    .col(ColumnDef::new(Leaderboard::Score).integer().not_null())
                    .col(
                        ColumnDef::new(Leaderboard::Timestamp)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create index on score and timestamp for top-N queries
        manager
            .create_index(
                Index::create()
                    .name("idx_leaderboard_score_timestamp")
                    .table(Leaderboard::Table)
                    .col(Leaderboard::Score)
                    .col(Leaderboard::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Leaderboard::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Leaderboard {
    Table,
    Id,
    UserId,
    Username,
    Score,
    Timestamp,
}
