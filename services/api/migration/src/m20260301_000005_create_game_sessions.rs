use sea_orm_migration::prelude::*;

use crate::m20260301_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GameSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GameSessions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GameSessions::Title).string().not_null())
                    .col(ColumnDef::new(GameSessions::OwnerId).uuid().not_null())
                    .col(
                        ColumnDef::new(GameSessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(GameSessions::Table, GameSessions::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GamePlayers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GamePlayers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GamePlayers::GameSessionId).uuid().not_null())
                    .col(ColumnDef::new(GamePlayers::Name).string().not_null())
                    .col(
                        ColumnDef::new(GamePlayers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(GamePlayers::Table, GamePlayers::GameSessionId)
                            .to(GameSessions::Table, GameSessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Drinks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Drinks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Drinks::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Drinks::Description).string().null())
                    .col(
                        ColumnDef::new(Drinks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GamePlayerDrinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GamePlayerDrinks::GamePlayerId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GamePlayerDrinks::DrinkId).uuid().not_null())
                    .col(ColumnDef::new(GamePlayerDrinks::Amount).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(GamePlayerDrinks::GamePlayerId)
                            .col(GamePlayerDrinks::DrinkId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(GamePlayerDrinks::Table, GamePlayerDrinks::GamePlayerId)
                            .to(GamePlayers::Table, GamePlayers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(GamePlayerDrinks::Table, GamePlayerDrinks::DrinkId)
                            .to(Drinks::Table, Drinks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(GamePlayers::Table)
                    .col(GamePlayers::GameSessionId)
                    .name("idx_game_players_game_session_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GamePlayerDrinks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Drinks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GamePlayers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GameSessions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub(crate) enum GameSessions {
    Table,
    Id,
    Title,
    OwnerId,
    CreatedAt,
}

#[derive(Iden)]
enum GamePlayers {
    Table,
    Id,
    GameSessionId,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum Drinks {
    Table,
    Id,
    Name,
    Description,
    CreatedAt,
}

#[derive(Iden)]
enum GamePlayerDrinks {
    Table,
    GamePlayerId,
    DrinkId,
    Amount,
}
