use sea_orm_migration::prelude::*;

use crate::m20260301_000005_create_game_sessions::GameSessions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GameTeams::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GameTeams::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(GameTeams::GameSessionId).uuid().not_null())
                    .col(ColumnDef::new(GameTeams::Name).string().not_null())
                    .col(
                        ColumnDef::new(GameTeams::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(GameTeams::Table, GameTeams::GameSessionId)
                            .to(GameSessions::Table, GameSessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(GamePlayers::Table)
                    .add_column(ColumnDef::new(GamePlayers::TeamId).uuid().null())
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_game_players_team_id")
                            .from_tbl(GamePlayers::Table)
                            .from_col(GamePlayers::TeamId)
                            .to_tbl(GameTeams::Table)
                            .to_col(GameTeams::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(GameTeams::Table)
                    .col(GameTeams::GameSessionId)
                    .name("idx_game_teams_game_session_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(GamePlayers::Table)
                    .drop_foreign_key(Alias::new("fk_game_players_team_id"))
                    .drop_column(GamePlayers::TeamId)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(GameTeams::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum GameTeams {
    Table,
    Id,
    GameSessionId,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum GamePlayers {
    Table,
    TeamId,
}
