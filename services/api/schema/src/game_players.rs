use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "game_players")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub game_session_id: Uuid,
    /// Cleared when the team is deleted.
    pub team_id: Option<Uuid>,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::game_sessions::Entity",
        from = "Column::GameSessionId",
        to = "super::game_sessions::Column::Id",
        on_delete = "Cascade"
    )]
    GameSession,
    #[sea_orm(
        belongs_to = "super::game_teams::Entity",
        from = "Column::TeamId",
        to = "super::game_teams::Column::Id",
        on_delete = "SetNull"
    )]
    Team,
    #[sea_orm(has_many = "super::game_player_drinks::Entity")]
    Drinks,
}

impl Related<super::game_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GameSession.def()
    }
}

impl Related<super::game_teams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl Related<super::game_player_drinks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Drinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
