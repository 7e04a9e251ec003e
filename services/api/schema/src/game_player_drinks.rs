use sea_orm::entity::prelude::*;

/// How many of a drink a player has had. Rows with a non-positive amount are
/// deleted rather than stored.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "game_player_drinks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub game_player_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub drink_id: Uuid,
    pub amount: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::game_players::Entity",
        from = "Column::GamePlayerId",
        to = "super::game_players::Column::Id",
        on_delete = "Cascade"
    )]
    Player,
    #[sea_orm(
        belongs_to = "super::drinks::Entity",
        from = "Column::DrinkId",
        to = "super::drinks::Column::Id",
        on_delete = "Cascade"
    )]
    Drink,
}

impl Related<super::game_players::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Player.def()
    }
}

impl Related<super::drinks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Drink.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
