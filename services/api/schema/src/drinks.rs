use sea_orm::entity::prelude::*;

/// Drinks catalog shared by every game session.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "drinks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::game_player_drinks::Entity")]
    PlayerDrinks,
}

impl Related<super::game_player_drinks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlayerDrinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
