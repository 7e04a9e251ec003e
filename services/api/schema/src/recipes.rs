use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub instructions: Option<String>,
    pub servings: i32,
    pub image: Option<String>,
    pub owner_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    Owner,
    #[sea_orm(has_many = "super::recipe_ingredient_links::Entity")]
    IngredientLinks,
}

impl Related<super::recipe_ingredient_links::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IngredientLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
