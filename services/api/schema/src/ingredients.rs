use sea_orm::entity::prelude::*;

/// Nutrition facts, all per 100 g.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ingredients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub calories: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub protein: f64,
    /// Grams per piece, used when a recipe measures this ingredient in `pcs`.
    pub weight_per_piece: Option<f64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recipe_ingredient_links::Entity")]
    RecipeLinks,
}

impl Related<super::recipe_ingredient_links::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
