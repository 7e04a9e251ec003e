use sea_orm::entity::prelude::*;

/// Directed edge "parent includes sub, scaled by `scale_factor`".
/// The edge set must stay acyclic.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recipe_sub_recipe_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub parent_recipe_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub sub_recipe_id: Uuid,
    pub scale_factor: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::recipes::Entity",
        from = "Column::ParentRecipeId",
        to = "super::recipes::Column::Id",
        on_delete = "Cascade"
    )]
    Parent,
    #[sea_orm(
        belongs_to = "super::recipes::Entity",
        from = "Column::SubRecipeId",
        to = "super::recipes::Column::Id",
        on_delete = "Cascade"
    )]
    Sub,
}

impl ActiveModelBehavior for ActiveModel {}
