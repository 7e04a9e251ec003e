use sea_orm_migration::prelude::*;

use crate::m20260301_000001_create_users::Users;
use crate::m20260301_000003_create_ingredients::Ingredients;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Recipes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Recipes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Recipes::Title).string().not_null())
                    .col(ColumnDef::new(Recipes::Instructions).text().null())
                    .col(
                        ColumnDef::new(Recipes::Servings)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Recipes::Image).string().null())
                    .col(ColumnDef::new(Recipes::OwnerId).uuid().null())
                    .col(
                        ColumnDef::new(Recipes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Recipes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Recipes::Table, Recipes::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RecipeIngredientLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RecipeIngredientLinks::RecipeId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecipeIngredientLinks::IngredientId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecipeIngredientLinks::Amount)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecipeIngredientLinks::Unit)
                            .string_len(8)
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(RecipeIngredientLinks::RecipeId)
                            .col(RecipeIngredientLinks::IngredientId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                RecipeIngredientLinks::Table,
                                RecipeIngredientLinks::RecipeId,
                            )
                            .to(Recipes::Table, Recipes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                RecipeIngredientLinks::Table,
                                RecipeIngredientLinks::IngredientId,
                            )
                            .to(Ingredients::Table, Ingredients::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RecipeSubRecipeLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RecipeSubRecipeLinks::ParentRecipeId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecipeSubRecipeLinks::SubRecipeId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecipeSubRecipeLinks::ScaleFactor)
                            .double()
                            .not_null()
                            .default(1.0),
                    )
                    .primary_key(
                        Index::create()
                            .col(RecipeSubRecipeLinks::ParentRecipeId)
                            .col(RecipeSubRecipeLinks::SubRecipeId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                RecipeSubRecipeLinks::Table,
                                RecipeSubRecipeLinks::ParentRecipeId,
                            )
                            .to(Recipes::Table, Recipes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                RecipeSubRecipeLinks::Table,
                                RecipeSubRecipeLinks::SubRecipeId,
                            )
                            .to(Recipes::Table, Recipes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .check(
                        Expr::col(RecipeSubRecipeLinks::ParentRecipeId)
                            .ne(Expr::col(RecipeSubRecipeLinks::SubRecipeId)),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(RecipeSubRecipeLinks::Table)
                    .col(RecipeSubRecipeLinks::SubRecipeId)
                    .name("idx_recipe_sub_recipe_links_sub_recipe_id")
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(RecipeIngredientLinks::Table)
                    .col(RecipeIngredientLinks::IngredientId)
                    .name("idx_recipe_ingredient_links_ingredient_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecipeSubRecipeLinks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecipeIngredientLinks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Recipes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Recipes {
    Table,
    Id,
    Title,
    Instructions,
    Servings,
    Image,
    OwnerId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum RecipeIngredientLinks {
    Table,
    RecipeId,
    IngredientId,
    Amount,
    Unit,
}

#[derive(Iden)]
enum RecipeSubRecipeLinks {
    Table,
    ParentRecipeId,
    SubRecipeId,
    ScaleFactor,
}
