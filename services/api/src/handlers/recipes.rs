use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use potluck_domain::pagination::PageRequest;
use potluck_domain::unit::Unit;

use crate::domain::nutrition::{IngredientTotal, MacroTotals};
use crate::domain::types::{IngredientLink, Recipe, SubRecipeLink};
use crate::error::ApiError;
use crate::handlers::auth::CurrentUser;
use crate::handlers::scopes::Operation;
use crate::state::AppState;
use crate::usecase::recipe::{
    CreateRecipeUseCase, DeleteRecipeUseCase, GetRecipeUseCase, ListRecipesUseCase, RecipeDetail,
    RecipeInput, UpdateRecipeUseCase,
};

// ── Request / response types ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct IngredientLinkRequest {
    pub ingredient_id: Uuid,
    /// `<= 0` removes the ingredient from the recipe.
    pub amount: f64,
    pub unit: Unit,
}

fn default_scale_factor() -> f64 {
    1.0
}

#[derive(Deserialize)]
pub struct SubRecipeLinkRequest {
    pub sub_recipe_id: Uuid,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
}

#[derive(Deserialize)]
pub struct RecipeRequest {
    pub title: String,
    pub instructions: Option<String>,
    pub servings: i32,
    pub image: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientLinkRequest>,
    #[serde(default)]
    pub sub_recipes: Vec<SubRecipeLinkRequest>,
}

impl From<RecipeRequest> for RecipeInput {
    fn from(r: RecipeRequest) -> Self {
        Self {
            title: r.title,
            instructions: r.instructions,
            servings: r.servings,
            image: r.image,
            ingredients: r
                .ingredients
                .into_iter()
                .map(|l| IngredientLink {
                    ingredient_id: l.ingredient_id,
                    amount: l.amount,
                    unit: l.unit,
                })
                .collect(),
            sub_recipes: r
                .sub_recipes
                .into_iter()
                .map(|l| SubRecipeLink {
                    sub_recipe_id: l.sub_recipe_id,
                    scale_factor: l.scale_factor,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
pub struct IngredientLinkResponse {
    pub ingredient_id: Uuid,
    pub amount: f64,
    pub unit: Unit,
}

#[derive(Serialize)]
pub struct SubRecipeLinkResponse {
    pub sub_recipe_id: Uuid,
    pub scale_factor: f64,
}

#[derive(Serialize)]
pub struct RecipeResponse {
    pub id: Uuid,
    pub title: String,
    pub instructions: Option<String>,
    pub servings: i32,
    pub image: Option<String>,
    pub owner_id: Option<Uuid>,
    pub ingredients: Vec<IngredientLinkResponse>,
    pub sub_recipes: Vec<SubRecipeLinkResponse>,
    #[serde(serialize_with = "potluck_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "potluck_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Recipe> for RecipeResponse {
    fn from(r: Recipe) -> Self {
        Self {
            id: r.id,
            title: r.title,
            instructions: r.instructions,
            servings: r.servings,
            image: r.image,
            owner_id: r.owner_id,
            ingredients: r
                .ingredients
                .into_iter()
                .map(|l| IngredientLinkResponse {
                    ingredient_id: l.ingredient_id,
                    amount: l.amount,
                    unit: l.unit,
                })
                .collect(),
            sub_recipes: r
                .sub_recipes
                .into_iter()
                .map(|l| SubRecipeLinkResponse {
                    sub_recipe_id: l.sub_recipe_id,
                    scale_factor: l.scale_factor,
                })
                .collect(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Recipe read payload: the stored fields plus the computed
/// `total_ingredients` and the scalar nutrition summary beside them.
#[derive(Serialize)]
pub struct RecipeDetailResponse {
    #[serde(flatten)]
    pub recipe: RecipeResponse,
    pub total_ingredients: Vec<IngredientTotal>,
    pub total_weight_grams: f64,
    pub totals: MacroTotals,
    pub per_serving: MacroTotals,
    pub calories_per_100g: f64,
}

impl From<RecipeDetail> for RecipeDetailResponse {
    fn from(detail: RecipeDetail) -> Self {
        let nutrition = detail.nutrition;
        Self {
            recipe: detail.recipe.into(),
            total_ingredients: nutrition.total_ingredients,
            total_weight_grams: nutrition.total_weight_grams,
            totals: nutrition.totals,
            per_serving: nutrition.per_serving,
            calories_per_100g: nutrition.calories_per_100g,
        }
    }
}

// ── GET /recipes ─────────────────────────────────────────────────────────────

pub async fn list_recipes(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Vec<RecipeResponse>>, ApiError> {
    current.require(Operation::ListRecipes)?;
    let usecase = ListRecipesUseCase {
        recipes: state.recipe_repo(),
    };
    let recipes = usecase.execute(page).await?;
    Ok(Json(recipes.into_iter().map(Into::into).collect()))
}

// ── GET /recipes/{id} ────────────────────────────────────────────────────────

pub async fn get_recipe(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RecipeDetailResponse>, ApiError> {
    current.require(Operation::GetRecipe)?;
    let usecase = GetRecipeUseCase {
        recipes: state.recipe_repo(),
    };
    Ok(Json(usecase.execute(id).await?.into()))
}

// ── POST /recipes ────────────────────────────────────────────────────────────

pub async fn create_recipe(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<RecipeRequest>,
) -> Result<(StatusCode, Json<RecipeResponse>), ApiError> {
    current.require(Operation::CreateRecipe)?;
    let usecase = CreateRecipeUseCase {
        recipes: state.recipe_repo(),
    };
    let recipe = usecase.execute(current.0.id, body.into()).await?;
    Ok((StatusCode::CREATED, Json(recipe.into())))
}

// ── PUT /recipes/{id} ────────────────────────────────────────────────────────

pub async fn update_recipe(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RecipeRequest>,
) -> Result<Json<RecipeResponse>, ApiError> {
    current.require(Operation::UpdateRecipe)?;
    let usecase = UpdateRecipeUseCase {
        recipes: state.recipe_repo(),
    };
    Ok(Json(usecase.execute(id, body.into()).await?.into()))
}

// ── DELETE /recipes/{id} ─────────────────────────────────────────────────────

pub async fn delete_recipe(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    current.require(Operation::DeleteRecipe)?;
    let usecase = DeleteRecipeUseCase {
        recipes: state.recipe_repo(),
    };
    usecase.execute(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
