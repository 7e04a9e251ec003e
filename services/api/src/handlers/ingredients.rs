use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use potluck_domain::pagination::PageRequest;

use crate::domain::types::{Ingredient, IngredientFacts};
use crate::error::ApiError;
use crate::handlers::auth::CurrentUser;
use crate::handlers::scopes::Operation;
use crate::state::AppState;
use crate::usecase::ingredient::{
    CreateIngredientUseCase, DeleteIngredientUseCase, GetIngredientUseCase,
    ListIngredientsUseCase, UpdateIngredientUseCase,
};

#[derive(Serialize)]
pub struct IngredientResponse {
    pub id: Uuid,
    pub title: String,
    pub calories: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub protein: f64,
    pub weight_per_piece: Option<f64>,
    #[serde(serialize_with = "potluck_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Ingredient> for IngredientResponse {
    fn from(i: Ingredient) -> Self {
        Self {
            id: i.id,
            title: i.title,
            calories: i.calories,
            carbohydrates: i.carbohydrates,
            fat: i.fat,
            protein: i.protein,
            weight_per_piece: i.weight_per_piece,
            created_at: i.created_at,
        }
    }
}

/// Nutrition facts per 100 g.
#[derive(Deserialize)]
pub struct IngredientRequest {
    pub title: String,
    pub calories: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub protein: f64,
    pub weight_per_piece: Option<f64>,
}

impl From<IngredientRequest> for IngredientFacts {
    fn from(r: IngredientRequest) -> Self {
        Self {
            title: r.title,
            calories: r.calories,
            carbohydrates: r.carbohydrates,
            fat: r.fat,
            protein: r.protein,
            weight_per_piece: r.weight_per_piece,
        }
    }
}

// ── GET /ingredients ─────────────────────────────────────────────────────────

pub async fn list_ingredients(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Vec<IngredientResponse>>, ApiError> {
    current.require(Operation::ListIngredients)?;
    let usecase = ListIngredientsUseCase {
        ingredients: state.ingredient_repo(),
    };
    let ingredients = usecase.execute(page).await?;
    Ok(Json(ingredients.into_iter().map(Into::into).collect()))
}

// ── GET /ingredients/{id} ────────────────────────────────────────────────────

pub async fn get_ingredient(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IngredientResponse>, ApiError> {
    current.require(Operation::GetIngredient)?;
    let usecase = GetIngredientUseCase {
        ingredients: state.ingredient_repo(),
    };
    Ok(Json(usecase.execute(id).await?.into()))
}

// ── POST /ingredients ────────────────────────────────────────────────────────

pub async fn create_ingredient(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<IngredientRequest>,
) -> Result<(StatusCode, Json<IngredientResponse>), ApiError> {
    current.require(Operation::CreateIngredient)?;
    let usecase = CreateIngredientUseCase {
        ingredients: state.ingredient_repo(),
    };
    let ingredient = usecase.execute(body.into()).await?;
    Ok((StatusCode::CREATED, Json(ingredient.into())))
}

// ── PUT /ingredients/{id} ────────────────────────────────────────────────────

pub async fn update_ingredient(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<IngredientRequest>,
) -> Result<Json<IngredientResponse>, ApiError> {
    current.require(Operation::UpdateIngredient)?;
    let usecase = UpdateIngredientUseCase {
        ingredients: state.ingredient_repo(),
    };
    Ok(Json(usecase.execute(id, body.into()).await?.into()))
}

// ── DELETE /ingredients/{id} ─────────────────────────────────────────────────

pub async fn delete_ingredient(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    current.require(Operation::DeleteIngredient)?;
    let usecase = DeleteIngredientUseCase {
        ingredients: state.ingredient_repo(),
    };
    usecase.execute(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
