use chrono::Utc;
use uuid::Uuid;

use potluck_domain::pagination::PageRequest;

use crate::domain::repository::IngredientRepository;
use crate::domain::types::{Ingredient, IngredientFacts};
use crate::error::ApiError;

/// Trim the title and check that every nutrition value is a finite,
/// non-negative number and that a piece weight, if given, is positive.
pub fn check_facts(mut facts: IngredientFacts) -> Result<IngredientFacts, ApiError> {
    facts.title = facts.title.trim().to_owned();
    if facts.title.is_empty() {
        return Err(ApiError::InvalidInput("ingredient title must not be empty".into()));
    }
    for (field, value) in [
        ("calories", facts.calories),
        ("carbohydrates", facts.carbohydrates),
        ("fat", facts.fat),
        ("protein", facts.protein),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "{field} must be a non-negative number"
            )));
        }
    }
    if let Some(weight) = facts.weight_per_piece {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(ApiError::InvalidInput(
                "weight_per_piece must be a positive number".into(),
            ));
        }
    }
    Ok(facts)
}

// ── CreateIngredient ─────────────────────────────────────────────────────────

pub struct CreateIngredientUseCase<I: IngredientRepository> {
    pub ingredients: I,
}

impl<I: IngredientRepository> CreateIngredientUseCase<I> {
    pub async fn execute(&self, facts: IngredientFacts) -> Result<Ingredient, ApiError> {
        let facts = check_facts(facts)?;
        let ingredient = Ingredient {
            id: Uuid::now_v7(),
            title: facts.title,
            calories: facts.calories,
            carbohydrates: facts.carbohydrates,
            fat: facts.fat,
            protein: facts.protein,
            weight_per_piece: facts.weight_per_piece,
            created_at: Utc::now(),
        };
        self.ingredients.create(&ingredient).await?;
        Ok(ingredient)
    }
}

// ── ListIngredients / GetIngredient ──────────────────────────────────────────

pub struct ListIngredientsUseCase<I: IngredientRepository> {
    pub ingredients: I,
}

impl<I: IngredientRepository> ListIngredientsUseCase<I> {
    pub async fn execute(&self, page: PageRequest) -> Result<Vec<Ingredient>, ApiError> {
        self.ingredients.list(page.clamped()).await
    }
}

pub struct GetIngredientUseCase<I: IngredientRepository> {
    pub ingredients: I,
}

impl<I: IngredientRepository> GetIngredientUseCase<I> {
    pub async fn execute(&self, id: Uuid) -> Result<Ingredient, ApiError> {
        self.ingredients
            .find_by_id(id)
            .await?
            .ok_or(ApiError::IngredientNotFound(id))
    }
}

// ── UpdateIngredient ─────────────────────────────────────────────────────────

pub struct UpdateIngredientUseCase<I: IngredientRepository> {
    pub ingredients: I,
}

impl<I: IngredientRepository> UpdateIngredientUseCase<I> {
    pub async fn execute(&self, id: Uuid, facts: IngredientFacts) -> Result<Ingredient, ApiError> {
        let facts = check_facts(facts)?;
        self.ingredients
            .update(id, &facts)
            .await?
            .ok_or(ApiError::IngredientNotFound(id))
    }
}

// ── DeleteIngredient ─────────────────────────────────────────────────────────

pub struct DeleteIngredientUseCase<I: IngredientRepository> {
    pub ingredients: I,
}

impl<I: IngredientRepository> DeleteIngredientUseCase<I> {
    pub async fn execute(&self, id: Uuid) -> Result<(), ApiError> {
        if !self.ingredients.delete(id).await? {
            return Err(ApiError::IngredientNotFound(id));
        }
        Ok(())
    }
}
