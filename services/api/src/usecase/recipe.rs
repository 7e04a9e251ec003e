use std::collections::HashSet;

use chrono::Utc;
use uuid::Uuid;

use potluck_domain::pagination::PageRequest;

use crate::domain::nutrition::{RecipeNutrition, summarize};
use crate::domain::repository::RecipeRepository;
use crate::domain::types::{IngredientLink, Recipe, RecipeDraft, SubRecipeLink};
use crate::error::ApiError;

/// Unchecked recipe write payload.
#[derive(Debug, Clone)]
pub struct RecipeInput {
    pub title: String,
    pub instructions: Option<String>,
    pub servings: i32,
    pub image: Option<String>,
    pub ingredients: Vec<IngredientLink>,
    pub sub_recipes: Vec<SubRecipeLink>,
}

/// Turn a payload into a [`RecipeDraft`].
///
/// An ingredient amount `<= 0` drops that link. Sub-recipe graph rules are
/// enforced by the repository against stored state.
pub fn check_input(input: RecipeInput) -> Result<RecipeDraft, ApiError> {
    let title = input.title.trim().to_owned();
    if title.is_empty() {
        return Err(ApiError::InvalidInput("recipe title must not be empty".into()));
    }
    if input.servings < 1 {
        return Err(ApiError::InvalidInput("servings must be at least 1".into()));
    }

    let mut seen = HashSet::with_capacity(input.ingredients.len());
    for link in &input.ingredients {
        if !link.amount.is_finite() {
            return Err(ApiError::InvalidInput(format!(
                "amount of ingredient {} must be a number",
                link.ingredient_id
            )));
        }
        if !seen.insert(link.ingredient_id) {
            return Err(ApiError::DuplicateIngredient(link.ingredient_id));
        }
    }
    for link in &input.sub_recipes {
        if !link.scale_factor.is_finite() || link.scale_factor <= 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "scale_factor of sub-recipe {} must be a positive number",
                link.sub_recipe_id
            )));
        }
    }

    Ok(RecipeDraft {
        title,
        instructions: input.instructions,
        servings: input.servings,
        image: input.image,
        ingredients: input
            .ingredients
            .into_iter()
            .filter(|l| l.amount > 0.0)
            .collect(),
        sub_recipes: input.sub_recipes,
    })
}

// ── CreateRecipe ─────────────────────────────────────────────────────────────

pub struct CreateRecipeUseCase<R: RecipeRepository> {
    pub recipes: R,
}

impl<R: RecipeRepository> CreateRecipeUseCase<R> {
    pub async fn execute(&self, owner_id: Uuid, input: RecipeInput) -> Result<Recipe, ApiError> {
        let draft = check_input(input)?;
        let now = Utc::now();
        let recipe = Recipe {
            id: Uuid::now_v7(),
            title: draft.title,
            instructions: draft.instructions,
            servings: draft.servings,
            image: draft.image,
            owner_id: Some(owner_id),
            ingredients: draft.ingredients,
            sub_recipes: draft.sub_recipes,
            created_at: now,
            updated_at: now,
        };
        self.recipes.create(&recipe).await?;
        tracing::info!(recipe_id = %recipe.id, %owner_id, "recipe created");
        Ok(recipe)
    }
}

// ── UpdateRecipe ─────────────────────────────────────────────────────────────

pub struct UpdateRecipeUseCase<R: RecipeRepository> {
    pub recipes: R,
}

impl<R: RecipeRepository> UpdateRecipeUseCase<R> {
    /// Full replacement of fields and links; stored links are diffed in place.
    pub async fn execute(&self, recipe_id: Uuid, input: RecipeInput) -> Result<Recipe, ApiError> {
        let draft = check_input(input)?;
        self.recipes.update(recipe_id, &draft).await
    }
}

// ── DeleteRecipe ─────────────────────────────────────────────────────────────

pub struct DeleteRecipeUseCase<R: RecipeRepository> {
    pub recipes: R,
}

impl<R: RecipeRepository> DeleteRecipeUseCase<R> {
    pub async fn execute(&self, recipe_id: Uuid) -> Result<(), ApiError> {
        if !self.recipes.delete(recipe_id).await? {
            return Err(ApiError::RecipeNotFound);
        }
        tracing::info!(%recipe_id, "recipe deleted");
        Ok(())
    }
}

// ── GetRecipe / ListRecipes ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RecipeDetail {
    pub recipe: Recipe,
    pub nutrition: RecipeNutrition,
}

pub struct GetRecipeUseCase<R: RecipeRepository> {
    pub recipes: R,
}

impl<R: RecipeRepository> GetRecipeUseCase<R> {
    /// The recipe with nutrition aggregated over its whole sub-recipe tree.
    pub async fn execute(&self, recipe_id: Uuid) -> Result<RecipeDetail, ApiError> {
        let book = self.recipes.load_book(recipe_id).await?;
        let recipe = book
            .recipes
            .get(&recipe_id)
            .cloned()
            .ok_or(ApiError::RecipeNotFound)?;
        let nutrition = summarize(&book, recipe_id)?;
        Ok(RecipeDetail { recipe, nutrition })
    }
}

pub struct ListRecipesUseCase<R: RecipeRepository> {
    pub recipes: R,
}

impl<R: RecipeRepository> ListRecipesUseCase<R> {
    pub async fn execute(&self, page: PageRequest) -> Result<Vec<Recipe>, ApiError> {
        self.recipes.list(page.clamped()).await
    }
}
