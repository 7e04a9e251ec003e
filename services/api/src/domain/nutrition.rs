//! Recursive nutrition aggregation over the sub-recipe graph.
//!
//! Works on a [`RecipeBook`] loaded up front, so the traversal itself never
//! touches storage. Values are accumulated unrounded and rounded once when
//! the result is built.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use potluck_core::serde::round2;
use potluck_domain::unit::NormalizedUnit;

use crate::domain::types::{Ingredient, Recipe};
use crate::error::ApiError;

/// Every recipe reachable from a root plus every ingredient those recipes
/// reference.
#[derive(Debug, Clone, Default)]
pub struct RecipeBook {
    pub recipes: HashMap<Uuid, Recipe>,
    pub ingredients: HashMap<Uuid, Ingredient>,
}

/// How much of an ingredient one recipe contributed along one inclusion path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientSource {
    pub recipe_id: Uuid,
    pub recipe_title: String,
    pub amount: f64,
    pub unit: NormalizedUnit,
    pub is_main_recipe: bool,
    /// Recipe ids from the root down to `recipe_id`, inclusive.
    pub path: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientTotal {
    pub ingredient_id: Uuid,
    pub title: String,
    pub amount: f64,
    pub unit: NormalizedUnit,
    pub grams: f64,
    pub calories: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub protein: f64,
    pub sources: Vec<IngredientSource>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MacroTotals {
    pub calories: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub protein: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeNutrition {
    pub recipe_id: Uuid,
    pub servings: i32,
    pub total_ingredients: Vec<IngredientTotal>,
    pub total_weight_grams: f64,
    pub totals: MacroTotals,
    pub per_serving: MacroTotals,
    pub calories_per_100g: f64,
}

/// Per-ingredient totals for `root`, sorted for display.
pub fn compute_totals(book: &RecipeBook, root: Uuid) -> Result<Vec<IngredientTotal>, ApiError> {
    let running = aggregate(book, root)?;
    Ok(finish_ingredients(running))
}

/// Per-ingredient totals plus whole-recipe and per-serving macros.
pub fn summarize(book: &RecipeBook, root: Uuid) -> Result<RecipeNutrition, ApiError> {
    let servings = book
        .recipes
        .get(&root)
        .map(|r| r.servings)
        .ok_or_else(|| dangling_recipe(root))?;
    let running = aggregate(book, root)?;

    let mut totals = MacroTotals::default();
    let mut weight = 0.0;
    for r in &running {
        totals.calories += r.calories;
        totals.carbohydrates += r.carbohydrates;
        totals.fat += r.fat;
        totals.protein += r.protein;
        weight += r.grams;
    }

    let per_serving = if servings > 0 {
        let s = f64::from(servings);
        MacroTotals {
            calories: totals.calories / s,
            carbohydrates: totals.carbohydrates / s,
            fat: totals.fat / s,
            protein: totals.protein / s,
        }
    } else {
        MacroTotals::default()
    };
    let calories_per_100g = if weight > 0.0 {
        totals.calories / weight * 100.0
    } else {
        0.0
    };

    Ok(RecipeNutrition {
        recipe_id: root,
        servings,
        total_ingredients: finish_ingredients(running),
        total_weight_grams: round2(weight),
        totals: round_macros(totals),
        per_serving: round_macros(per_serving),
        calories_per_100g: round2(calories_per_100g),
    })
}

// ── Traversal ────────────────────────────────────────────────────────────

struct Running {
    ingredient_id: Uuid,
    title: String,
    unit: NormalizedUnit,
    amount: f64,
    grams: f64,
    calories: f64,
    carbohydrates: f64,
    fat: f64,
    protein: f64,
    sources: Vec<IngredientSource>,
    source_index: HashMap<Vec<Uuid>, usize>,
}

struct Aggregation<'a> {
    book: &'a RecipeBook,
    root: Uuid,
    totals: Vec<Running>,
    index: HashMap<(Uuid, NormalizedUnit), usize>,
}

fn aggregate(book: &RecipeBook, root: Uuid) -> Result<Vec<Running>, ApiError> {
    let mut agg = Aggregation {
        book,
        root,
        totals: Vec::new(),
        index: HashMap::new(),
    };
    let mut path = Vec::new();
    agg.walk(root, 1.0, &mut path)?;
    Ok(agg.totals)
}

impl Aggregation<'_> {
    /// Depth-first walk. `path` doubles as the visited set: a sub-recipe
    /// already on the current path is skipped, while the same recipe reached
    /// through a different branch is counted again.
    fn walk(&mut self, recipe_id: Uuid, scale: f64, path: &mut Vec<Uuid>) -> Result<(), ApiError> {
        let book = self.book;
        let recipe = book
            .recipes
            .get(&recipe_id)
            .ok_or_else(|| dangling_recipe(recipe_id))?;
        path.push(recipe_id);

        for link in &recipe.ingredients {
            let ingredient = book.ingredients.get(&link.ingredient_id).ok_or_else(|| {
                ApiError::DanglingReference(format!(
                    "ingredient {} in recipe {}",
                    link.ingredient_id, recipe.id
                ))
            })?;
            let normalized = link.unit.normalize(link.amount, ingredient.weight_per_piece);
            self.add(
                ingredient,
                recipe,
                normalized.unit,
                normalized.amount * scale,
                normalized.grams * scale,
                path,
            );
        }

        for sub in &recipe.sub_recipes {
            if path.contains(&sub.sub_recipe_id) {
                tracing::warn!(
                    recipe_id = %recipe.id,
                    sub_recipe_id = %sub.sub_recipe_id,
                    "sub-recipe cycle skipped during aggregation"
                );
                continue;
            }
            self.walk(sub.sub_recipe_id, scale * sub.scale_factor, path)?;
        }

        path.pop();
        Ok(())
    }

    fn add(
        &mut self,
        ingredient: &Ingredient,
        contributor: &Recipe,
        unit: NormalizedUnit,
        amount: f64,
        grams: f64,
        path: &[Uuid],
    ) {
        let slot = *self
            .index
            .entry((ingredient.id, unit))
            .or_insert_with(|| {
                self.totals.push(Running {
                    ingredient_id: ingredient.id,
                    title: ingredient.title.clone(),
                    unit,
                    amount: 0.0,
                    grams: 0.0,
                    calories: 0.0,
                    carbohydrates: 0.0,
                    fat: 0.0,
                    protein: 0.0,
                    sources: Vec::new(),
                    source_index: HashMap::new(),
                });
                self.totals.len() - 1
            });
        let total = &mut self.totals[slot];

        let factor = grams / 100.0;
        total.amount += amount;
        total.grams += grams;
        total.calories += ingredient.calories * factor;
        total.carbohydrates += ingredient.carbohydrates * factor;
        total.fat += ingredient.fat * factor;
        total.protein += ingredient.protein * factor;

        match total.source_index.get(path) {
            Some(&i) => total.sources[i].amount += amount,
            None => {
                total.source_index.insert(path.to_vec(), total.sources.len());
                total.sources.push(IngredientSource {
                    recipe_id: contributor.id,
                    recipe_title: contributor.title.clone(),
                    amount,
                    unit,
                    is_main_recipe: contributor.id == self.root,
                    path: path.to_vec(),
                });
            }
        }
    }
}

// ── Output ───────────────────────────────────────────────────────────────

fn finish_ingredients(running: Vec<Running>) -> Vec<IngredientTotal> {
    let mut out: Vec<IngredientTotal> = running
        .into_iter()
        .map(|r| {
            let mut sources: Vec<IngredientSource> = r
                .sources
                .into_iter()
                .map(|s| IngredientSource {
                    amount: round2(s.amount),
                    ..s
                })
                .collect();
            sources.sort_by_key(|s| (!s.is_main_recipe, s.recipe_title.to_lowercase()));
            IngredientTotal {
                ingredient_id: r.ingredient_id,
                title: r.title,
                amount: round2(r.amount),
                unit: r.unit,
                grams: round2(r.grams),
                calories: r.calories.round(),
                carbohydrates: round2(r.carbohydrates),
                fat: round2(r.fat),
                protein: round2(r.protein),
                sources,
            }
        })
        .collect();
    out.sort_by_key(|t| {
        (
            t.sources.len() <= 1,
            t.title.to_lowercase(),
            t.unit.as_str().to_lowercase(),
        )
    });
    out
}

fn round_macros(m: MacroTotals) -> MacroTotals {
    MacroTotals {
        calories: m.calories.round(),
        carbohydrates: round2(m.carbohydrates),
        fat: round2(m.fat),
        protein: round2(m.protein),
    }
}

fn dangling_recipe(id: Uuid) -> ApiError {
    ApiError::DanglingReference(format!("recipe {id}"))
}
