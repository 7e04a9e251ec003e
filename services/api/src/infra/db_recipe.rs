use std::collections::{HashMap, HashSet};

use anyhow::Context as _;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseBackend,
    DatabaseConnection, DatabaseTransaction, EntityTrait, IntoActiveModel as _, QueryFilter,
    QueryOrder, QuerySelect, Statement, TransactionTrait,
};
use uuid::Uuid;

use potluck_api_schema::{ingredients, recipe_ingredient_links, recipe_sub_recipe_links, recipes};
use potluck_domain::pagination::PageRequest;
use potluck_domain::unit::Unit;

use crate::domain::link_diff::diff_links;
use crate::domain::nutrition::RecipeBook;
use crate::domain::recipe_graph::{SubRecipeGraph, validate_sub_recipes};
use crate::domain::repository::{IngredientRepository, RecipeRepository};
use crate::domain::types::{
    Ingredient, IngredientFacts, IngredientLink, Recipe, RecipeDraft, SubRecipeLink,
};
use crate::error::{ApiError, from_txn};

/// Advisory lock serializing writes that add sub-recipe edges. Two concurrent
/// writers could otherwise each pass the cycle check and close a loop together.
const SUB_RECIPE_GRAPH_LOCK: i64 = 0x706f_746c_7563_6b01;

// ── Ingredient repository ────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbIngredientRepository {
    pub db: DatabaseConnection,
}

impl IngredientRepository for DbIngredientRepository {
    async fn list(&self, page: PageRequest) -> Result<Vec<Ingredient>, ApiError> {
        let page = page.clamped();
        let models = ingredients::Entity::find()
            .order_by_asc(ingredients::Column::Title)
            .order_by_asc(ingredients::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&self.db)
            .await
            .context("list ingredients")?;
        Ok(models.into_iter().map(ingredient_from_model).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ingredient>, ApiError> {
        let model = ingredients::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find ingredient by id")?;
        Ok(model.map(ingredient_from_model))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Ingredient>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = ingredients::Entity::find()
            .filter(ingredients::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .context("find ingredients by ids")?;
        Ok(models.into_iter().map(ingredient_from_model).collect())
    }

    async fn create(&self, ingredient: &Ingredient) -> Result<(), ApiError> {
        ingredients::ActiveModel {
            id: Set(ingredient.id),
            title: Set(ingredient.title.clone()),
            calories: Set(ingredient.calories),
            carbohydrates: Set(ingredient.carbohydrates),
            fat: Set(ingredient.fat),
            protein: Set(ingredient.protein),
            weight_per_piece: Set(ingredient.weight_per_piece),
            created_at: Set(ingredient.created_at),
        }
        .insert(&self.db)
        .await
        .context("create ingredient")?;
        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        facts: &IngredientFacts,
    ) -> Result<Option<Ingredient>, ApiError> {
        let Some(model) = ingredients::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find ingredient for update")?
        else {
            return Ok(None);
        };
        let mut am = model.into_active_model();
        am.title = Set(facts.title.clone());
        am.calories = Set(facts.calories);
        am.carbohydrates = Set(facts.carbohydrates);
        am.fat = Set(facts.fat);
        am.protein = Set(facts.protein);
        am.weight_per_piece = Set(facts.weight_per_piece);
        let stored = am.update(&self.db).await.context("update ingredient")?;
        Ok(Some(ingredient_from_model(stored)))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = ingredients::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete ingredient")?;
        Ok(result.rows_affected > 0)
    }
}

fn ingredient_from_model(model: ingredients::Model) -> Ingredient {
    Ingredient {
        id: model.id,
        title: model.title,
        calories: model.calories,
        carbohydrates: model.carbohydrates,
        fat: model.fat,
        protein: model.protein,
        weight_per_piece: model.weight_per_piece,
        created_at: model.created_at,
    }
}

// ── Recipe repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRecipeRepository {
    pub db: DatabaseConnection,
}

impl RecipeRepository for DbRecipeRepository {
    async fn list(&self, page: PageRequest) -> Result<Vec<Recipe>, ApiError> {
        let page = page.clamped();
        let models = recipes::Entity::find()
            .order_by_desc(recipes::Column::CreatedAt)
            .order_by_asc(recipes::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&self.db)
            .await
            .context("list recipes")?;
        with_links(&self.db, models).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Recipe>, ApiError> {
        let Some(model) = recipes::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find recipe by id")?
        else {
            return Ok(None);
        };
        Ok(with_links(&self.db, vec![model]).await?.pop())
    }

    async fn load_book(&self, root: Uuid) -> Result<RecipeBook, ApiError> {
        let mut book = RecipeBook::default();
        let mut seen: HashSet<Uuid> = HashSet::from([root]);
        let mut frontier = vec![root];

        // One query round per graph level.
        while !frontier.is_empty() {
            let models = recipes::Entity::find()
                .filter(recipes::Column::Id.is_in(frontier.iter().copied()))
                .all(&self.db)
                .await
                .context("load recipe level")?;
            let mut next = Vec::new();
            for recipe in with_links(&self.db, models).await? {
                for link in &recipe.sub_recipes {
                    if seen.insert(link.sub_recipe_id) {
                        next.push(link.sub_recipe_id);
                    }
                }
                book.recipes.insert(recipe.id, recipe);
            }
            frontier = next;
        }

        let ingredient_ids: HashSet<Uuid> = book
            .recipes
            .values()
            .flat_map(|r| r.ingredients.iter().map(|l| l.ingredient_id))
            .collect();
        if !ingredient_ids.is_empty() {
            let models = ingredients::Entity::find()
                .filter(ingredients::Column::Id.is_in(ingredient_ids))
                .all(&self.db)
                .await
                .context("load recipe ingredients")?;
            book.ingredients = models
                .into_iter()
                .map(|m| (m.id, ingredient_from_model(m)))
                .collect();
        }
        Ok(book)
    }

    async fn create(&self, recipe: &Recipe) -> Result<(), ApiError> {
        self.db
            .transaction::<_, (), ApiError>(|txn| {
                let recipe = recipe.clone();
                Box::pin(async move {
                    check_links(txn, recipe.id, &recipe.ingredients, &recipe.sub_recipes).await?;

                    recipes::ActiveModel {
                        id: Set(recipe.id),
                        title: Set(recipe.title.clone()),
                        instructions: Set(recipe.instructions.clone()),
                        servings: Set(recipe.servings),
                        image: Set(recipe.image.clone()),
                        owner_id: Set(recipe.owner_id),
                        created_at: Set(recipe.created_at),
                        updated_at: Set(recipe.updated_at),
                    }
                    .insert(txn)
                    .await
                    .context("create recipe")?;

                    let ingredient_rows = recipe
                        .ingredients
                        .iter()
                        .map(|l| (l.ingredient_id, (l.amount, l.unit)));
                    insert_ingredient_links(txn, recipe.id, ingredient_rows).await?;
                    let sub_rows = recipe
                        .sub_recipes
                        .iter()
                        .map(|l| (l.sub_recipe_id, l.scale_factor));
                    insert_sub_recipe_links(txn, recipe.id, sub_rows).await?;
                    Ok(())
                })
            })
            .await
            .map_err(from_txn)
    }

    async fn update(&self, id: Uuid, draft: &RecipeDraft) -> Result<Recipe, ApiError> {
        let stored = self
            .db
            .transaction::<_, recipes::Model, ApiError>(|txn| {
                let draft = draft.clone();
                Box::pin(async move {
                    let model = recipes::Entity::find_by_id(id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .context("lock recipe for update")?
                        .ok_or(ApiError::RecipeNotFound)?;

                    check_links(txn, id, &draft.ingredients, &draft.sub_recipes).await?;

                    let mut am = model.into_active_model();
                    am.title = Set(draft.title.clone());
                    am.instructions = Set(draft.instructions.clone());
                    am.servings = Set(draft.servings);
                    am.image = Set(draft.image.clone());
                    am.updated_at = Set(Utc::now());
                    let stored = am.update(txn).await.context("update recipe")?;

                    sync_ingredient_links(txn, id, &draft.ingredients).await?;
                    sync_sub_recipe_links(txn, id, &draft.sub_recipes).await?;
                    Ok(stored)
                })
            })
            .await
            .map_err(from_txn)?;

        with_links(&self.db, vec![stored])
            .await?
            .pop()
            .ok_or(ApiError::RecipeNotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = recipes::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete recipe")?;
        Ok(result.rows_affected > 0)
    }
}

// ── Link validation ──────────────────────────────────────────────────────────

/// Validate a recipe's links against storage inside the write transaction.
async fn check_links(
    txn: &DatabaseTransaction,
    recipe_id: Uuid,
    ingredient_links: &[IngredientLink],
    sub_links: &[SubRecipeLink],
) -> Result<(), ApiError> {
    if !ingredient_links.is_empty() {
        let wanted: Vec<Uuid> = ingredient_links.iter().map(|l| l.ingredient_id).collect();
        let found: HashSet<Uuid> = ingredients::Entity::find()
            .select_only()
            .column(ingredients::Column::Id)
            .filter(ingredients::Column::Id.is_in(wanted.iter().copied()))
            .into_tuple::<Uuid>()
            .all(txn)
            .await
            .context("check ingredient ids")?
            .into_iter()
            .collect();
        if let Some(missing) = wanted.into_iter().find(|id| !found.contains(id)) {
            return Err(ApiError::IngredientNotFound(missing));
        }
    }

    if sub_links.is_empty() {
        return Ok(());
    }

    txn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Postgres,
        "SELECT pg_advisory_xact_lock($1)",
        [SUB_RECIPE_GRAPH_LOCK.into()],
    ))
    .await
    .context("lock sub-recipe graph")?;

    let candidate_ids: Vec<Uuid> = sub_links.iter().map(|l| l.sub_recipe_id).collect();
    let existing: HashSet<Uuid> = recipes::Entity::find()
        .select_only()
        .column(recipes::Column::Id)
        .filter(recipes::Column::Id.is_in(candidate_ids.iter().copied()))
        .into_tuple::<Uuid>()
        .all(txn)
        .await
        .context("check sub-recipe ids")?
        .into_iter()
        .collect();

    let graph = reachable_edges(txn, &candidate_ids).await?;
    validate_sub_recipes(recipe_id, sub_links, &existing, &graph)
}

/// Every stored edge reachable from `starts`. A cycle through the parent can
/// only use these edges.
async fn reachable_edges(
    txn: &DatabaseTransaction,
    starts: &[Uuid],
) -> Result<SubRecipeGraph, ApiError> {
    let mut graph = SubRecipeGraph::default();
    let mut seen: HashSet<Uuid> = starts.iter().copied().collect();
    let mut frontier: Vec<Uuid> = seen.iter().copied().collect();

    while !frontier.is_empty() {
        let edges = recipe_sub_recipe_links::Entity::find()
            .filter(recipe_sub_recipe_links::Column::ParentRecipeId.is_in(frontier.iter().copied()))
            .all(txn)
            .await
            .context("load sub-recipe edges")?;
        let mut next = Vec::new();
        for edge in edges {
            graph.add_edge(edge.parent_recipe_id, edge.sub_recipe_id);
            if seen.insert(edge.sub_recipe_id) {
                next.push(edge.sub_recipe_id);
            }
        }
        frontier = next;
    }
    Ok(graph)
}

// ── Link writes ──────────────────────────────────────────────────────────────

async fn insert_ingredient_links(
    txn: &DatabaseTransaction,
    recipe_id: Uuid,
    rows: impl IntoIterator<Item = (Uuid, (f64, Unit))>,
) -> Result<(), ApiError> {
    let models: Vec<_> = rows
        .into_iter()
        .map(|(ingredient_id, (amount, unit))| recipe_ingredient_links::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(ingredient_id),
            amount: Set(amount),
            unit: Set(unit.as_str().to_owned()),
        })
        .collect();
    if models.is_empty() {
        return Ok(());
    }
    recipe_ingredient_links::Entity::insert_many(models)
        .exec_without_returning(txn)
        .await
        .context("insert ingredient links")?;
    Ok(())
}

async fn insert_sub_recipe_links(
    txn: &DatabaseTransaction,
    parent_id: Uuid,
    rows: impl IntoIterator<Item = (Uuid, f64)>,
) -> Result<(), ApiError> {
    let models: Vec<_> = rows
        .into_iter()
        .map(|(sub_recipe_id, scale_factor)| recipe_sub_recipe_links::ActiveModel {
            parent_recipe_id: Set(parent_id),
            sub_recipe_id: Set(sub_recipe_id),
            scale_factor: Set(scale_factor),
        })
        .collect();
    if models.is_empty() {
        return Ok(());
    }
    recipe_sub_recipe_links::Entity::insert_many(models)
        .exec_without_returning(txn)
        .await
        .context("insert sub-recipe links")?;
    Ok(())
}

/// Rewrite the recipe's ingredient rows in place: unchanged rows stay,
/// changed rows are updated, the rest inserted or deleted.
async fn sync_ingredient_links(
    txn: &DatabaseTransaction,
    recipe_id: Uuid,
    desired: &[IngredientLink],
) -> Result<(), ApiError> {
    let stored = recipe_ingredient_links::Entity::find()
        .filter(recipe_ingredient_links::Column::RecipeId.eq(recipe_id))
        .all(txn)
        .await
        .context("load ingredient links for update")?;
    let existing = stored
        .into_iter()
        .map(|m| Ok((m.ingredient_id, (m.amount, parse_unit(&m)?))))
        .collect::<Result<Vec<_>, ApiError>>()?;
    let diff = diff_links(
        existing,
        desired
            .iter()
            .map(|l| (l.ingredient_id, (l.amount, l.unit))),
    );
    if diff.is_empty() {
        return Ok(());
    }

    if !diff.delete.is_empty() {
        recipe_ingredient_links::Entity::delete_many()
            .filter(recipe_ingredient_links::Column::RecipeId.eq(recipe_id))
            .filter(recipe_ingredient_links::Column::IngredientId.is_in(diff.delete))
            .exec(txn)
            .await
            .context("delete ingredient links")?;
    }
    for (ingredient_id, (amount, unit)) in diff.update {
        recipe_ingredient_links::Entity::update_many()
            .col_expr(recipe_ingredient_links::Column::Amount, Expr::value(amount))
            .col_expr(recipe_ingredient_links::Column::Unit, Expr::value(unit.as_str()))
            .filter(recipe_ingredient_links::Column::RecipeId.eq(recipe_id))
            .filter(recipe_ingredient_links::Column::IngredientId.eq(ingredient_id))
            .exec(txn)
            .await
            .context("update ingredient link")?;
    }
    insert_ingredient_links(txn, recipe_id, diff.insert).await
}

async fn sync_sub_recipe_links(
    txn: &DatabaseTransaction,
    parent_id: Uuid,
    desired: &[SubRecipeLink],
) -> Result<(), ApiError> {
    let stored = recipe_sub_recipe_links::Entity::find()
        .filter(recipe_sub_recipe_links::Column::ParentRecipeId.eq(parent_id))
        .all(txn)
        .await
        .context("load sub-recipe links for update")?;
    let diff = diff_links(
        stored.into_iter().map(|m| (m.sub_recipe_id, m.scale_factor)),
        desired.iter().map(|l| (l.sub_recipe_id, l.scale_factor)),
    );
    if diff.is_empty() {
        return Ok(());
    }

    if !diff.delete.is_empty() {
        recipe_sub_recipe_links::Entity::delete_many()
            .filter(recipe_sub_recipe_links::Column::ParentRecipeId.eq(parent_id))
            .filter(recipe_sub_recipe_links::Column::SubRecipeId.is_in(diff.delete))
            .exec(txn)
            .await
            .context("delete sub-recipe links")?;
    }
    for (sub_recipe_id, scale_factor) in diff.update {
        recipe_sub_recipe_links::Entity::update_many()
            .col_expr(
                recipe_sub_recipe_links::Column::ScaleFactor,
                Expr::value(scale_factor),
            )
            .filter(recipe_sub_recipe_links::Column::ParentRecipeId.eq(parent_id))
            .filter(recipe_sub_recipe_links::Column::SubRecipeId.eq(sub_recipe_id))
            .exec(txn)
            .await
            .context("update sub-recipe link")?;
    }
    insert_sub_recipe_links(txn, parent_id, diff.insert).await
}

// ── Model mapping ────────────────────────────────────────────────────────────

/// Attach both link kinds to `models` with one query per link table.
/// Preserves the order of `models`.
async fn with_links<C: ConnectionTrait>(
    conn: &C,
    models: Vec<recipes::Model>,
) -> Result<Vec<Recipe>, ApiError> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();

    let mut ingredient_links: HashMap<Uuid, Vec<IngredientLink>> = HashMap::new();
    for link in recipe_ingredient_links::Entity::find()
        .filter(recipe_ingredient_links::Column::RecipeId.is_in(ids.iter().copied()))
        .order_by_asc(recipe_ingredient_links::Column::IngredientId)
        .all(conn)
        .await
        .context("load ingredient links")?
    {
        let unit = parse_unit(&link)?;
        ingredient_links
            .entry(link.recipe_id)
            .or_default()
            .push(IngredientLink {
                ingredient_id: link.ingredient_id,
                amount: link.amount,
                unit,
            });
    }

    let mut sub_links: HashMap<Uuid, Vec<SubRecipeLink>> = HashMap::new();
    for link in recipe_sub_recipe_links::Entity::find()
        .filter(recipe_sub_recipe_links::Column::ParentRecipeId.is_in(ids))
        .order_by_asc(recipe_sub_recipe_links::Column::SubRecipeId)
        .all(conn)
        .await
        .context("load sub-recipe links")?
    {
        sub_links
            .entry(link.parent_recipe_id)
            .or_default()
            .push(SubRecipeLink {
                sub_recipe_id: link.sub_recipe_id,
                scale_factor: link.scale_factor,
            });
    }

    Ok(models
        .into_iter()
        .map(|m| {
            let ingredients = ingredient_links.remove(&m.id).unwrap_or_default();
            let sub_recipes = sub_links.remove(&m.id).unwrap_or_default();
            recipe_from_model(m, ingredients, sub_recipes)
        })
        .collect())
}

fn parse_unit(link: &recipe_ingredient_links::Model) -> Result<Unit, ApiError> {
    let unit = link.unit.parse::<Unit>().with_context(|| {
        format!(
            "stored unit of recipe {} ingredient {}",
            link.recipe_id, link.ingredient_id
        )
    })?;
    Ok(unit)
}

fn recipe_from_model(
    model: recipes::Model,
    ingredients: Vec<IngredientLink>,
    sub_recipes: Vec<SubRecipeLink>,
) -> Recipe {
    Recipe {
        id: model.id,
        title: model.title,
        instructions: model.instructions,
        servings: model.servings,
        image: model.image,
        owner_id: model.owner_id,
        ingredients,
        sub_recipes,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
