use potluck_api::domain::types::{IngredientLink, Recipe, SubRecipeLink};
use potluck_api::error::ApiError;
use potluck_api::usecase::recipe::{
    CreateRecipeUseCase, DeleteRecipeUseCase, GetRecipeUseCase, RecipeInput, UpdateRecipeUseCase,
};
use potluck_domain::unit::{NormalizedUnit, Unit};
use uuid::Uuid;

use crate::helpers::{
    MockRecipeRepo, SharedStore, ingredient_link, seed_ingredient, shared_store, sub_link,
    test_ingredient,
};

fn input(
    title: &str,
    servings: i32,
    ingredients: Vec<IngredientLink>,
    sub_recipes: Vec<SubRecipeLink>,
) -> RecipeInput {
    RecipeInput {
        title: title.to_owned(),
        instructions: None,
        servings,
        image: None,
        ingredients,
        sub_recipes,
    }
}

async fn create(store: &SharedStore, input: RecipeInput) -> Recipe {
    CreateRecipeUseCase {
        recipes: MockRecipeRepo::new(store),
    }
    .execute(Uuid::now_v7(), input)
    .await
    .unwrap()
}

#[tokio::test]
async fn should_aggregate_nutrition_through_scaled_sub_recipe() {
    let store = shared_store();
    let flour = test_ingredient("Flour", 300.0, None);
    let tomato = test_ingredient("Tomato", 20.0, None);
    seed_ingredient(&store, &flour);
    seed_ingredient(&store, &tomato);

    let dough = create(
        &store,
        input("Dough", 1, vec![ingredient_link(flour.id, 100.0, Unit::Gram)], vec![]),
    )
    .await;
    let pizza = create(
        &store,
        input(
            "Pizza",
            2,
            vec![ingredient_link(tomato.id, 0.5, Unit::Kilogram)],
            vec![sub_link(dough.id, 2.0)],
        ),
    )
    .await;

    let detail = GetRecipeUseCase {
        recipes: MockRecipeRepo::new(&store),
    }
    .execute(pizza.id)
    .await
    .unwrap();

    let n = detail.nutrition;
    assert_eq!(n.totals.calories, 700.0);
    assert_eq!(n.per_serving.calories, 350.0);
    assert_eq!(n.total_weight_grams, 700.0);
    assert_eq!(n.calories_per_100g, 100.0);

    let flour_total = n
        .total_ingredients
        .iter()
        .find(|t| t.ingredient_id == flour.id)
        .unwrap();
    assert_eq!(flour_total.grams, 200.0);
    assert_eq!(flour_total.unit, NormalizedUnit::Gram);
    assert_eq!(flour_total.sources.len(), 1);
    assert!(!flour_total.sources[0].is_main_recipe);
}

#[tokio::test]
async fn should_count_shared_sub_recipe_once_per_path() {
    let store = shared_store();
    let salt = test_ingredient("Salt", 0.0, None);
    seed_ingredient(&store, &salt);

    let base = create(
        &store,
        input("Base", 1, vec![ingredient_link(salt.id, 10.0, Unit::Gram)], vec![]),
    )
    .await;
    let left = create(&store, input("Left", 1, vec![], vec![sub_link(base.id, 1.0)])).await;
    let right = create(&store, input("Right", 1, vec![], vec![sub_link(base.id, 2.0)])).await;
    let top = create(
        &store,
        input(
            "Top",
            1,
            vec![],
            vec![sub_link(left.id, 1.0), sub_link(right.id, 1.0)],
        ),
    )
    .await;

    let detail = GetRecipeUseCase {
        recipes: MockRecipeRepo::new(&store),
    }
    .execute(top.id)
    .await
    .unwrap();

    let total = &detail.nutrition.total_ingredients[0];
    assert_eq!(total.grams, 30.0);
    assert_eq!(total.sources.len(), 2, "one source per inclusion path");
    assert!(total.sources.iter().all(|s| s.recipe_id == base.id));
}

#[tokio::test]
async fn should_weigh_pieces_by_piece_weight() {
    let store = shared_store();
    let egg = test_ingredient("Egg", 150.0, Some(50.0));
    let bay_leaf = test_ingredient("Bay leaf", 300.0, None);
    seed_ingredient(&store, &egg);
    seed_ingredient(&store, &bay_leaf);

    let omelette = create(
        &store,
        input(
            "Omelette",
            1,
            vec![
                ingredient_link(egg.id, 2.0, Unit::Piece),
                ingredient_link(bay_leaf.id, 1.0, Unit::Piece),
            ],
            vec![],
        ),
    )
    .await;

    let detail = GetRecipeUseCase {
        recipes: MockRecipeRepo::new(&store),
    }
    .execute(omelette.id)
    .await
    .unwrap();

    let eggs = detail
        .nutrition
        .total_ingredients
        .iter()
        .find(|t| t.ingredient_id == egg.id)
        .unwrap();
    assert_eq!(eggs.unit, NormalizedUnit::Gram);
    assert_eq!(eggs.grams, 100.0);
    assert_eq!(eggs.calories, 150.0);

    let leaves = detail
        .nutrition
        .total_ingredients
        .iter()
        .find(|t| t.ingredient_id == bay_leaf.id)
        .unwrap();
    assert_eq!(leaves.unit, NormalizedUnit::Piece);
    assert_eq!(leaves.grams, 0.0);
    assert_eq!(leaves.calories, 0.0);
}

#[tokio::test]
async fn should_reject_cycle_through_existing_recipes() {
    let store = shared_store();
    let a = create(&store, input("A", 1, vec![], vec![])).await;
    let b = create(&store, input("B", 1, vec![], vec![sub_link(a.id, 1.0)])).await;

    let result = UpdateRecipeUseCase {
        recipes: MockRecipeRepo::new(&store),
    }
    .execute(a.id, input("A", 1, vec![], vec![sub_link(b.id, 1.0)]))
    .await;

    assert!(
        matches!(result, Err(ApiError::CycleDetected { parent, sub }) if parent == a.id && sub == b.id),
        "expected CycleDetected, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_self_reference() {
    let store = shared_store();
    let a = create(&store, input("A", 1, vec![], vec![])).await;

    let result = UpdateRecipeUseCase {
        recipes: MockRecipeRepo::new(&store),
    }
    .execute(a.id, input("A", 1, vec![], vec![sub_link(a.id, 1.0)]))
    .await;

    assert!(matches!(result, Err(ApiError::SelfReference)), "got {result:?}");
}

#[tokio::test]
async fn should_reject_unknown_ingredient_and_sub_recipe() {
    let store = shared_store();
    let ghost = Uuid::now_v7();
    let uc = CreateRecipeUseCase {
        recipes: MockRecipeRepo::new(&store),
    };

    let result = uc
        .execute(
            Uuid::now_v7(),
            input("Soup", 1, vec![ingredient_link(ghost, 1.0, Unit::Gram)], vec![]),
        )
        .await;
    assert!(matches!(result, Err(ApiError::IngredientNotFound(id)) if id == ghost));

    let result = uc
        .execute(Uuid::now_v7(), input("Soup", 1, vec![], vec![sub_link(ghost, 1.0)]))
        .await;
    assert!(matches!(result, Err(ApiError::SubRecipeNotFound(id)) if id == ghost));
    assert!(store.lock().unwrap().recipes.is_empty());
}

#[tokio::test]
async fn should_reject_duplicate_ingredient_in_payload() {
    let store = shared_store();
    let flour = test_ingredient("Flour", 300.0, None);
    seed_ingredient(&store, &flour);

    let result = CreateRecipeUseCase {
        recipes: MockRecipeRepo::new(&store),
    }
    .execute(
        Uuid::now_v7(),
        input(
            "Bread",
            1,
            vec![
                ingredient_link(flour.id, 100.0, Unit::Gram),
                ingredient_link(flour.id, 0.2, Unit::Kilogram),
            ],
            vec![],
        ),
    )
    .await;

    assert!(matches!(result, Err(ApiError::DuplicateIngredient(id)) if id == flour.id));
}

#[tokio::test]
async fn should_update_links_in_place_and_drop_non_positive_amounts() {
    let store = shared_store();
    let flour = test_ingredient("Flour", 300.0, None);
    let sugar = test_ingredient("Sugar", 400.0, None);
    let milk = test_ingredient("Milk", 60.0, None);
    for i in [&flour, &sugar, &milk] {
        seed_ingredient(&store, i);
    }
    let cake = create(
        &store,
        input(
            "Cake",
            8,
            vec![
                ingredient_link(flour.id, 200.0, Unit::Gram),
                ingredient_link(sugar.id, 100.0, Unit::Gram),
            ],
            vec![],
        ),
    )
    .await;

    let updated = UpdateRecipeUseCase {
        recipes: MockRecipeRepo::new(&store),
    }
    .execute(
        cake.id,
        input(
            "Cake",
            8,
            vec![
                ingredient_link(flour.id, 250.0, Unit::Gram),
                ingredient_link(sugar.id, 0.0, Unit::Gram),
                ingredient_link(milk.id, 0.2, Unit::Liter),
            ],
            vec![],
        ),
    )
    .await
    .unwrap();

    assert_eq!(
        updated.ingredients,
        vec![
            ingredient_link(flour.id, 250.0, Unit::Gram),
            ingredient_link(milk.id, 0.2, Unit::Liter),
        ]
    );
}

#[tokio::test]
async fn should_cascade_sub_recipe_links_on_delete() {
    let store = shared_store();
    let dough = create(&store, input("Dough", 1, vec![], vec![])).await;
    let pizza = create(&store, input("Pizza", 1, vec![], vec![sub_link(dough.id, 1.0)])).await;

    let uc = DeleteRecipeUseCase {
        recipes: MockRecipeRepo::new(&store),
    };
    uc.execute(dough.id).await.unwrap();

    let store_guard = store.lock().unwrap();
    let pizza = store_guard.recipes.iter().find(|r| r.id == pizza.id).unwrap();
    assert!(pizza.sub_recipes.is_empty());
    drop(store_guard);

    let result = uc.execute(dough.id).await;
    assert!(matches!(result, Err(ApiError::RecipeNotFound)));
}

#[tokio::test]
async fn should_return_not_found_for_missing_recipe() {
    let store = shared_store();
    let result = GetRecipeUseCase {
        recipes: MockRecipeRepo::new(&store),
    }
    .execute(Uuid::now_v7())
    .await;
    assert!(matches!(result, Err(ApiError::RecipeNotFound)));
}
