use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use potluck_api::domain::link_diff::diff_links;
use potluck_api::domain::nutrition::RecipeBook;
use potluck_api::domain::recipe_graph::{SubRecipeGraph, validate_sub_recipes};
use potluck_api::domain::repository::{
    GameRepository, IngredientRepository, RecipeRepository, RefreshTokenRepository,
    RoleRepository, UserRepository,
};
use potluck_api::domain::types::{
    Drink, DrinkChange, GamePlayer, GameSession, GameTeam, Ingredient, IngredientFacts,
    IngredientLink, PlayerDrink, Recipe, RecipeDraft, RefreshTokenRecord, Role, RolePatch,
    SubRecipeLink, User, UserPatch,
};
use potluck_api::error::ApiError;
use potluck_api::password::hash_password;
use potluck_domain::pagination::PageRequest;
use potluck_domain::unit::Unit;

// ── Store ────────────────────────────────────────────────────────────────────

/// Everything the mock repositories persist. Users and sessions are stored
/// flat; their roles, teams and players are joined in on read.
#[derive(Default)]
pub struct Store {
    pub users: Vec<User>,
    pub memberships: Vec<(Uuid, Uuid)>,
    pub refresh_tokens: Vec<RefreshTokenRecord>,
    pub roles: Vec<Role>,
    pub ingredients: Vec<Ingredient>,
    pub recipes: Vec<Recipe>,
    pub sessions: Vec<GameSession>,
    pub teams: Vec<GameTeam>,
    pub players: Vec<GamePlayer>,
    pub drinks: Vec<Drink>,
    pub player_drinks: Vec<(Uuid, Uuid, i32)>,
}

pub type SharedStore = Arc<Mutex<Store>>;

pub fn shared_store() -> SharedStore {
    Arc::new(Mutex::new(Store::default()))
}

impl Store {
    fn joined_user(&self, user: &User) -> User {
        let mut user = user.clone();
        user.roles = self
            .memberships
            .iter()
            .filter(|(u, _)| *u == user.id)
            .filter_map(|(_, r)| self.roles.iter().find(|role| role.id == *r).cloned())
            .collect();
        user
    }

    fn bump(&mut self, user_id: Uuid) {
        if let Some(u) = self.users.iter_mut().find(|u| u.id == user_id) {
            u.auth_version += 1;
        }
    }

    fn bump_holders(&mut self, role_id: Uuid) -> u64 {
        let holders: Vec<Uuid> = self
            .memberships
            .iter()
            .filter(|(_, r)| *r == role_id)
            .map(|(u, _)| *u)
            .collect();
        for user_id in &holders {
            self.bump(*user_id);
        }
        holders.len() as u64
    }

    fn revoke_tokens_for(&mut self, user_id: Uuid) {
        let now = Utc::now();
        for t in &mut self.refresh_tokens {
            if t.user_id == user_id && t.revoked_at.is_none() {
                t.revoked_at = Some(now);
            }
        }
    }

    fn drop_session(&mut self, id: Uuid) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        let players: Vec<Uuid> = self
            .players
            .iter()
            .filter(|p| p.game_session_id == id)
            .map(|p| p.id)
            .collect();
        self.teams.retain(|t| t.game_session_id != id);
        self.players.retain(|p| p.game_session_id != id);
        self.player_drinks.retain(|(p, _, _)| !players.contains(p));
        self.sessions.len() < before
    }

    fn joined_player(&self, player: &GamePlayer) -> GamePlayer {
        let mut player = player.clone();
        let mut drinks: Vec<PlayerDrink> = self
            .player_drinks
            .iter()
            .filter(|(p, _, _)| *p == player.id)
            .filter_map(|(_, d, amount)| {
                self.drinks.iter().find(|drink| drink.id == *d).map(|drink| PlayerDrink {
                    drink_id: drink.id,
                    name: drink.name.clone(),
                    amount: *amount,
                })
            })
            .collect();
        drinks.sort_by(|a, b| a.name.cmp(&b.name));
        player.drinks = drinks;
        player
    }

    fn joined_session(&self, session: &GameSession) -> GameSession {
        let mut session = session.clone();
        session.teams = self
            .teams
            .iter()
            .filter(|t| t.game_session_id == session.id)
            .cloned()
            .collect();
        session.players = self
            .players
            .iter()
            .filter(|p| p.game_session_id == session.id)
            .map(|p| self.joined_player(p))
            .collect();
        session
    }

    /// Reject unknown ingredients and invalid sub-recipe lists for `parent`.
    fn check_links(
        &self,
        parent: Uuid,
        ingredients: &[IngredientLink],
        sub_recipes: &[SubRecipeLink],
    ) -> Result<(), ApiError> {
        if let Some(missing) = ingredients
            .iter()
            .find(|l| !self.ingredients.iter().any(|i| i.id == l.ingredient_id))
        {
            return Err(ApiError::IngredientNotFound(missing.ingredient_id));
        }
        let existing: HashSet<Uuid> = self.recipes.iter().map(|r| r.id).collect();
        let graph = SubRecipeGraph::from_edges(self.recipes.iter().flat_map(|r| {
            r.sub_recipes.iter().map(move |l| (r.id, l.sub_recipe_id))
        }));
        validate_sub_recipes(parent, sub_recipes, &existing, &graph)
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub const TEST_PASSWORD: &str = "correct horse battery";

pub fn test_user(email: &str) -> User {
    User {
        id: Uuid::now_v7(),
        email: email.to_owned(),
        full_name: None,
        hashed_password: hash_password(TEST_PASSWORD).unwrap(),
        is_active: true,
        is_superuser: false,
        roles: Vec::new(),
        custom_scopes: BTreeSet::new(),
        auth_version: 1,
        created_at: Utc::now(),
    }
}

pub fn test_role(name: &str, scopes: &[&str]) -> Role {
    Role {
        id: Uuid::now_v7(),
        name: name.to_owned(),
        description: None,
        scopes: scopes.iter().map(|s| s.to_string()).collect(),
        created_at: Utc::now(),
    }
}

/// Facts per 100 g.
pub fn test_ingredient(title: &str, calories: f64, weight_per_piece: Option<f64>) -> Ingredient {
    Ingredient {
        id: Uuid::now_v7(),
        title: title.to_owned(),
        calories,
        carbohydrates: 0.0,
        fat: 0.0,
        protein: 0.0,
        weight_per_piece,
        created_at: Utc::now(),
    }
}

pub fn ingredient_link(ingredient_id: Uuid, amount: f64, unit: Unit) -> IngredientLink {
    IngredientLink {
        ingredient_id,
        amount,
        unit,
    }
}

pub fn sub_link(sub_recipe_id: Uuid, scale_factor: f64) -> SubRecipeLink {
    SubRecipeLink {
        sub_recipe_id,
        scale_factor,
    }
}

pub fn seed_user(store: &SharedStore, user: &User) {
    store.lock().unwrap().users.push(user.clone());
}

pub fn seed_role(store: &SharedStore, role: &Role) {
    store.lock().unwrap().roles.push(role.clone());
}

pub fn seed_membership(store: &SharedStore, user_id: Uuid, role_id: Uuid) {
    store.lock().unwrap().memberships.push((user_id, role_id));
}

pub fn seed_ingredient(store: &SharedStore, ingredient: &Ingredient) {
    store.lock().unwrap().ingredients.push(ingredient.clone());
}

pub fn seed_refresh_token(store: &SharedStore, record: &RefreshTokenRecord) {
    store.lock().unwrap().refresh_tokens.push(record.clone());
}

pub fn active_refresh_tokens(store: &SharedStore, user_id: Uuid) -> usize {
    store
        .lock()
        .unwrap()
        .refresh_tokens
        .iter()
        .filter(|t| t.user_id == user_id && t.revoked_at.is_none())
        .count()
}

pub fn auth_version(store: &SharedStore, user_id: Uuid) -> i32 {
    store
        .lock()
        .unwrap()
        .users
        .iter()
        .find(|u| u.id == user_id)
        .map(|u| u.auth_version)
        .unwrap()
}

// ── MockUserRepo ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockUserRepo {
    pub store: SharedStore,
}

impl MockUserRepo {
    pub fn new(store: &SharedStore) -> Self {
        Self {
            store: Arc::clone(store),
        }
    }
}

impl UserRepository for MockUserRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .users
            .iter()
            .find(|u| u.id == id)
            .map(|u| store.joined_user(u)))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| store.joined_user(u)))
    }

    async fn create(&self, user: &User) -> Result<(), ApiError> {
        let mut store = self.store.lock().unwrap();
        if store.users.iter().any(|u| u.email == user.email) {
            return Err(ApiError::UserAlreadyExists);
        }
        store.users.push(user.clone());
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &UserPatch) -> Result<User, ApiError> {
        let mut store = self.store.lock().unwrap();
        let email_taken = patch
            .email
            .as_ref()
            .is_some_and(|email| store.users.iter().any(|u| u.id != id && u.email == *email));
        if email_taken {
            return Err(ApiError::UserAlreadyExists);
        }
        let user = store
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(ApiError::UserNotFound)?;
        let revoke = patch.revokes_sessions(user.is_active, user.is_superuser);
        if let Some(email) = &patch.email {
            user.email = email.clone();
        }
        if let Some(full_name) = &patch.full_name {
            user.full_name = Some(full_name.clone());
        }
        if let Some(hashed) = &patch.hashed_password {
            user.hashed_password = hashed.clone();
        }
        if let Some(active) = patch.is_active {
            user.is_active = active;
        }
        if let Some(superuser) = patch.is_superuser {
            user.is_superuser = superuser;
        }
        if revoke {
            user.auth_version += 1;
            store.revoke_tokens_for(id);
        }
        let user = store.users.iter().find(|u| u.id == id).cloned();
        user.map(|u| store.joined_user(&u)).ok_or(ApiError::UserNotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut store = self.store.lock().unwrap();
        let before = store.users.len();
        store.users.retain(|u| u.id != id);
        store.memberships.retain(|(u, _)| *u != id);
        store.refresh_tokens.retain(|t| t.user_id != id);
        let owned: Vec<Uuid> = store
            .sessions
            .iter()
            .filter(|s| s.owner_id == id)
            .map(|s| s.id)
            .collect();
        for session_id in owned {
            store.drop_session(session_id);
        }
        Ok(store.users.len() < before)
    }

    async fn add_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, ApiError> {
        let mut store = self.store.lock().unwrap();
        if store.memberships.contains(&(user_id, role_id)) {
            return Ok(false);
        }
        store.memberships.push((user_id, role_id));
        Ok(true)
    }

    async fn remove_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, ApiError> {
        let mut store = self.store.lock().unwrap();
        let before = store.memberships.len();
        store.memberships.retain(|m| *m != (user_id, role_id));
        let removed = store.memberships.len() < before;
        if removed {
            store.bump(user_id);
        }
        Ok(removed)
    }

    async fn grant_custom_scope(&self, user_id: Uuid, scope: &str) -> Result<bool, ApiError> {
        let mut store = self.store.lock().unwrap();
        let user = store
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(ApiError::UserNotFound)?;
        Ok(user.custom_scopes.insert(scope.to_owned()))
    }

    async fn revoke_custom_scope(&self, user_id: Uuid, scope: &str) -> Result<bool, ApiError> {
        let mut store = self.store.lock().unwrap();
        let user = store
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(ApiError::UserNotFound)?;
        let removed = user.custom_scopes.remove(scope);
        if removed {
            user.auth_version += 1;
        }
        Ok(removed)
    }
}

// ── MockRoleRepo ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockRoleRepo {
    pub store: SharedStore,
}

impl MockRoleRepo {
    pub fn new(store: &SharedStore) -> Self {
        Self {
            store: Arc::clone(store),
        }
    }
}

impl RoleRepository for MockRoleRepo {
    async fn list(&self) -> Result<Vec<Role>, ApiError> {
        let mut roles = self.store.lock().unwrap().roles.clone();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, ApiError> {
        let store = self.store.lock().unwrap();
        Ok(store.roles.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, ApiError> {
        let store = self.store.lock().unwrap();
        Ok(store.roles.iter().find(|r| r.name == name).cloned())
    }

    async fn create(&self, role: &Role) -> Result<(), ApiError> {
        let mut store = self.store.lock().unwrap();
        if store.roles.iter().any(|r| r.name == role.name) {
            return Err(ApiError::RoleAlreadyExists);
        }
        store.roles.push(role.clone());
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &RolePatch) -> Result<(Role, u64), ApiError> {
        let mut store = self.store.lock().unwrap();
        let name_taken = patch
            .name
            .as_ref()
            .is_some_and(|name| store.roles.iter().any(|r| r.id != id && r.name == *name));
        if name_taken {
            return Err(ApiError::RoleAlreadyExists);
        }
        let stored = store
            .roles
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ApiError::RoleNotFound)?;
        let new_scopes = patch.scopes.clone().filter(|s| *s != stored.scopes);
        if let Some(name) = &patch.name {
            stored.name = name.clone();
        }
        if let Some(description) = &patch.description {
            stored.description = Some(description.clone());
        }
        let changed = new_scopes.is_some();
        if let Some(scopes) = new_scopes {
            stored.scopes = scopes;
        }
        let role = stored.clone();
        let bumped = if changed { store.bump_holders(id) } else { 0 };
        Ok((role, bumped))
    }

    async fn delete(&self, id: Uuid) -> Result<u64, ApiError> {
        let mut store = self.store.lock().unwrap();
        if !store.roles.iter().any(|r| r.id == id) {
            return Err(ApiError::RoleNotFound);
        }
        let bumped = store.bump_holders(id);
        store.memberships.retain(|(_, r)| *r != id);
        store.roles.retain(|r| r.id != id);
        Ok(bumped)
    }

    async fn upsert_by_name(&self, role: &Role) -> Result<(Role, u64), ApiError> {
        let mut store = self.store.lock().unwrap();
        let Some(i) = store.roles.iter().position(|r| r.name == role.name) else {
            store.roles.push(role.clone());
            return Ok((role.clone(), 0));
        };
        store.roles[i].description = role.description.clone();
        store.roles[i].scopes = role.scopes.clone();
        let stored = store.roles[i].clone();
        let bumped = store.bump_holders(stored.id);
        Ok((stored, bumped))
    }
}

// ── MockRefreshTokenRepo ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockRefreshTokenRepo {
    pub store: SharedStore,
}

impl MockRefreshTokenRepo {
    pub fn new(store: &SharedStore) -> Self {
        Self {
            store: Arc::clone(store),
        }
    }
}

impl RefreshTokenRepository for MockRefreshTokenRepo {
    async fn store(&self, record: &RefreshTokenRecord) -> Result<(), ApiError> {
        self.store.lock().unwrap().refresh_tokens.push(record.clone());
        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, ApiError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .refresh_tokens
            .iter()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn rotate(&self, old_hash: &str, next: &RefreshTokenRecord) -> Result<bool, ApiError> {
        let mut store = self.store.lock().unwrap();
        let Some(old) = store
            .refresh_tokens
            .iter_mut()
            .find(|t| t.token_hash == old_hash && t.revoked_at.is_none())
        else {
            return Ok(false);
        };
        old.revoked_at = Some(Utc::now());
        store.refresh_tokens.push(next.clone());
        Ok(true)
    }

    async fn revoke(&self, token_hash: &str) -> Result<bool, ApiError> {
        let mut store = self.store.lock().unwrap();
        let Some(record) = store
            .refresh_tokens
            .iter_mut()
            .find(|t| t.token_hash == token_hash && t.revoked_at.is_none())
        else {
            return Ok(false);
        };
        record.revoked_at = Some(Utc::now());
        Ok(true)
    }
}

// ── MockIngredientRepo ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockIngredientRepo {
    pub store: SharedStore,
}

impl MockIngredientRepo {
    pub fn new(store: &SharedStore) -> Self {
        Self {
            store: Arc::clone(store),
        }
    }
}

impl IngredientRepository for MockIngredientRepo {
    async fn list(&self, page: PageRequest) -> Result<Vec<Ingredient>, ApiError> {
        let mut all = self.store.lock().unwrap().ingredients.clone();
        all.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(all
            .into_iter()
            .skip(page.skip as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ingredient>, ApiError> {
        let store = self.store.lock().unwrap();
        Ok(store.ingredients.iter().find(|i| i.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Ingredient>, ApiError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .ingredients
            .iter()
            .filter(|i| ids.contains(&i.id))
            .cloned()
            .collect())
    }

    async fn create(&self, ingredient: &Ingredient) -> Result<(), ApiError> {
        self.store.lock().unwrap().ingredients.push(ingredient.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        facts: &IngredientFacts,
    ) -> Result<Option<Ingredient>, ApiError> {
        let mut store = self.store.lock().unwrap();
        let Some(stored) = store.ingredients.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        stored.title = facts.title.clone();
        stored.calories = facts.calories;
        stored.carbohydrates = facts.carbohydrates;
        stored.fat = facts.fat;
        stored.protein = facts.protein;
        stored.weight_per_piece = facts.weight_per_piece;
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut store = self.store.lock().unwrap();
        let before = store.ingredients.len();
        store.ingredients.retain(|i| i.id != id);
        for recipe in &mut store.recipes {
            recipe.ingredients.retain(|l| l.ingredient_id != id);
        }
        Ok(store.ingredients.len() < before)
    }
}

// ── MockRecipeRepo ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockRecipeRepo {
    pub store: SharedStore,
}

impl MockRecipeRepo {
    pub fn new(store: &SharedStore) -> Self {
        Self {
            store: Arc::clone(store),
        }
    }
}

impl RecipeRepository for MockRecipeRepo {
    async fn list(&self, page: PageRequest) -> Result<Vec<Recipe>, ApiError> {
        let mut all = self.store.lock().unwrap().recipes.clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(all
            .into_iter()
            .skip(page.skip as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Recipe>, ApiError> {
        let store = self.store.lock().unwrap();
        Ok(store.recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn load_book(&self, root: Uuid) -> Result<RecipeBook, ApiError> {
        let store = self.store.lock().unwrap();
        let mut book = RecipeBook::default();
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            if book.recipes.contains_key(&id) {
                continue;
            }
            let Some(recipe) = store.recipes.iter().find(|r| r.id == id) else {
                continue;
            };
            for link in &recipe.ingredients {
                if let Some(i) = store.ingredients.iter().find(|i| i.id == link.ingredient_id) {
                    book.ingredients.insert(i.id, i.clone());
                }
            }
            queue.extend(recipe.sub_recipes.iter().map(|l| l.sub_recipe_id));
            book.recipes.insert(id, recipe.clone());
        }
        Ok(book)
    }

    async fn create(&self, recipe: &Recipe) -> Result<(), ApiError> {
        let mut store = self.store.lock().unwrap();
        store.check_links(recipe.id, &recipe.ingredients, &recipe.sub_recipes)?;
        store.recipes.push(recipe.clone());
        Ok(())
    }

    async fn update(&self, id: Uuid, draft: &RecipeDraft) -> Result<Recipe, ApiError> {
        let mut store = self.store.lock().unwrap();
        if !store.recipes.iter().any(|r| r.id == id) {
            return Err(ApiError::RecipeNotFound);
        }
        store.check_links(id, &draft.ingredients, &draft.sub_recipes)?;

        let stored = store
            .recipes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ApiError::RecipeNotFound)?;
        stored.title = draft.title.clone();
        stored.instructions = draft.instructions.clone();
        stored.servings = draft.servings;
        stored.image = draft.image.clone();
        stored.updated_at = Utc::now();

        let diff = diff_links(
            stored
                .ingredients
                .iter()
                .map(|l| (l.ingredient_id, (l.amount, l.unit))),
            draft
                .ingredients
                .iter()
                .map(|l| (l.ingredient_id, (l.amount, l.unit))),
        );
        stored
            .ingredients
            .retain(|l| !diff.delete.contains(&l.ingredient_id));
        for (ingredient_id, (amount, unit)) in diff.update {
            if let Some(l) = stored
                .ingredients
                .iter_mut()
                .find(|l| l.ingredient_id == ingredient_id)
            {
                l.amount = amount;
                l.unit = unit;
            }
        }
        for (ingredient_id, (amount, unit)) in diff.insert {
            stored.ingredients.push(ingredient_link(ingredient_id, amount, unit));
        }
        stored.sub_recipes = draft.sub_recipes.clone();
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut store = self.store.lock().unwrap();
        let before = store.recipes.len();
        store.recipes.retain(|r| r.id != id);
        for recipe in &mut store.recipes {
            recipe.sub_recipes.retain(|l| l.sub_recipe_id != id);
        }
        Ok(store.recipes.len() < before)
    }
}

// ── MockGameRepo ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockGameRepo {
    pub store: SharedStore,
}

impl MockGameRepo {
    pub fn new(store: &SharedStore) -> Self {
        Self {
            store: Arc::clone(store),
        }
    }
}

impl GameRepository for MockGameRepo {
    async fn list_sessions(&self, page: PageRequest) -> Result<Vec<GameSession>, ApiError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .sessions
            .iter()
            .skip(page.skip as usize)
            .take(page.limit as usize)
            .map(|s| store.joined_session(s))
            .collect())
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<GameSession>, ApiError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .sessions
            .iter()
            .find(|s| s.id == id)
            .map(|s| store.joined_session(s)))
    }

    async fn create_session(&self, session: &GameSession) -> Result<(), ApiError> {
        let mut store = self.store.lock().unwrap();
        store.teams.extend(session.teams.iter().cloned());
        store.sessions.push(GameSession {
            teams: Vec::new(),
            players: Vec::new(),
            ..session.clone()
        });
        Ok(())
    }

    async fn delete_session(&self, id: Uuid) -> Result<bool, ApiError> {
        Ok(self.store.lock().unwrap().drop_session(id))
    }

    async fn find_team(&self, id: Uuid) -> Result<Option<GameTeam>, ApiError> {
        let store = self.store.lock().unwrap();
        Ok(store.teams.iter().find(|t| t.id == id).cloned())
    }

    async fn create_team(&self, team: &GameTeam) -> Result<(), ApiError> {
        let mut store = self.store.lock().unwrap();
        if !store.sessions.iter().any(|s| s.id == team.game_session_id) {
            return Err(ApiError::GameSessionNotFound);
        }
        store.teams.push(team.clone());
        Ok(())
    }

    async fn delete_team(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut store = self.store.lock().unwrap();
        let before = store.teams.len();
        store.teams.retain(|t| t.id != id);
        for player in &mut store.players {
            if player.team_id == Some(id) {
                player.team_id = None;
            }
        }
        Ok(store.teams.len() < before)
    }

    async fn find_player(&self, id: Uuid) -> Result<Option<GamePlayer>, ApiError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .players
            .iter()
            .find(|p| p.id == id)
            .map(|p| store.joined_player(p)))
    }

    async fn add_player(&self, player: &GamePlayer) -> Result<(), ApiError> {
        let mut store = self.store.lock().unwrap();
        if !store.sessions.iter().any(|s| s.id == player.game_session_id) {
            return Err(ApiError::GameSessionNotFound);
        }
        let foreign_team = player.team_id.is_some_and(|team_id| {
            !store
                .teams
                .iter()
                .any(|t| t.id == team_id && t.game_session_id == player.game_session_id)
        });
        if foreign_team {
            return Err(ApiError::TeamNotFound);
        }
        store.players.push(player.clone());
        Ok(())
    }

    async fn delete_player(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut store = self.store.lock().unwrap();
        let before = store.players.len();
        store.players.retain(|p| p.id != id);
        store.player_drinks.retain(|(p, _, _)| *p != id);
        Ok(store.players.len() < before)
    }

    async fn list_drinks(&self) -> Result<Vec<Drink>, ApiError> {
        let mut drinks = self.store.lock().unwrap().drinks.clone();
        drinks.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(drinks)
    }

    async fn find_drink(&self, id: Uuid) -> Result<Option<Drink>, ApiError> {
        let store = self.store.lock().unwrap();
        Ok(store.drinks.iter().find(|d| d.id == id).cloned())
    }

    async fn create_drink(&self, drink: &Drink) -> Result<(), ApiError> {
        let mut store = self.store.lock().unwrap();
        if store.drinks.iter().any(|d| d.name == drink.name) {
            return Err(ApiError::DrinkAlreadyExists);
        }
        store.drinks.push(drink.clone());
        Ok(())
    }

    async fn set_player_drink(
        &self,
        player_id: Uuid,
        drink_id: Uuid,
        amount: i32,
    ) -> Result<DrinkChange, ApiError> {
        let mut store = self.store.lock().unwrap();
        if !store.players.iter().any(|p| p.id == player_id) {
            return Err(ApiError::PlayerNotFound);
        }
        if !store.drinks.iter().any(|d| d.id == drink_id) {
            return Err(ApiError::DrinkNotFound);
        }
        let existing = store
            .player_drinks
            .iter()
            .position(|(p, d, _)| *p == player_id && *d == drink_id);
        let change = match (existing, amount > 0) {
            (None, false) => DrinkChange::Unchanged,
            (None, true) => {
                store.player_drinks.push((player_id, drink_id, amount));
                DrinkChange::Added
            }
            (Some(i), false) => {
                store.player_drinks.remove(i);
                DrinkChange::Removed
            }
            (Some(i), true) if store.player_drinks[i].2 == amount => DrinkChange::Unchanged,
            (Some(i), true) => {
                store.player_drinks[i].2 = amount;
                DrinkChange::Updated
            }
        };
        Ok(change)
    }
}

