#![allow(async_fn_in_trait)]

use uuid::Uuid;

use potluck_domain::pagination::PageRequest;

use crate::domain::nutrition::RecipeBook;
use crate::domain::types::{
    Drink, DrinkChange, GamePlayer, GameSession, GameTeam, Ingredient, IngredientFacts, Recipe,
    RecipeDraft, RefreshTokenRecord, Role, RolePatch, User, UserPatch,
};
use crate::error::ApiError;

/// Accounts plus their role memberships and custom scopes.
///
/// Every method that can shrink a user's effective scopes bumps that user's
/// `auth_version` in the same transaction as the change.
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;
    /// Fails with `UserAlreadyExists` when the email is taken.
    async fn create(&self, user: &User) -> Result<(), ApiError>;
    /// Apply `patch` to the locked row. When [`UserPatch::revokes_sessions`]
    /// holds, the auth version is bumped and every refresh token revoked in
    /// the same transaction. `UserNotFound` or `UserAlreadyExists`.
    async fn update(&self, id: Uuid, patch: &UserPatch) -> Result<User, ApiError>;
    /// Returns `true` if a row was deleted. Memberships, refresh tokens and
    /// owned game sessions cascade.
    async fn delete(&self, id: Uuid) -> Result<bool, ApiError>;

    /// Returns `true` if the membership was added.
    async fn add_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, ApiError>;
    /// Returns `true` if the membership existed and was removed.
    async fn remove_role(&self, user_id: Uuid, role_id: Uuid) -> Result<bool, ApiError>;
    /// Returns `true` if the scope was not held before.
    async fn grant_custom_scope(&self, user_id: Uuid, scope: &str) -> Result<bool, ApiError>;
    /// Returns `true` if the scope was held and was removed.
    async fn revoke_custom_scope(&self, user_id: Uuid, scope: &str) -> Result<bool, ApiError>;
}

/// Roles. Scope changes and deletes bump every holder's `auth_version`
/// atomically with the change itself.
pub trait RoleRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Role>, ApiError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, ApiError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, ApiError>;
    /// Fails with `RoleAlreadyExists` when the name is taken.
    async fn create(&self, role: &Role) -> Result<(), ApiError>;
    /// Apply `patch` to the locked row. Holders are bumped in the same
    /// transaction when the new scope set differs from the stored one.
    /// Returns the stored role and the number of bumped users.
    async fn update(&self, id: Uuid, patch: &RolePatch) -> Result<(Role, u64), ApiError>;
    /// Bump holders, drop memberships and delete the role in one transaction.
    /// Returns the number of bumped users, or `RoleNotFound`.
    async fn delete(&self, id: Uuid) -> Result<u64, ApiError>;
    /// Create the role named `role.name`, or overwrite its description and
    /// scopes and bump its holders if it already exists.
    /// Returns the stored role and the number of bumped users.
    async fn upsert_by_name(&self, role: &Role) -> Result<(Role, u64), ApiError>;
}

/// Server-side refresh token records, looked up by token hash.
pub trait RefreshTokenRepository: Send + Sync {
    async fn store(&self, record: &RefreshTokenRecord) -> Result<(), ApiError>;
    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, ApiError>;
    /// Revoke `old_hash` and store `next` atomically. Returns `false` without
    /// writing if `old_hash` is missing or already revoked.
    async fn rotate(&self, old_hash: &str, next: &RefreshTokenRecord) -> Result<bool, ApiError>;
    /// Returns `true` if an unrevoked record was revoked.
    async fn revoke(&self, token_hash: &str) -> Result<bool, ApiError>;
}

pub trait IngredientRepository: Send + Sync {
    async fn list(&self, page: PageRequest) -> Result<Vec<Ingredient>, ApiError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ingredient>, ApiError>;
    /// Returns only the ids that exist.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Ingredient>, ApiError>;
    async fn create(&self, ingredient: &Ingredient) -> Result<(), ApiError>;
    /// Returns the updated ingredient, or `None` if it doesn't exist.
    async fn update(&self, id: Uuid, facts: &IngredientFacts)
    -> Result<Option<Ingredient>, ApiError>;
    /// Returns `true` if a row was deleted. Recipe links cascade.
    async fn delete(&self, id: Uuid) -> Result<bool, ApiError>;
}

/// Recipes and their ingredient/sub-recipe links.
///
/// `create` and `update` validate the sub-recipe list against the stored
/// graph inside the write transaction, so validation and write see the same
/// edges.
pub trait RecipeRepository: Send + Sync {
    async fn list(&self, page: PageRequest) -> Result<Vec<Recipe>, ApiError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Recipe>, ApiError>;
    /// Load `root` and everything reachable from it. Missing rows are left
    /// out; aggregation reports them.
    async fn load_book(&self, root: Uuid) -> Result<RecipeBook, ApiError>;
    async fn create(&self, recipe: &Recipe) -> Result<(), ApiError>;
    /// Overwrite fields and diff links in place. `RecipeNotFound` if absent.
    async fn update(&self, id: Uuid, draft: &RecipeDraft) -> Result<Recipe, ApiError>;
    /// Returns `true` if a row was deleted. Links on both ends cascade.
    async fn delete(&self, id: Uuid) -> Result<bool, ApiError>;
}

/// Game sessions, teams, players and the drinks catalog.
pub trait GameRepository: Send + Sync {
    async fn list_sessions(&self, page: PageRequest) -> Result<Vec<GameSession>, ApiError>;
    /// The session with its teams, players and their drinks.
    async fn find_session(&self, id: Uuid) -> Result<Option<GameSession>, ApiError>;
    async fn create_session(&self, session: &GameSession) -> Result<(), ApiError>;
    async fn delete_session(&self, id: Uuid) -> Result<bool, ApiError>;

    async fn find_team(&self, id: Uuid) -> Result<Option<GameTeam>, ApiError>;
    /// `GameSessionNotFound` if the session is gone.
    async fn create_team(&self, team: &GameTeam) -> Result<(), ApiError>;
    /// Returns `true` if a row was deleted. Members stay in the session
    /// without a team.
    async fn delete_team(&self, id: Uuid) -> Result<bool, ApiError>;

    async fn find_player(&self, id: Uuid) -> Result<Option<GamePlayer>, ApiError>;
    /// `GameSessionNotFound` if the session is gone, `TeamNotFound` if
    /// `player.team_id` is not a team of that session.
    async fn add_player(&self, player: &GamePlayer) -> Result<(), ApiError>;
    async fn delete_player(&self, id: Uuid) -> Result<bool, ApiError>;

    async fn list_drinks(&self) -> Result<Vec<Drink>, ApiError>;
    async fn find_drink(&self, id: Uuid) -> Result<Option<Drink>, ApiError>;
    /// Fails with `DrinkAlreadyExists` when the name is taken.
    async fn create_drink(&self, drink: &Drink) -> Result<(), ApiError>;
    /// Upsert the player's amount for `drink_id`; a non-positive amount
    /// deletes the link.
    async fn set_player_drink(
        &self,
        player_id: Uuid,
        drink_id: Uuid,
        amount: i32,
    ) -> Result<DrinkChange, ApiError>;
}
