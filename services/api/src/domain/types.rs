use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use potluck_core::serde::to_rfc3339_ms;
use potluck_domain::unit::Unit;

/// A named bundle of scopes. Role names are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub scopes: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields to change on a stored role. `scopes` replaces the whole set.
#[derive(Debug, Clone, Default)]
pub struct RolePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub scopes: Option<BTreeSet<String>>,
}

/// An account together with everything permission resolution needs.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub hashed_password: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub roles: Vec<Role>,
    pub custom_scopes: BTreeSet<String>,
    pub auth_version: i32,
    pub created_at: DateTime<Utc>,
}

/// Fields to change on a stored account. The password arrives already hashed.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub hashed_password: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
}

impl UserPatch {
    /// Whether applying the patch to an account with the given flags must
    /// invalidate its tokens: a new password, deactivation, or losing
    /// superuser.
    pub fn revokes_sessions(&self, is_active: bool, is_superuser: bool) -> bool {
        self.hashed_password.is_some()
            || (is_active && self.is_active == Some(false))
            || (is_superuser && self.is_superuser == Some(false))
    }
}

/// A stored refresh token, identified by the SHA-256 of the token string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

/// Nutrition facts per 100 g.
#[derive(Debug, Clone, PartialEq)]
pub struct Ingredient {
    pub id: Uuid,
    pub title: String,
    pub calories: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub protein: f64,
    pub weight_per_piece: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Editable ingredient fields.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientFacts {
    pub title: String,
    pub calories: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub protein: f64,
    pub weight_per_piece: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngredientLink {
    pub ingredient_id: Uuid,
    pub amount: f64,
    pub unit: Unit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubRecipeLink {
    pub sub_recipe_id: Uuid,
    pub scale_factor: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub instructions: Option<String>,
    pub servings: i32,
    pub image: Option<String>,
    pub owner_id: Option<Uuid>,
    pub ingredients: Vec<IngredientLink>,
    pub sub_recipes: Vec<SubRecipeLink>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Checked recipe write payload. Every ingredient amount is positive and
/// every scale factor is positive and finite; removals are expressed by
/// omission.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub title: String,
    pub instructions: Option<String>,
    pub servings: i32,
    pub image: Option<String>,
    pub ingredients: Vec<IngredientLink>,
    pub sub_recipes: Vec<SubRecipeLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drink {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerDrink {
    pub drink_id: Uuid,
    pub name: String,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GamePlayer {
    pub id: Uuid,
    pub game_session_id: Uuid,
    pub team_id: Option<Uuid>,
    pub name: String,
    pub drinks: Vec<PlayerDrink>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameTeam {
    pub id: Uuid,
    pub game_session_id: Uuid,
    pub name: String,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

/// A game session with its full team/player/drink state. This is also the
/// snapshot pushed to live subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSession {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Uuid,
    pub teams: Vec<GameTeam>,
    pub players: Vec<GamePlayer>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

/// Outcome of setting a player's drink amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrinkChange {
    Added,
    Updated,
    Removed,
    Unchanged,
}
