use axum::extract::FromRef;
use sea_orm::DatabaseConnection;

use crate::infra::db::{DbRoleRepository, DbUserRepository};
use crate::infra::db_game::DbGameRepository;
use crate::infra::db_recipe::{DbIngredientRepository, DbRecipeRepository};
use crate::infra::db_token::DbRefreshTokenRepository;
use crate::realtime::ConnectionBroadcaster;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_secret: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub broadcaster: ConnectionBroadcaster,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn role_repo(&self) -> DbRoleRepository {
        DbRoleRepository {
            db: self.db.clone(),
        }
    }

    pub fn refresh_token_repo(&self) -> DbRefreshTokenRepository {
        DbRefreshTokenRepository {
            db: self.db.clone(),
        }
    }

    pub fn ingredient_repo(&self) -> DbIngredientRepository {
        DbIngredientRepository {
            db: self.db.clone(),
        }
    }

    pub fn recipe_repo(&self) -> DbRecipeRepository {
        DbRecipeRepository {
            db: self.db.clone(),
        }
    }

    pub fn game_repo(&self) -> DbGameRepository {
        DbGameRepository {
            db: self.db.clone(),
        }
    }
}

/// Lets the shared `readyz` handler ping the database.
impl FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
