use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use potluck_core::health::{healthz, readyz};
use potluck_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    auth::{login_access_token, logout, refresh_access_token},
    game::{
        add_player, create_drink, create_session, create_team, delete_session, delete_team,
        get_session, list_drinks, list_sessions, remove_player, set_player_drink,
    },
    ingredients::{
        create_ingredient, delete_ingredient, get_ingredient, list_ingredients, update_ingredient,
    },
    recipes::{create_recipe, delete_recipe, get_recipe, list_recipes, update_recipe},
    roles::{
        create_role, create_role_from_template, delete_role, get_role, list_role_templates,
        list_roles, list_scopes, update_role, update_role_scopes,
    },
    user_permissions::{assign_role, get_user_permissions, grant_scope, remove_role, revoke_scope},
    users::{
        create_user, delete_me, delete_user, get_me, get_user, update_me, update_password_me,
        update_user,
    },
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Login
        .route("/login/access-token", post(login_access_token))
        .route("/login/refresh", post(refresh_access_token))
        .route("/logout", post(logout))
        // Users
        .route("/users", post(create_user))
        .route("/users/me", get(get_me).patch(update_me).delete(delete_me))
        .route("/users/me/password", patch(update_password_me))
        .route("/users/{user_id}", get(get_user).patch(update_user).delete(delete_user))
        // Roles
        .route("/roles", get(list_roles).post(create_role))
        .route("/roles/templates", get(list_role_templates))
        .route("/roles/from-template/{key}", post(create_role_from_template))
        .route("/roles/scopes/available", get(list_scopes))
        .route(
            "/roles/{role_id}",
            get(get_role).put(update_role).delete(delete_role),
        )
        .route("/roles/{role_id}/scopes", put(update_role_scopes))
        // User permissions
        .route("/user-permissions/assign-role", post(assign_role))
        .route("/user-permissions/remove-role", post(remove_role))
        .route("/user-permissions/grant-scope", post(grant_scope))
        .route("/user-permissions/revoke-scope", post(revoke_scope))
        .route("/user-permissions/{email}", get(get_user_permissions))
        // Ingredients
        .route("/ingredients", get(list_ingredients).post(create_ingredient))
        .route(
            "/ingredients/{id}",
            get(get_ingredient)
                .put(update_ingredient)
                .delete(delete_ingredient),
        )
        // Recipes
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/{id}",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        // Game
        .route("/game/sessions", get(list_sessions).post(create_session))
        .route(
            "/game/sessions/{session_id}",
            get(get_session).delete(delete_session),
        )
        .route("/game/sessions/{session_id}/teams", post(create_team))
        .route("/game/sessions/{session_id}/teams/{team_id}", delete(delete_team))
        .route("/game/sessions/{session_id}/players", post(add_player))
        .route(
            "/game/sessions/{session_id}/players/{player_id}",
            delete(remove_player),
        )
        .route(
            "/game/sessions/{session_id}/players/{player_id}/drinks/{drink_id}",
            put(set_player_drink),
        )
        .route("/game/drinks", get(list_drinks).post(create_drink))
        .with_state(state)
        .layer(propagate_request_id_layer())
        .layer(trace_layer())
        .layer(request_id_layer())
}
