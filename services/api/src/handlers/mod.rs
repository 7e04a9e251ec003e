pub mod auth;
pub mod game;
pub mod ingredients;
pub mod recipes;
pub mod roles;
pub mod scopes;
pub mod user_permissions;
pub mod users;
