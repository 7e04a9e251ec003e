pub mod auth;
pub mod game;
pub mod ingredient;
pub mod recipe;
pub mod role;
pub mod user;
pub mod user_permission;
