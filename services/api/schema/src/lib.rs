//! sea-orm entities for the Potluck API database.

pub mod drinks;
pub mod game_player_drinks;
pub mod game_players;
pub mod game_sessions;
pub mod game_teams;
pub mod ingredients;
pub mod recipe_ingredient_links;
pub mod recipe_sub_recipe_links;
pub mod recipes;
pub mod refresh_tokens;
pub mod roles;
pub mod user_roles;
pub mod users;
