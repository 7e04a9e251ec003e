pub mod db;
pub mod db_game;
pub mod db_recipe;
pub mod db_token;
