pub mod link_diff;
pub mod nutrition;
pub mod permission;
pub mod recipe_graph;
pub mod repository;
pub mod types;
