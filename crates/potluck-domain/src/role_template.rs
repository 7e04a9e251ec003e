//! Predefined role templates.
//!
//! A template is a named bundle of scopes that can be materialized into a
//! stored role. Materializing a template whose role already exists overwrites
//! that role's description and scopes.

use serde::Serialize;

use crate::scope::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleTemplate {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub scopes: &'static [&'static str],
}

pub const ROLE_TEMPLATES: &[RoleTemplate] = &[
    RoleTemplate {
        key: "viewer",
        name: "Viewer",
        description: "Basic read-only access to recipes and ingredients",
        scopes: &[RECIPES_READ, INGREDIENTS_READ],
    },
    RoleTemplate {
        key: "recipe_contributor",
        name: "Recipe Contributor",
        description: "Can create and manage their own recipes",
        scopes: &[
            RECIPES_READ,
            RECIPES_CREATE,
            RECIPES_UPDATE,
            RECIPES_DELETE,
            INGREDIENTS_READ,
            INGREDIENTS_CREATE,
        ],
    },
    RoleTemplate {
        key: "recipe_moderator",
        name: "Recipe Moderator",
        description: "Can moderate all recipe content",
        scopes: &[
            RECIPES_READ,
            RECIPES_CREATE,
            RECIPES_UPDATE,
            RECIPES_DELETE,
            INGREDIENTS_READ,
            INGREDIENTS_CREATE,
            INGREDIENTS_UPDATE,
            INGREDIENTS_DELETE,
        ],
    },
    RoleTemplate {
        key: "game_master",
        name: "Game Master",
        description: "Can manage game sessions and players",
        scopes: &[GAMES_READ, GAMES_CREATE, GAMES_UPDATE, GAMES_DELETE],
    },
    RoleTemplate {
        key: "user_manager",
        name: "User Manager",
        description: "Can manage user accounts but not system settings",
        scopes: &[USERS_READ, USERS_UPDATE, USERS_CREATE, USERS_DELETE],
    },
    RoleTemplate {
        key: "content_manager",
        name: "Content Manager",
        description: "Can manage all content but not users",
        scopes: &[
            RECIPES_READ,
            RECIPES_CREATE,
            RECIPES_UPDATE,
            RECIPES_DELETE,
            INGREDIENTS_READ,
            INGREDIENTS_CREATE,
            INGREDIENTS_UPDATE,
            INGREDIENTS_DELETE,
            GAMES_READ,
            GAMES_CREATE,
            GAMES_UPDATE,
            GAMES_DELETE,
        ],
    },
    RoleTemplate {
        key: "administrator",
        name: "Administrator",
        description: "Full access to user and system management",
        scopes: SCOPE_CATALOG,
    },
];

/// Look up a template by its key (e.g. `"game_master"`).
pub fn find_template(key: &str) -> Option<&'static RoleTemplate> {
    ROLE_TEMPLATES.iter().find(|t| t.key == key)
}
