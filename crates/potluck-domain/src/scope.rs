//! The scope catalog: the fixed universe of permission strings.
//!
//! A scope is `"<resource>:<action>"`. The catalog is static; nothing can add
//! to it at runtime, so any string outside it is rejected wherever scopes are
//! accepted as input.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Serializer};

pub const RECIPES_READ: &str = "recipes:read";
pub const RECIPES_CREATE: &str = "recipes:create";
pub const RECIPES_UPDATE: &str = "recipes:update";
pub const RECIPES_DELETE: &str = "recipes:delete";
pub const INGREDIENTS_READ: &str = "ingredients:read";
pub const INGREDIENTS_CREATE: &str = "ingredients:create";
pub const INGREDIENTS_UPDATE: &str = "ingredients:update";
pub const INGREDIENTS_DELETE: &str = "ingredients:delete";
pub const GAMES_READ: &str = "games:read";
pub const GAMES_CREATE: &str = "games:create";
pub const GAMES_UPDATE: &str = "games:update";
pub const GAMES_DELETE: &str = "games:delete";
pub const PLAYERS_READ: &str = "players:read";
pub const PLAYERS_CREATE: &str = "players:create";
pub const PLAYERS_UPDATE: &str = "players:update";
pub const PLAYERS_DELETE: &str = "players:delete";
pub const TEAMS_READ: &str = "teams:read";
pub const TEAMS_CREATE: &str = "teams:create";
pub const TEAMS_UPDATE: &str = "teams:update";
pub const TEAMS_DELETE: &str = "teams:delete";
pub const DRINKS_READ: &str = "drinks:read";
pub const DRINKS_CREATE: &str = "drinks:create";
pub const DRINKS_UPDATE: &str = "drinks:update";
pub const DRINKS_DELETE: &str = "drinks:delete";
pub const USERS_READ: &str = "users:read";
pub const USERS_CREATE: &str = "users:create";
pub const USERS_UPDATE: &str = "users:update";
pub const USERS_DELETE: &str = "users:delete";
pub const ROLES_READ: &str = "roles:read";
pub const ROLES_CREATE: &str = "roles:create";
pub const ROLES_UPDATE: &str = "roles:update";
pub const ROLES_DELETE: &str = "roles:delete";

/// Every scope the system knows about, grouped by resource.
pub const SCOPE_CATALOG: &[&str] = &[
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
    PLAYERS_READ,
    PLAYERS_CREATE,
    PLAYERS_UPDATE,
    PLAYERS_DELETE,
    TEAMS_READ,
    TEAMS_CREATE,
    TEAMS_UPDATE,
    TEAMS_DELETE,
    DRINKS_READ,
    DRINKS_CREATE,
    DRINKS_UPDATE,
    DRINKS_DELETE,
    USERS_READ,
    USERS_CREATE,
    USERS_UPDATE,
    USERS_DELETE,
    ROLES_READ,
    ROLES_CREATE,
    ROLES_UPDATE,
    ROLES_DELETE,
];

/// A scope known to be a member of [`SCOPE_CATALOG`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Scope(&'static str);

impl Scope {
    /// Resolve a string against the catalog. Returns `None` for unknown scopes.
    pub fn parse(value: &str) -> Option<Self> {
        SCOPE_CATALOG
            .iter()
            .copied()
            .find(|s| *s == value)
            .map(Self)
    }

    pub fn as_str(self) -> &'static str {
        self.0
    }

    /// The resource half, e.g. `"recipes"` for `"recipes:read"`.
    pub fn resource(self) -> &'static str {
        self.0.split_once(':').map_or(self.0, |(r, _)| r)
    }

    /// The action half, e.g. `"read"` for `"recipes:read"`.
    pub fn action(self) -> &'static str {
        self.0.split_once(':').map_or("", |(_, a)| a)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for Scope {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.0)
    }
}

/// The whole catalog as an owned, sorted set.
pub fn all_scopes() -> BTreeSet<String> {
    SCOPE_CATALOG.iter().map(|s| s.to_string()).collect()
}

pub fn is_valid_scope(value: &str) -> bool {
    Scope::parse(value).is_some()
}

/// Returns the values that are not catalog members, sorted and deduplicated.
/// An empty result means every value is valid.
pub fn invalid_scopes<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .filter(|v| !is_valid_scope(v.as_ref()))
        .map(|v| v.as_ref().to_owned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
