//! Effective-scope resolution.
//!
//! The superuser bypass lives here and nowhere else: callers ask
//! [`has_scope`]/[`require_scope`] and never inspect `is_superuser` themselves.

use std::collections::BTreeSet;

use potluck_domain::scope::{all_scopes, invalid_scopes};
use uuid::Uuid;

use crate::domain::types::User;
use crate::error::ApiError;

/// Union of the user's role scopes and custom scopes; the whole catalog for
/// superusers.
pub fn effective_scopes(user: &User) -> BTreeSet<String> {
    if user.is_superuser {
        return all_scopes();
    }
    user.roles
        .iter()
        .flat_map(|role| role.scopes.iter())
        .chain(user.custom_scopes.iter())
        .cloned()
        .collect()
}

pub fn has_scope(user: &User, scope: &str) -> bool {
    if user.is_superuser {
        return true;
    }
    user.custom_scopes.contains(scope) || user.roles.iter().any(|r| r.scopes.contains(scope))
}

pub fn has_any(user: &User, scopes: &[&str]) -> bool {
    if user.is_superuser {
        return true;
    }
    let effective = effective_scopes(user);
    scopes.iter().any(|s| effective.contains(*s))
}

pub fn has_all(user: &User, scopes: &[&str]) -> bool {
    if user.is_superuser {
        return true;
    }
    let effective = effective_scopes(user);
    scopes.iter().all(|s| effective.contains(*s))
}

/// Fails with a generic `Forbidden` that never names the missing scope.
pub fn require_scope(user: &User, scope: &str) -> Result<(), ApiError> {
    if has_scope(user, scope) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Owner-only actions. Superusers pass for any owner.
pub fn require_owner(user: &User, owner_id: Uuid) -> Result<(), ApiError> {
    if user.is_superuser || user.id == owner_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Fails with `InvalidScope` listing every value outside the catalog.
pub fn validate_scopes<I, S>(scopes: I) -> Result<(), ApiError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let invalid = invalid_scopes(scopes);
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(ApiError::InvalidScope(invalid))
    }
}
