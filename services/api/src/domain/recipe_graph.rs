//! Sub-recipe graph validation.
//!
//! The stored sub-recipe edges form a DAG. A recipe write replaces the
//! parent's outgoing edges wholesale, so candidates are checked against the
//! graph as it will look after the replacement, not as it looks now.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::domain::types::SubRecipeLink;
use crate::error::ApiError;

/// Parent → sub-recipe adjacency.
#[derive(Debug, Default, Clone)]
pub struct SubRecipeGraph {
    edges: HashMap<Uuid, Vec<Uuid>>,
}

impl SubRecipeGraph {
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (Uuid, Uuid)>,
    {
        let mut graph = Self::default();
        for (parent, sub) in edges {
            graph.add_edge(parent, sub);
        }
        graph
    }

    pub fn add_edge(&mut self, parent: Uuid, sub: Uuid) {
        self.edges.entry(parent).or_default().push(sub);
    }

    pub fn remove_outgoing(&mut self, parent: Uuid) {
        self.edges.remove(&parent);
    }

    /// Whether `to` is reachable from `from` (a node reaches itself).
    pub fn reaches(&self, from: Uuid, to: Uuid) -> bool {
        let mut stack = vec![from];
        let mut visited = HashSet::new();
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if !visited.insert(node) {
                continue;
            }
            if let Some(subs) = self.edges.get(&node) {
                stack.extend(subs.iter().copied().filter(|s| !visited.contains(s)));
            }
        }
        false
    }
}

/// Check that replacing `parent`'s sub-recipes with `candidates` keeps the
/// graph acyclic and well-formed.
///
/// `existing` holds the candidate ids that resolve to stored recipes; `graph`
/// holds every stored edge. Checks run in a fixed order so the reported error
/// is deterministic: self-reference, duplicates, missing recipes, cycles.
pub fn validate_sub_recipes(
    parent: Uuid,
    candidates: &[SubRecipeLink],
    existing: &HashSet<Uuid>,
    graph: &SubRecipeGraph,
) -> Result<(), ApiError> {
    if candidates.iter().any(|c| c.sub_recipe_id == parent) {
        return Err(ApiError::SelfReference);
    }

    let mut seen = HashSet::with_capacity(candidates.len());
    for c in candidates {
        if !seen.insert(c.sub_recipe_id) {
            return Err(ApiError::DuplicateSubRecipe(c.sub_recipe_id));
        }
    }

    if let Some(missing) = candidates.iter().find(|c| !existing.contains(&c.sub_recipe_id)) {
        return Err(ApiError::SubRecipeNotFound(missing.sub_recipe_id));
    }

    let mut next = graph.clone();
    next.remove_outgoing(parent);
    for c in candidates {
        if next.reaches(c.sub_recipe_id, parent) {
            return Err(ApiError::CycleDetected {
                parent,
                sub: c.sub_recipe_id,
            });
        }
        next.add_edge(parent, c.sub_recipe_id);
    }
    Ok(())
}
