//! Territory hierarchy traversal.
//!
//! Territories form a forest through `parent_id`. Ancestor and descendant
//! sets are computed with an explicit breadth-first walk over the edge list
//! loaded by `TerritoryRepo::list_edges`, capped at [`MAX_TERRITORY_DEPTH`].

use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::DbId;

/// Deepest hierarchy the resolver will walk. Real data is five or six levels
/// deep (country, federal district, region, municipality, settlement, block).
pub const MAX_TERRITORY_DEPTH: usize = 32;

/// Parent/child index over the `territories` table.
#[derive(Debug, Default, Clone)]
pub struct TerritoryTree {
    parents: HashMap<DbId, DbId>,
    children: HashMap<DbId, Vec<DbId>>,
}

impl TerritoryTree {
    /// Build the index from `(territory_id, parent_id)` pairs.
    pub fn from_edges(edges: &[(DbId, Option<DbId>)]) -> Self {
        let mut tree = Self::default();
        for &(id, parent_id) in edges {
            if let Some(parent_id) = parent_id {
                tree.parents.insert(id, parent_id);
                tree.children.entry(parent_id).or_default().push(id);
            }
        }
        for children in tree.children.values_mut() {
            children.sort_unstable();
        }
        tree
    }

    /// Parent of `id`, if any.
    pub fn parent(&self, id: DbId) -> Option<DbId> {
        self.parents.get(&id).copied()
    }

    /// All descendants of `id` (excluding `id`), nearest levels first.
    pub fn descendants(&self, id: DbId) -> Vec<DbId> {
        let mut seen = HashSet::from([id]);
        let mut out = Vec::new();
        let mut queue = VecDeque::from([(id, 0usize)]);

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= MAX_TERRITORY_DEPTH {
                continue;
            }
            for &child in self.children.get(&current).into_iter().flatten() {
                if seen.insert(child) {
                    out.push(child);
                    queue.push_back((child, depth + 1));
                }
            }
        }
        out
    }

    /// `id` followed by all of its descendants.
    pub fn subtree(&self, id: DbId) -> Vec<DbId> {
        let mut ids = vec![id];
        ids.extend(self.descendants(id));
        ids
    }

    /// Ancestors of `id` from the direct parent up to the root.
    pub fn ancestors(&self, id: DbId) -> Vec<DbId> {
        let mut seen = HashSet::from([id]);
        let mut out = Vec::new();
        let mut current = id;

        while let Some(parent) = self.parent(current) {
            if out.len() >= MAX_TERRITORY_DEPTH || !seen.insert(parent) {
                break;
            }
            out.push(parent);
            current = parent;
        }
        out
    }

    /// `id` followed by its ancestors, nearest first.
    pub fn self_and_ancestors(&self, id: DbId) -> Vec<DbId> {
        let mut ids = vec![id];
        ids.extend(self.ancestors(id));
        ids
    }
}
