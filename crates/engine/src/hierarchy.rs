//! Cycle-checked traversal over the category tree.
//!
//! Parent pointers are user-controlled input, so nothing here trusts the
//! stored graph to be acyclic: every walk carries a visited set and a depth
//! guard, and edge insertion is validated before it is persisted.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::{Category, EngineError, ResultEngine};

/// Upper bound on parent-chain length. The product only ever builds two
/// levels, but stored data is still verified against runaway chains.
pub(crate) const MAX_DEPTH: usize = 16;

/// Walks the parent chain from `start` up to the root, returning the chain
/// including `start` itself.
pub(crate) fn ancestor_chain(
    categories: &HashMap<Uuid, Category>,
    start: Uuid,
) -> ResultEngine<Vec<Uuid>> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut current = Some(start);

    while let Some(id) = current {
        if !seen.insert(id) {
            return Err(EngineError::InvalidHierarchy(
                "category parent chain contains a cycle".to_string(),
            ));
        }
        if chain.len() >= MAX_DEPTH {
            return Err(EngineError::InvalidHierarchy(
                "category parent chain too deep".to_string(),
            ));
        }
        let category = categories
            .get(&id)
            .ok_or_else(|| EngineError::NotFound("category not exists".to_string()))?;
        chain.push(id);
        current = category.parent_id;
    }

    Ok(chain)
}

/// True if `candidate` appears in the parent chain of `of` (or is `of`).
pub(crate) fn is_ancestor_or_self(
    categories: &HashMap<Uuid, Category>,
    candidate: Uuid,
    of: Uuid,
) -> ResultEngine<bool> {
    Ok(ancestor_chain(categories, of)?.contains(&candidate))
}

/// Checks whether attaching `child` under `parent` is safe: no
/// self-reference, no cycle, matching income/expense kinds, and the target
/// actually accepts children. Parent-type categories are never nested, so a
/// parent category cannot itself be attached anywhere.
pub(crate) fn can_attach(
    categories: &HashMap<Uuid, Category>,
    child_id: Uuid,
    parent_id: Uuid,
) -> ResultEngine<()> {
    if child_id == parent_id {
        return Err(EngineError::InvalidHierarchy(
            "category cannot be its own parent".to_string(),
        ));
    }

    let child = categories
        .get(&child_id)
        .ok_or_else(|| EngineError::NotFound("category not exists".to_string()))?;
    let parent = categories
        .get(&parent_id)
        .ok_or_else(|| EngineError::NotFound("category not exists".to_string()))?;

    if child.is_parent {
        return Err(EngineError::InvalidHierarchy(
            "parent categories are never nested".to_string(),
        ));
    }
    if !parent.is_parent {
        return Err(EngineError::InvalidHierarchy(
            "target category does not accept children".to_string(),
        ));
    }
    if child.kind != parent.kind {
        return Err(EngineError::InvalidHierarchy(
            "parent and child must share the same kind".to_string(),
        ));
    }
    if is_ancestor_or_self(categories, child_id, parent_id)? {
        return Err(EngineError::InvalidHierarchy(
            "move would create a cycle".to_string(),
        ));
    }

    Ok(())
}

/// Direct children of `parent_id`.
pub(crate) fn children_of(
    categories: &HashMap<Uuid, Category>,
    parent_id: Uuid,
) -> Vec<&Category> {
    let mut children: Vec<&Category> = categories
        .values()
        .filter(|c| c.parent_id == Some(parent_id))
        .collect();
    children.sort_by(|a, b| a.name.cmp(&b.name));
    children
}

/// All fund-holding leaves reachable from `root`: `root` itself when it is a
/// leaf, otherwise its descendants, breadth-first with the depth guard.
pub(crate) fn fund_leaves(
    categories: &HashMap<Uuid, Category>,
    root: Uuid,
) -> ResultEngine<Vec<Uuid>> {
    let root_category = categories
        .get(&root)
        .ok_or_else(|| EngineError::NotFound("category not exists".to_string()))?;
    if !root_category.is_parent {
        return Ok(vec![root]);
    }

    let mut leaves = Vec::new();
    let mut frontier = vec![root];
    let mut seen = HashSet::from([root]);
    let mut depth = 0;

    while !frontier.is_empty() {
        depth += 1;
        if depth > MAX_DEPTH {
            return Err(EngineError::InvalidHierarchy(
                "category tree too deep".to_string(),
            ));
        }
        let mut next = Vec::new();
        for parent in frontier {
            for child in children_of(categories, parent) {
                if !seen.insert(child.id) {
                    return Err(EngineError::InvalidHierarchy(
                        "category tree contains a cycle".to_string(),
                    ));
                }
                if child.is_parent {
                    next.push(child.id);
                } else {
                    leaves.push(child.id);
                }
            }
        }
        frontier = next;
    }

    Ok(leaves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CategoryKind;

    fn category(name: &str, is_parent: bool, parent_id: Option<Uuid>) -> Category {
        Category::new(
            "alice".to_string(),
            name.to_string(),
            CategoryKind::Expense,
            is_parent,
            parent_id,
        )
    }

    fn index(categories: Vec<Category>) -> HashMap<Uuid, Category> {
        categories.into_iter().map(|c| (c.id, c)).collect()
    }

    #[test]
    fn chain_walks_to_root() {
        let parent = category("Essentials", true, None);
        let leaf = category("Groceries", false, Some(parent.id));
        let (parent_id, leaf_id) = (parent.id, leaf.id);
        let map = index(vec![parent, leaf]);

        assert_eq!(ancestor_chain(&map, leaf_id).unwrap(), vec![leaf_id, parent_id]);
    }

    #[test]
    fn chain_detects_cycles() {
        let mut a = category("A", false, None);
        let b = category("B", false, Some(a.id));
        a.parent_id = Some(b.id);
        let a_id = a.id;
        let map = index(vec![a, b]);

        let err = ancestor_chain(&map, a_id).unwrap_err();
        assert!(matches!(err, EngineError::InvalidHierarchy(_)));
    }

    #[test]
    fn attach_rejects_kind_mismatch() {
        let parent = Category::new(
            "alice".to_string(),
            "Salary".to_string(),
            CategoryKind::Income,
            true,
            None,
        );
        let leaf = category("Groceries", false, None);
        let (parent_id, leaf_id) = (parent.id, leaf.id);
        let map = index(vec![parent, leaf]);

        let err = can_attach(&map, leaf_id, parent_id).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidHierarchy(
                "parent and child must share the same kind".to_string()
            )
        );
    }

    #[test]
    fn attach_rejects_nested_parents() {
        let outer = category("Outer", true, None);
        let inner = category("Inner", true, None);
        let (outer_id, inner_id) = (outer.id, inner.id);
        let map = index(vec![outer, inner]);

        let err = can_attach(&map, inner_id, outer_id).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidHierarchy("parent categories are never nested".to_string())
        );
    }

    #[test]
    fn leaves_of_parent_exclude_the_parent() {
        let parent = category("Essentials", true, None);
        let groceries = category("Groceries", false, Some(parent.id));
        let rent = category("Rent", false, Some(parent.id));
        let (parent_id, groceries_id, rent_id) = (parent.id, groceries.id, rent.id);
        let map = index(vec![parent, groceries, rent]);

        let leaves = fund_leaves(&map, parent_id).unwrap();
        assert_eq!(leaves.len(), 2);
        assert!(leaves.contains(&groceries_id));
        assert!(leaves.contains(&rent_id));
    }
}
