use crate::ancestry::Ancestry;
use crate::error::{MenuError, Result};
use crate::model::{LinkType, MenuItem};
use crate::reorder::ReorderEntry;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::error;

/// One rendered node: the wire shape of the fetch-tree response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: i64,
    pub label: String,
    pub link_type: LinkType,
    pub target: String,
    pub open_new_tab: bool,
    pub is_active: bool,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(item: &MenuItem) -> Self {
        Self {
            id: item.id,
            label: item.label.clone(),
            link_type: item.link_type(),
            target: item.target().to_string(),
            open_new_tab: item.open_new_tab,
            is_active: item.is_active,
            children: Vec::new(),
        }
    }
}

/// Builds the ordered forest for one menu's items.
///
/// Siblings are ordered by `sort_order`, then `id`. Activity is not looked at;
/// filter with [`active_only`] first for the public view. A parent missing from
/// `items`, or an item that no root leads to, is reported as `OrphanReference`.
pub fn assemble(items: &[MenuItem]) -> Result<Vec<TreeNode>> {
    let ids: HashSet<i64> = items.iter().map(|item| item.id).collect();

    let mut groups: HashMap<Option<i64>, Vec<&MenuItem>> = HashMap::new();
    for item in items {
        if let Some(parent_id) = item.parent_id {
            if !ids.contains(&parent_id) {
                error!(
                    item_id = item.id,
                    parent_id, "menu item points at a parent outside its menu"
                );
                return Err(MenuError::OrphanReference {
                    item_id: item.id,
                    parent_id,
                });
            }
        }
        groups.entry(item.parent_id).or_default().push(item);
    }
    for siblings in groups.values_mut() {
        siblings.sort_by_key(|item| (item.sort_order, item.id));
    }

    let mut attached = 0;
    let roots = build_level(None, &groups, &mut attached);

    if attached < items.len() {
        // Whatever is left hangs off a parent loop no root reaches
        let reached = collect_ids(&roots);
        if let Some(stranded) = items
            .iter()
            .filter(|item| !reached.contains(&item.id))
            .min_by_key(|item| item.id)
        {
            let parent_id = stranded.parent_id.unwrap_or_default();
            error!(
                item_id = stranded.id,
                parent_id, "menu item is not reachable from any root"
            );
            return Err(MenuError::OrphanReference {
                item_id: stranded.id,
                parent_id,
            });
        }
    }

    Ok(roots)
}

fn build_level(
    parent_id: Option<i64>,
    groups: &HashMap<Option<i64>, Vec<&MenuItem>>,
    attached: &mut usize,
) -> Vec<TreeNode> {
    let Some(siblings) = groups.get(&parent_id) else {
        return Vec::new();
    };

    let mut nodes = Vec::with_capacity(siblings.len());
    for item in siblings {
        *attached += 1;
        let mut node = TreeNode::leaf(item);
        node.children = build_level(Some(item.id), groups, attached);
        nodes.push(node);
    }
    nodes
}

fn collect_ids(nodes: &[TreeNode]) -> HashSet<i64> {
    let mut ids = HashSet::new();
    let mut stack: Vec<&TreeNode> = nodes.iter().collect();
    while let Some(node) = stack.pop() {
        ids.insert(node.id);
        stack.extend(node.children.iter());
    }
    ids
}

/// Drops inactive items together with everything beneath them.
pub fn active_only(items: &[MenuItem]) -> Vec<MenuItem> {
    let ancestry = Ancestry::from_items(items);
    let mut hidden: HashSet<i64> = HashSet::new();
    for item in items.iter().filter(|item| !item.is_active) {
        hidden.insert(item.id);
        hidden.extend(ancestry.descendants(item.id));
    }

    items
        .iter()
        .filter(|item| !hidden.contains(&item.id))
        .cloned()
        .collect()
}

/// The reorder batch that reproduces `tree` exactly: every node with its
/// parent and its index among siblings.
pub fn flatten(tree: &[TreeNode]) -> Vec<ReorderEntry> {
    let mut out = Vec::new();
    flatten_into(tree, None, &mut out);
    out
}

fn flatten_into(nodes: &[TreeNode], parent_id: Option<i64>, out: &mut Vec<ReorderEntry>) {
    for (index, node) in nodes.iter().enumerate() {
        out.push(ReorderEntry {
            id: node.id,
            parent_id,
            order: index as i64,
        });
        flatten_into(&node.children, Some(node.id), out);
    }
}

pub fn find(tree: &[TreeNode], id: i64) -> Option<&TreeNode> {
    for node in tree {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find(&node.children, id) {
            return Some(found);
        }
    }
    None
}

pub fn node_count(tree: &[TreeNode]) -> usize {
    tree.iter().map(|node| 1 + node_count(&node.children)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Link;

    fn item(id: i64, parent_id: Option<i64>, sort_order: i64) -> MenuItem {
        MenuItem {
            id,
            menu_id: 1,
            parent_id,
            label: format!("item {}", id),
            link: Link::Dropdown,
            open_new_tab: false,
            is_active: true,
            sort_order,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn siblings_sorted_with_id_tiebreak() {
        let items = vec![item(3, None, 1), item(1, None, 1), item(2, None, 0)];
        let tree = assemble(&items).unwrap();
        let ids: Vec<i64> = tree.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn nests_to_arbitrary_depth() {
        let items = vec![item(1, None, 0), item(2, Some(1), 0), item(3, Some(2), 0)];
        let tree = assemble(&items).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children[0].children[0].id, 3);
        assert_eq!(node_count(&tree), 3);
    }

    #[test]
    fn missing_parent_is_orphan() {
        let items = vec![item(1, None, 0), item(2, Some(9), 0)];
        let err = assemble(&items).unwrap_err();
        assert!(matches!(
            err,
            MenuError::OrphanReference {
                item_id: 2,
                parent_id: 9
            }
        ));
    }

    #[test]
    fn stored_loop_is_orphan() {
        let items = vec![item(1, None, 0), item(2, Some(3), 0), item(3, Some(2), 0)];
        let err = assemble(&items).unwrap_err();
        assert!(matches!(err, MenuError::OrphanReference { item_id: 2, .. }));
    }

    #[test]
    fn inactive_subtree_is_pruned() {
        let mut hidden = item(2, Some(1), 0);
        hidden.is_active = false;
        let items = vec![item(1, None, 0), hidden, item(3, Some(2), 0), item(4, Some(1), 1)];

        let visible = active_only(&items);
        let ids: Vec<i64> = visible.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert!(assemble(&visible).is_ok());
    }

    #[test]
    fn flatten_lists_positions() {
        let items = vec![item(1, None, 5), item(2, Some(1), 9), item(3, None, 7)];
        let batch = flatten(&assemble(&items).unwrap());
        assert_eq!(
            batch,
            vec![
                ReorderEntry { id: 1, parent_id: None, order: 0 },
                ReorderEntry { id: 2, parent_id: Some(1), order: 0 },
                ReorderEntry { id: 3, parent_id: None, order: 1 },
            ]
        );
    }
}
