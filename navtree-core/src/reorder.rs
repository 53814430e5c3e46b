//! Atomic bulk reorder for drag-and-drop.
//!
//! A batch is the desired end state of every item the client moved. The
//! whole proposed tree is validated before anything is written: either every
//! placement commits in one transaction or the batch is rejected with the
//! first offending entry.

use crate::ancestry::Ancestry;
use crate::error::{MenuError, Result};
use crate::model::MenuItem;
use crate::mutation::MenuEditor;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

/// One `{id, parent_id, order}` entry of a reorder request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderEntry {
    pub id: i64,
    pub parent_id: Option<i64>,
    /// Desired position among the new siblings. A hint, not a stored value.
    pub order: i64,
}

/// Final position of an item whose parent or sort order changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub sort_order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReorderOutcome {
    pub menu_id: i64,
    pub requested: usize,
    pub written: usize,
}

/// Computes the placements that turn `items` (one menu's full item set) into
/// the state requested by `batch`, without writing anything.
///
/// `menu_of` resolves ids that are not part of this menu, so foreign ids can
/// be told apart from missing ones.
pub fn plan<F>(
    menu_id: i64,
    items: &[MenuItem],
    batch: &[ReorderEntry],
    menu_of: F,
) -> Result<Vec<Placement>>
where
    F: Fn(i64) -> Result<Option<i64>>,
{
    let index: HashMap<i64, &MenuItem> = items.iter().map(|item| (item.id, item)).collect();
    let outside = |id: i64| -> Result<MenuError> {
        Ok(match menu_of(id)? {
            Some(other_menu_id) => MenuError::CrossMenuReference {
                item_id: id,
                menu_id,
                other_menu_id,
            },
            None => MenuError::not_found("Menu item", id),
        })
    };

    // Entries refer to this menu's items and name each item once
    let mut seen = HashSet::new();
    for entry in batch {
        if !seen.insert(entry.id) {
            return Err(MenuError::rejected(
                entry.id,
                MenuError::validation("id", format!("item {} appears more than once", entry.id)),
            ));
        }
        if !index.contains_key(&entry.id) {
            return Err(MenuError::rejected(entry.id, outside(entry.id)?));
        }
        if let Some(parent_id) = entry.parent_id {
            if !index.contains_key(&parent_id) {
                return Err(MenuError::rejected(entry.id, outside(parent_id)?));
            }
        }
    }

    // Untouched items must still hang off something in this menu
    for item in items.iter().filter(|item| !seen.contains(&item.id)) {
        if let Some(parent_id) = item.parent_id {
            if !index.contains_key(&parent_id) {
                return Err(MenuError::rejected(
                    item.id,
                    MenuError::OrphanReference {
                        item_id: item.id,
                        parent_id,
                    },
                ));
            }
        }
    }

    let mut proposed = Ancestry::from_items(items);
    for entry in batch {
        proposed.set_parent(entry.id, entry.parent_id);
    }

    // Chained moves in one batch are judged against the end state, not the current one
    for entry in batch {
        if let Some(parent_id) = entry.parent_id {
            if proposed.is_descendant_or_self(parent_id, entry.id) {
                return Err(MenuError::rejected(
                    entry.id,
                    MenuError::CycleDetected {
                        item_id: entry.id,
                        parent_id,
                    },
                ));
            }
        }
    }
    if let Some(item_id) = proposed.find_cycle() {
        let parent_id = proposed.parent_of(item_id).unwrap_or_default();
        return Err(MenuError::rejected(
            item_id,
            MenuError::CycleDetected { item_id, parent_id },
        ));
    }

    let moved: HashMap<i64, &ReorderEntry> =
        batch.iter().map(|entry| (entry.id, entry)).collect();

    // Unmoved siblings keep their stored relative order
    let mut groups: BTreeMap<Option<i64>, Vec<i64>> = BTreeMap::new();
    let mut unmoved: Vec<&MenuItem> = items
        .iter()
        .filter(|item| !moved.contains_key(&item.id))
        .collect();
    unmoved.sort_by_key(|item| (item.sort_order, item.id));
    for item in unmoved {
        groups.entry(item.parent_id).or_default().push(item.id);
    }

    // Moved items land at index `order` of their new group, lowest order
    // first; equal orders keep batch order
    let mut arrivals: Vec<(usize, &ReorderEntry)> = batch.iter().enumerate().collect();
    arrivals.sort_by_key(|(position, entry)| (entry.order, *position));
    let mut last_slot: HashMap<Option<i64>, usize> = HashMap::new();
    for (_, entry) in arrivals {
        let group = groups.entry(entry.parent_id).or_default();
        let wanted = usize::try_from(entry.order).unwrap_or(0).min(group.len());
        let slot = match last_slot.get(&entry.parent_id) {
            Some(&last) if wanted <= last => last + 1,
            _ => wanted,
        };
        group.insert(slot, entry.id);
        last_slot.insert(entry.parent_id, slot);
    }

    let mut placements = Vec::new();
    for (parent_id, members) in groups {
        for (sort_order, id) in members.into_iter().enumerate() {
            let sort_order = sort_order as i64;
            let current = index[&id];
            if current.parent_id != parent_id || current.sort_order != sort_order {
                placements.push(Placement {
                    id,
                    parent_id,
                    sort_order,
                });
            }
        }
    }

    debug!(
        menu_id,
        requested = batch.len(),
        changed = placements.len(),
        "planned reorder"
    );
    Ok(placements)
}

impl MenuEditor<'_> {
    /// Applies a reorder batch to `menu_id` all-or-nothing.
    pub fn reorder(&mut self, menu_id: i64, batch: &[ReorderEntry]) -> Result<ReorderOutcome> {
        let outcome = self.db.transaction(|repo| {
            if !repo.menu_exists(menu_id)? {
                return Err(MenuError::not_found("Menu", menu_id));
            }
            let items = repo.list_by_menu(menu_id)?;
            let placements = plan(menu_id, &items, batch, |id| {
                Ok(repo.find(id)?.map(|item| item.menu_id))
            })
            .inspect_err(|e| warn!(menu_id, "reorder rejected: {}", e))?;

            for placement in &placements {
                repo.set_position(placement.id, placement.parent_id, placement.sort_order)?;
            }

            Ok(ReorderOutcome {
                menu_id,
                requested: batch.len(),
                written: placements.len(),
            })
        })?;

        info!(
            menu_id,
            requested = outcome.requested,
            written = outcome.written,
            "applied reorder"
        );
        Ok(outcome)
    }
}
