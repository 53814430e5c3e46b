// Single-item create / update / delete

use crate::ancestry::Ancestry;
use crate::data::Database;
use crate::error::{MenuError, Result};
use crate::model::{ItemChanges, MenuItem, NewMenuItem};
use crate::pages::PageRegistry;
use crate::repo::ItemRepository;
use crate::validation::{validate_label, validate_link};
use tracing::{debug, info};

/// Write side of the menu engine. Every operation validates first and then
/// commits in a single transaction, so a failed call leaves storage untouched.
pub struct MenuEditor<'a> {
    pub(crate) db: &'a mut Database,
    pub(crate) pages: &'a dyn PageRegistry,
}

impl<'a> MenuEditor<'a> {
    pub fn new(db: &'a mut Database, pages: &'a dyn PageRegistry) -> Self {
        Self { db, pages }
    }

    pub fn create(&mut self, new: NewMenuItem) -> Result<MenuItem> {
        let label = validate_label(&new.label)?;
        let link = validate_link(new.link_type, &new.target, self.pages)?;
        let open_new_tab = new.open_new_tab && link.is_navigable();

        let created = self.db.transaction(|repo| {
            if !repo.menu_exists(new.menu_id)? {
                return Err(MenuError::not_found("Menu", new.menu_id));
            }
            if let Some(parent_id) = new.parent_id {
                // A brand-new item has no descendants, so only membership is checked
                check_parent_menu(repo, new.menu_id, parent_id)?;
            }

            let sort_order = match new.sort_order {
                Some(hint) => {
                    let siblings = repo.children_of(new.menu_id, new.parent_id)?;
                    slot_into_group(repo, &siblings, hint)?
                }
                None => repo.next_sort_order(new.menu_id, new.parent_id)?,
            };

            repo.insert(&MenuItem {
                id: 0,
                menu_id: new.menu_id,
                parent_id: new.parent_id,
                label,
                link,
                open_new_tab,
                is_active: new.is_active,
                sort_order,
                created_at: 0,
                updated_at: 0,
            })
        })?;

        info!(
            item_id = created.id,
            menu_id = created.menu_id,
            "created {} item '{}'",
            created.link_type(),
            created.label
        );
        Ok(created)
    }

    pub fn update(&mut self, id: i64, changes: ItemChanges) -> Result<MenuItem> {
        let pages = self.pages;

        let updated = self.db.transaction(|repo| {
            let mut item = repo.get(id)?;
            if changes.is_empty() {
                return Ok(item);
            }

            if let Some(label) = &changes.label {
                item.label = validate_label(label)?;
            }
            if changes.touches_link() {
                let link_type = changes.link_type.unwrap_or_else(|| item.link_type());
                let target = changes
                    .target
                    .clone()
                    .unwrap_or_else(|| item.target().to_string());
                item.link = validate_link(link_type, &target, pages)?;
            }
            if let Some(open_new_tab) = changes.open_new_tab {
                item.open_new_tab = open_new_tab;
            }
            if !item.link.is_navigable() {
                item.open_new_tab = false;
            }
            if let Some(is_active) = changes.is_active {
                item.is_active = is_active;
            }

            let reparent = changes
                .parent_id
                .filter(|parent_id| *parent_id != item.parent_id);
            if let Some(Some(parent_id)) = reparent {
                check_parent_menu(repo, item.menu_id, parent_id)?;
                let ancestry = Ancestry::from_items(&repo.list_by_menu(item.menu_id)?);
                if ancestry.is_descendant_or_self(parent_id, item.id) {
                    return Err(MenuError::CycleDetected {
                        item_id: item.id,
                        parent_id,
                    });
                }
            }

            if let Some(parent_id) = reparent {
                debug!(item_id = item.id, ?parent_id, "reparenting menu item");
                item.parent_id = parent_id;
            }
            if let Some(hint) = changes.sort_order {
                let siblings: Vec<MenuItem> = repo
                    .children_of(item.menu_id, item.parent_id)?
                    .into_iter()
                    .filter(|sibling| sibling.id != item.id)
                    .collect();
                item.sort_order = slot_into_group(repo, &siblings, hint)?;
            } else if reparent.is_some() {
                // Still stored under the old parent, so this is the new group's tail
                item.sort_order = repo.next_sort_order(item.menu_id, item.parent_id)?;
            }

            repo.update(&item)?;
            repo.get(item.id)
        })?;

        info!(item_id = updated.id, menu_id = updated.menu_id, "updated menu item");
        Ok(updated)
    }

    /// Removes the item and its whole subtree. Returns the removed ids, the
    /// item itself first.
    pub fn delete(&mut self, id: i64) -> Result<Vec<i64>> {
        let removed = self.db.transaction(|repo| {
            let item = repo.get(id)?;
            let ancestry = Ancestry::from_items(&repo.list_by_menu(item.menu_id)?);

            let mut ids = vec![item.id];
            ids.extend(ancestry.descendants(item.id));
            repo.delete(&ids)?;
            Ok(ids)
        })?;

        info!(item_id = id, removed = removed.len(), "deleted menu item subtree");
        Ok(removed)
    }
}

fn check_parent_menu(repo: &ItemRepository<'_>, menu_id: i64, parent_id: i64) -> Result<()> {
    let parent = repo.get(parent_id)?;
    if parent.menu_id != menu_id {
        return Err(MenuError::CrossMenuReference {
            item_id: parent_id,
            menu_id,
            other_menu_id: parent.menu_id,
        });
    }
    Ok(())
}

/// Slots an item into `siblings` (sorted, without the item) at index `hint`,
/// clamped to the group, and renumbers the group `0..n` around it.
fn slot_into_group(repo: &ItemRepository<'_>, siblings: &[MenuItem], hint: i64) -> Result<i64> {
    let position = hint.clamp(0, siblings.len() as i64);
    for (index, sibling) in siblings.iter().enumerate() {
        let index = index as i64;
        let wanted = if index < position { index } else { index + 1 };
        if sibling.sort_order != wanted {
            repo.set_position(sibling.id, sibling.parent_id, wanted)?;
        }
    }
    Ok(position)
}
