//! JSON contract for the admin UI: fetch tree, mutate item, reorder.
//!
//! Routing, auth and rendering live in front of this module; it only turns
//! request bodies into engine calls and engine results into response bodies.

use crate::data::Database;
use crate::error::{MenuError, Result};
use crate::model::{ItemChanges, LinkType, NewMenuItem};
use crate::mutation::MenuEditor;
use crate::pages::PageRegistry;
use crate::reorder::ReorderEntry;
use crate::tree::{self, TreeNode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeView {
    /// Every stored item, for the editor.
    Admin,
    /// Active items only; inactive subtrees are hidden.
    Public,
}

/// Body of item create and replace requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemPayload {
    pub label: String,
    pub link_type: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub open_new_tab: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: Option<i64>,
}

fn default_active() -> bool {
    true
}

impl ItemPayload {
    pub fn into_new_item(self, menu_id: i64) -> Result<NewMenuItem> {
        let link_type: LinkType = self.link_type.parse()?;
        Ok(NewMenuItem {
            menu_id,
            label: self.label,
            link_type,
            target: self.target.unwrap_or_default(),
            parent_id: self.parent_id,
            open_new_tab: self.open_new_tab,
            is_active: self.is_active,
            sort_order: self.sort_order,
        })
    }

    /// A full replacement: every field is set, a missing `parent_id` means root.
    pub fn into_changes(self) -> Result<ItemChanges> {
        let link_type: LinkType = self.link_type.parse()?;
        Ok(ItemChanges {
            label: Some(self.label),
            link_type: Some(link_type),
            target: Some(self.target.unwrap_or_default()),
            parent_id: Some(self.parent_id),
            open_new_tab: Some(self.open_new_tab),
            is_active: Some(self.is_active),
            sort_order: self.sort_order,
        })
    }
}

/// Structured error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<i64>,
    /// Code of the underlying violation for rejected batches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl From<&MenuError> for ErrorBody {
    fn from(err: &MenuError) -> Self {
        let root = err.root_cause();
        let field = match root {
            MenuError::Validation { field, .. } => Some(field.clone()),
            _ => None,
        };
        let item_id = match err {
            MenuError::ReorderRejected { item_id, .. }
            | MenuError::CycleDetected { item_id, .. }
            | MenuError::CrossMenuReference { item_id, .. }
            | MenuError::OrphanReference { item_id, .. } => Some(*item_id),
            _ => None,
        };
        let cause = match err {
            MenuError::ReorderRejected { .. } => Some(root.code().to_string()),
            _ => None,
        };

        // Storage details stay in the logs
        let message = if root.is_internal() && !matches!(root, MenuError::OrphanReference { .. }) {
            "internal error".to_string()
        } else {
            err.to_string()
        };

        ErrorBody {
            status: err.status_code(),
            error: err.code().to_string(),
            message,
            field,
            item_id,
            cause,
        }
    }
}

pub fn fetch_tree(db: &Database, menu_id: i64, view: TreeView) -> Result<Vec<TreeNode>> {
    db.get_menu(menu_id)?;
    let items = db.items().list_by_menu(menu_id)?;
    match view {
        TreeView::Admin => tree::assemble(&items),
        TreeView::Public => tree::assemble(&tree::active_only(&items)),
    }
}

/// The node for `item_id` with its current subtree.
pub fn fetch_node(db: &Database, item_id: i64) -> Result<TreeNode> {
    let item = db.items().get(item_id)?;
    let forest = fetch_tree(db, item.menu_id, TreeView::Admin)?;
    tree::find(&forest, item_id)
        .cloned()
        .ok_or_else(|| MenuError::not_found("Menu item", item_id))
}

pub fn create_item(
    db: &mut Database,
    pages: &dyn PageRegistry,
    menu_id: i64,
    payload: ItemPayload,
) -> Result<TreeNode> {
    let new = payload.into_new_item(menu_id)?;
    let created = MenuEditor::new(db, pages).create(new)?;
    Ok(TreeNode::leaf(&created))
}

pub fn replace_item(
    db: &mut Database,
    pages: &dyn PageRegistry,
    item_id: i64,
    payload: ItemPayload,
) -> Result<TreeNode> {
    let changes = payload.into_changes()?;
    MenuEditor::new(db, pages).update(item_id, changes)?;
    fetch_node(db, item_id)
}

pub fn delete_item(db: &mut Database, pages: &dyn PageRegistry, item_id: i64) -> Result<Vec<i64>> {
    MenuEditor::new(db, pages).delete(item_id)
}

/// Parses a reorder request body. A malformed body is the caller's fault.
pub fn parse_reorder(body: &str) -> Result<Vec<ReorderEntry>> {
    serde_json::from_str(body).map_err(|e| MenuError::validation("body", e.to_string()))
}

/// Parses an item create or replace request body.
pub fn parse_item(body: &str) -> Result<ItemPayload> {
    serde_json::from_str(body).map_err(|e| MenuError::validation("body", e.to_string()))
}

/// Applies `batch` and returns the admin tree snapshot after the commit.
pub fn reorder(
    db: &mut Database,
    pages: &dyn PageRegistry,
    menu_id: i64,
    batch: &[ReorderEntry],
) -> Result<Vec<TreeNode>> {
    MenuEditor::new(db, pages).reorder(menu_id, batch)?;
    fetch_tree(db, menu_id, TreeView::Admin)
}
