// Flat menu item table access

use crate::data::current_timestamp;
use crate::error::{MenuError, Result};
use crate::model::{Link, LinkType, MenuItem};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

const ITEM_COLUMNS: &str = "id, menu_id, parent_id, label, link_type, target, open_new_tab, \
                            is_active, sort_order, created_at, updated_at";

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<MenuItem> {
    let link_type: String = row.get(4)?;
    let link_type: LinkType = link_type
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    let target: String = row.get(5)?;

    Ok(MenuItem {
        id: row.get(0)?,
        menu_id: row.get(1)?,
        parent_id: row.get(2)?,
        label: row.get(3)?,
        link: Link::from_parts(link_type, &target),
        open_new_tab: row.get(6)?,
        is_active: row.get(7)?,
        sort_order: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// No caching: every call reads what the connection (or open transaction) sees.
pub struct ItemRepository<'c> {
    conn: &'c Connection,
}

impl<'c> ItemRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn menu_exists(&self, menu_id: i64) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM menus WHERE id = ?1",
                params![menu_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn find(&self, id: i64) -> Result<Option<MenuItem>> {
        let sql = format!("SELECT {} FROM menu_items WHERE id = ?1", ITEM_COLUMNS);
        let item = self
            .conn
            .query_row(&sql, params![id], item_from_row)
            .optional()?;
        Ok(item)
    }

    pub fn get(&self, id: i64) -> Result<MenuItem> {
        self.find(id)?
            .ok_or_else(|| MenuError::not_found("Menu item", id))
    }

    pub fn list_by_menu(&self, menu_id: i64) -> Result<Vec<MenuItem>> {
        let sql = format!(
            "SELECT {} FROM menu_items WHERE menu_id = ?1 ORDER BY id",
            ITEM_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let items = stmt
            .query_map(params![menu_id], item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(menu_id, count = items.len(), "loaded menu items");
        Ok(items)
    }

    /// Sibling group in display order.
    pub fn children_of(&self, menu_id: i64, parent_id: Option<i64>) -> Result<Vec<MenuItem>> {
        let sql = format!(
            "SELECT {} FROM menu_items WHERE menu_id = ?1 AND parent_id IS ?2
             ORDER BY sort_order, id",
            ITEM_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let items = stmt
            .query_map(params![menu_id, parent_id], item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    pub fn next_sort_order(&self, menu_id: i64, parent_id: Option<i64>) -> Result<i64> {
        let next = self.conn.query_row(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM menu_items
             WHERE menu_id = ?1 AND parent_id IS ?2",
            params![menu_id, parent_id],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(next)
    }

    /// Inserts `item`, ignoring its `id` and timestamps, and returns the stored row.
    pub fn insert(&self, item: &MenuItem) -> Result<MenuItem> {
        let timestamp = current_timestamp();
        self.conn.execute(
            "INSERT INTO menu_items (
                menu_id, parent_id, label, link_type, target, open_new_tab,
                is_active, sort_order, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                item.menu_id,
                item.parent_id,
                &item.label,
                item.link_type().as_str(),
                item.target(),
                item.open_new_tab,
                item.is_active,
                item.sort_order,
                timestamp,
                timestamp,
            ],
        )?;

        Ok(MenuItem {
            id: self.conn.last_insert_rowid(),
            created_at: timestamp,
            updated_at: timestamp,
            ..item.clone()
        })
    }

    /// Writes every mutable column of `item`. `menu_id` is never rewritten.
    pub fn update(&self, item: &MenuItem) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE menu_items SET
                parent_id = ?1, label = ?2, link_type = ?3, target = ?4,
                open_new_tab = ?5, is_active = ?6, sort_order = ?7, updated_at = ?8
             WHERE id = ?9",
            params![
                item.parent_id,
                &item.label,
                item.link_type().as_str(),
                item.target(),
                item.open_new_tab,
                item.is_active,
                item.sort_order,
                current_timestamp(),
                item.id,
            ],
        )?;
        if changed == 0 {
            return Err(MenuError::not_found("Menu item", item.id));
        }
        Ok(())
    }

    pub fn set_position(&self, id: i64, parent_id: Option<i64>, sort_order: i64) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE menu_items SET parent_id = ?1, sort_order = ?2, updated_at = ?3 WHERE id = ?4",
            params![parent_id, sort_order, current_timestamp(), id],
        )?;
        if changed == 0 {
            return Err(MenuError::not_found("Menu item", id));
        }
        Ok(())
    }

    /// Deletes `ids` in reverse order, so pass parents before their descendants.
    pub fn delete(&self, ids: &[i64]) -> Result<usize> {
        let mut stmt = self.conn.prepare("DELETE FROM menu_items WHERE id = ?1")?;
        let mut removed = 0;
        for id in ids.iter().rev() {
            removed += stmt.execute(params![id])?;
        }
        Ok(removed)
    }
}
