use crate::error::{MenuError, Result};
use crate::model::{Menu, MenuLocation, Page};
use crate::pages::PageSet;
use crate::repo::ItemRepository;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

/// How long a writer waits for another connection's write lock.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

impl Database {
    pub fn drop(path: &Path) -> std::io::Result<()> {
        fs::remove_file(path)
    }
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        // Single writer, readers don't block it
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let db = Database { conn };
        db.init_schema()?;
        debug!("opened menu database at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
CREATE TABLE IF NOT EXISTS menus (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    location TEXT NOT NULL CHECK(location IN ('header', 'footer', 'sidebar')),
    created_at INTEGER NOT NULL
);

-- Page identifiers that `page` links may point at
CREATE TABLE IF NOT EXISTS pages (
    slug TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS menu_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    menu_id INTEGER NOT NULL,
    parent_id INTEGER,
    label TEXT NOT NULL,
    link_type TEXT NOT NULL CHECK(link_type IN ('page', 'url', 'dropdown')),
    target TEXT NOT NULL DEFAULT '',   -- empty for dropdowns
    open_new_tab BOOLEAN NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    sort_order INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,

    FOREIGN KEY(menu_id) REFERENCES menus(id) ON DELETE CASCADE,
    FOREIGN KEY(parent_id) REFERENCES menu_items(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_menu_items_menu ON menu_items(menu_id);
CREATE INDEX IF NOT EXISTS idx_menu_items_siblings ON menu_items(menu_id, parent_id, sort_order);
            ",
        )?;
        Ok(())
    }

    /// Repository over the committed state, for reads.
    pub fn items(&self) -> ItemRepository<'_> {
        ItemRepository::new(&self.conn)
    }

    /// Runs `f` inside one IMMEDIATE transaction. Concurrent writers queue on
    /// the lock for up to [`BUSY_TIMEOUT`]. Commits when `f` returns `Ok`,
    /// otherwise the transaction is dropped and every write rolls back.
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&ItemRepository<'_>) -> Result<T>,
    {
        // Takes the write lock before the first read
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&ItemRepository::new(&tx))?;
        tx.commit()?;
        Ok(out)
    }

    // Menu management
    pub fn create_menu(&self, name: &str, location: MenuLocation) -> Result<Menu> {
        let name = validate_menu_name(name)?;
        let timestamp = current_timestamp();

        self.conn.execute(
            "INSERT INTO menus (name, location, created_at) VALUES (?1, ?2, ?3)",
            params![&name, location.as_str(), timestamp],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(menu_id = id, "created {} menu '{}'", location, name);

        Ok(Menu {
            id,
            name,
            location,
            created_at: timestamp,
        })
    }

    pub fn get_menu(&self, menu_id: i64) -> Result<Menu> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, location, created_at FROM menus WHERE id = ?1")?;

        let row = stmt
            .query_row(params![menu_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })
            .optional()?;

        match row {
            Some((id, name, location, created_at)) => Ok(Menu {
                id,
                name,
                location: location.parse()?,
                created_at,
            }),
            None => Err(MenuError::not_found("Menu", menu_id)),
        }
    }

    pub fn list_menus(&self) -> Result<Vec<Menu>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, location, created_at FROM menus ORDER BY id")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, name, location, created_at)| {
                Ok(Menu {
                    id,
                    name,
                    location: location.parse()?,
                    created_at,
                })
            })
            .collect()
    }

    pub fn rename_menu(
        &self,
        menu_id: i64,
        name: &str,
        location: Option<MenuLocation>,
    ) -> Result<Menu> {
        let name = validate_menu_name(name)?;
        let current = self.get_menu(menu_id)?;
        let location = location.unwrap_or(current.location);

        self.conn.execute(
            "UPDATE menus SET name = ?1, location = ?2 WHERE id = ?3",
            params![&name, location.as_str(), menu_id],
        )?;

        Ok(Menu {
            name,
            location,
            ..current
        })
    }

    /// Deletes a menu together with all of its items. Returns the number of items removed.
    pub fn delete_menu(&mut self, menu_id: i64) -> Result<usize> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed: usize = tx.query_row(
            "SELECT COUNT(*) FROM menu_items WHERE menu_id = ?1",
            params![menu_id],
            |row| row.get::<_, i64>(0),
        )? as usize;

        // Items before the menu row
        tx.execute("DELETE FROM menu_items WHERE menu_id = ?1", params![menu_id])?;
        let deleted = tx.execute("DELETE FROM menus WHERE id = ?1", params![menu_id])?;
        if deleted == 0 {
            return Err(MenuError::not_found("Menu", menu_id));
        }
        tx.commit()?;

        info!(menu_id, removed, "deleted menu");
        Ok(removed)
    }

    // Page registry
    pub fn add_page(&self, slug: &str, title: &str) -> Result<Page> {
        let slug = slug.trim();
        if slug.is_empty() || slug.chars().any(char::is_whitespace) {
            return Err(MenuError::validation(
                "slug",
                "page identifier must be non-empty and contain no spaces",
            ));
        }
        let title = if title.trim().is_empty() {
            slug
        } else {
            title.trim()
        };

        self.conn.execute(
            "INSERT INTO pages (slug, title, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(slug) DO UPDATE SET title = excluded.title",
            params![slug, title, current_timestamp()],
        )?;

        Ok(Page {
            slug: slug.to_string(),
            title: title.to_string(),
        })
    }

    pub fn list_pages(&self) -> Result<Vec<Page>> {
        let mut stmt = self
            .conn
            .prepare("SELECT slug, title FROM pages ORDER BY slug")?;

        let pages = stmt
            .query_map([], |row| {
                Ok(Page {
                    slug: row.get(0)?,
                    title: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(pages)
    }

    /// Snapshot of registered page identifiers for link validation.
    pub fn page_registry(&self) -> Result<PageSet> {
        let mut stmt = self.conn.prepare("SELECT slug FROM pages")?;
        let slugs = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(slugs.into_iter().collect())
    }

    pub fn get_connection(&self) -> &Connection {
        &self.conn
    }
}

fn validate_menu_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(MenuError::validation("name", "menu name is required"));
    }
    Ok(name.to_string())
}
