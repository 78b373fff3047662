//! sqlite-store: SQLite implementation of the PropertyStore port for local/dev.
//!
//! Purpose
//! - Persist the web part property bag (title and ordered link list) in a
//!   single file so the host survives restarts without cloud dependencies.
//! - Implements the `PropertyStore` trait from the `domain` crate.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.
//! - `save_links` replaces the whole list inside one transaction; every
//!   notification is a full snapshot, never a delta.
//! - `icon_type` and `id` are nullable: rows written before those columns
//!   existed load as fluent icons with freshly assigned ids.

use std::path::Path;

use domain::{CoreError, IconType, LinkList, PropertyStore, StoredLink, WebPartProperties};
use rusqlite::{params, Connection, OptionalExtension};

/// SQLite-backed property store.
pub struct SqliteStore {
    conn: std::sync::Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a SQLite database at the given path and ensure schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(map_sqerr)?;
        init_schema(&conn)?;
        Ok(Self { conn: std::sync::Mutex::new(conn) })
    }
}

fn init_schema(conn: &Connection) -> Result<(), CoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS web_part (
            name TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS quick_links (
            position INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            icon TEXT NOT NULL DEFAULT '',
            open_in_new_tab INTEGER NOT NULL DEFAULT 1
        );
        "#
    ).map_err(map_sqerr)?;
    // Migration: columns added after the first release (ignore "duplicate column")
    let _ = conn.execute("ALTER TABLE quick_links ADD COLUMN icon_type TEXT", []);
    let _ = conn.execute("ALTER TABLE quick_links ADD COLUMN id TEXT", []);
    Ok(())
}

fn map_sqerr<E: std::fmt::Display>(e: E) -> CoreError { CoreError::Repository(format!("sqlite error: {e}")) }

fn insert_row(conn: &Connection, position: i64, link: &StoredLink) -> Result<(), CoreError> {
    conn.execute(
        "INSERT INTO quick_links(position, id, title, url, icon, icon_type, open_in_new_tab) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            position,
            link.id,
            link.title,
            link.url,
            link.icon,
            link.icon_type.map(|t| t.as_str()),
            link.open_in_new_tab as i64,
        ],
    ).map_err(map_sqerr)?;
    Ok(())
}

fn row_to_stored(row: &rusqlite::Row) -> Result<StoredLink, CoreError> {
    let id: Option<String> = row.get(0).map_err(map_sqerr)?;
    let title: String = row.get(1).map_err(map_sqerr)?;
    let url: String = row.get(2).map_err(map_sqerr)?;
    let icon: String = row.get(3).map_err(map_sqerr)?;
    let icon_type: Option<String> = row.get(4).map_err(map_sqerr)?;
    let open_in_new_tab: i64 = row.get(5).map_err(map_sqerr)?;
    Ok(StoredLink {
        id,
        title,
        url,
        icon,
        // Unknown values (e.g. from a newer version) load like missing ones.
        icon_type: icon_type.as_deref().and_then(IconType::parse),
        open_in_new_tab: open_in_new_tab != 0,
    })
}

impl PropertyStore for SqliteStore {
    fn load(&self) -> Result<WebPartProperties, CoreError> {
        let conn = self.conn.lock().map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        let title: Option<String> = conn
            .query_row("SELECT value FROM web_part WHERE name = 'title'", [], |row| row.get(0))
            .optional()
            .map_err(map_sqerr)?;
        let mut stmt = conn.prepare("SELECT id, title, url, icon, icon_type, open_in_new_tab FROM quick_links ORDER BY position ASC")
            .map_err(map_sqerr)?;
        let mut rows = stmt.query([]).map_err(map_sqerr)?;
        let mut links = Vec::new();
        while let Some(row) = rows.next().map_err(map_sqerr)? {
            links.push(row_to_stored(row)?);
        }
        Ok(WebPartProperties { title: title.unwrap_or_default(), links })
    }

    fn save_links(&self, links: &LinkList) -> Result<(), CoreError> {
        let mut conn = self.conn.lock().map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        let tx = conn.transaction().map_err(map_sqerr)?;
        tx.execute("DELETE FROM quick_links", []).map_err(map_sqerr)?;
        for (position, link) in links.to_stored().iter().enumerate() {
            insert_row(&tx, position as i64, link)?;
        }
        tx.commit().map_err(map_sqerr)
    }

    fn save_title(&self, title: &str) -> Result<(), CoreError> {
        let conn = self.conn.lock().map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        conn.execute(
            "INSERT INTO web_part(name, value) VALUES('title', ?1) ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            params![title],
        ).map_err(map_sqerr)?;
        Ok(())
    }
}
