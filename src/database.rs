use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use crate::models::ConfigItem;

/// Key holding the serialized task list.
pub const TASKS_KEY: &str = "taskmaster-tasks";

/// Local key-value storage plus the config table, backed by one SQLite file.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn default_path() -> PathBuf {
        let home_dir = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home_dir).join(".taskmaster.db")
    }

    pub fn open(path: &Path) -> Result<Self> {
        log::debug!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS config (
                id INTEGER PRIMARY KEY,
                key_name TEXT UNIQUE NOT NULL,
                value TEXT NOT NULL,
                description TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        Ok(Database { conn })
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM storage WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO storage (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    /// Returns whether anything was removed.
    pub fn remove_item(&self, key: &str) -> Result<bool> {
        let rows_affected = self.conn.execute("DELETE FROM storage WHERE key = ?1", [key])?;
        Ok(rows_affected > 0)
    }

    pub fn set_config(&self, key: &str, value: &str, description: Option<&str>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO config (key_name, value, description) VALUES (?1, ?2, ?3)
             ON CONFLICT(key_name) DO UPDATE SET
                value = excluded.value,
                description = COALESCE(excluded.description, config.description),
                updated_at = CURRENT_TIMESTAMP",
            rusqlite::params![key, value, description],
        )?;
        Ok(())
    }

    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM config WHERE key_name = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn delete_config(&self, key: &str) -> Result<bool> {
        let rows_affected = self.conn.execute("DELETE FROM config WHERE key_name = ?1", [key])?;
        Ok(rows_affected > 0)
    }

    pub fn get_all_configs(&self) -> Result<Vec<ConfigItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT key_name, value, description, created_at, updated_at FROM config ORDER BY key_name",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(ConfigItem {
                key_name: row.get(0)?,
                value: row.get(1)?,
                description: row.get(2)?,
                created_at: row.get(3)?,
                updated_at: row.get(4)?,
            })
        })?;

        let mut configs = Vec::new();
        for row in rows {
            configs.push(row?);
        }

        Ok(configs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_items_round_trip_and_overwrite() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_item(TASKS_KEY).unwrap(), None);

        db.set_item(TASKS_KEY, "[]").unwrap();
        db.set_item(TASKS_KEY, "[1]").unwrap();
        assert_eq!(db.get_item(TASKS_KEY).unwrap().as_deref(), Some("[1]"));

        assert!(db.remove_item(TASKS_KEY).unwrap());
        assert!(!db.remove_item(TASKS_KEY).unwrap());
        assert_eq!(db.get_item(TASKS_KEY).unwrap(), None);
    }

    #[test]
    fn config_keeps_description_on_update() {
        let db = Database::open_in_memory().unwrap();
        db.set_config("default_page", "tasks", Some("Page shown at startup")).unwrap();
        db.set_config("default_page", "calendar", None).unwrap();

        let configs = db.get_all_configs().unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].value, "calendar");
        assert_eq!(configs[0].description.as_deref(), Some("Page shown at startup"));

        assert!(db.delete_config("default_page").unwrap());
        assert_eq!(db.get_config("default_page").unwrap(), None);
    }
}
