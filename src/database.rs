use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use crate::config::KNOWN_KEYS;
use crate::models::ConfigItem;

/// Local settings store backed by SQLite.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new() -> Result<Self> {
        let home_dir = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let db_path = PathBuf::from(home_dir).join(".tasktimer.db");
        Self::open(&db_path)
    }

    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open settings database at {}", path.display()))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS configs (
                id INTEGER PRIMARY KEY,
                key_name TEXT UNIQUE NOT NULL,
                value TEXT NOT NULL,
                description TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        // Seed the keys that have defaults so `config-list` shows them.
        for (key, default, description) in KNOWN_KEYS {
            if let Some(default) = default {
                conn.execute(
                    "INSERT OR IGNORE INTO configs (key_name, value, description) VALUES (?1, ?2, ?3)",
                    params![key, default, description],
                )?;
            }
        }

        Ok(Database { conn })
    }

    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        let description = KNOWN_KEYS
            .iter()
            .find(|(name, _, _)| *name == key)
            .map(|(_, _, description)| *description);

        self.conn.execute(
            "INSERT INTO configs (key_name, value, description) VALUES (?1, ?2, ?3)
             ON CONFLICT(key_name) DO UPDATE SET
                value = excluded.value,
                updated_at = CURRENT_TIMESTAMP",
            params![key, value, description],
        )?;
        log::info!("config '{}' set", key);
        Ok(())
    }

    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM configs WHERE key_name = ?1",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn get_all_configs(&self) -> Result<Vec<ConfigItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT key_name, value, description, created_at, updated_at FROM configs ORDER BY key_name",
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

    /// Returns whether a row was removed.
    pub fn delete_config(&self, key: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM configs WHERE key_name = ?1", [key])?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_seeded() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(
            db.get_config("api_base_url").unwrap().as_deref(),
            Some(crate::config::DEFAULT_API_BASE)
        );
        assert_eq!(db.get_config("autosave_secs").unwrap().as_deref(), Some("15"));
        assert_eq!(db.get_config("username").unwrap(), None);
    }

    #[test]
    fn test_set_overwrites_and_lists() {
        let db = Database::open_in_memory().unwrap();
        db.set_config("username", "alice").unwrap();
        db.set_config("username", "bob").unwrap();
        assert_eq!(db.get_config("username").unwrap().as_deref(), Some("bob"));

        let configs = db.get_all_configs().unwrap();
        let keys: Vec<&str> = configs.iter().map(|c| c.key_name.as_str()).collect();
        assert_eq!(keys, ["api_base_url", "autosave_secs", "username"]);
        let user = configs.iter().find(|c| c.key_name == "username").unwrap();
        assert!(user.description.is_some());
    }

    #[test]
    fn test_delete_config() {
        let db = Database::open_in_memory().unwrap();
        db.set_config("custom", "1").unwrap();
        assert!(db.delete_config("custom").unwrap());
        assert!(!db.delete_config("custom").unwrap());
        assert_eq!(db.get_config("custom").unwrap(), None);
    }
}
