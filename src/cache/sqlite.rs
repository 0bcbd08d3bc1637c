use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::CacheStore;
use crate::error::{QuizError, QuizResult};

/// Memo store persisted in a SQLite database
pub struct SqliteStore {
    conn: Mutex<Connection>,
    pub path: PathBuf,
}

impl SqliteStore {
    /// Open or create the memo database at a specific path
    pub fn open_at_path(path: PathBuf) -> QuizResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        let store = Self {
            conn: Mutex::new(conn),
            path,
        };
        store.init_schema()?;

        Ok(store)
    }

    fn init_schema(&self) -> QuizResult<()> {
        self.conn()?.execute(
            "CREATE TABLE IF NOT EXISTS memo (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (namespace, key)
            )",
            [],
        )?;
        Ok(())
    }

    fn conn(&self) -> QuizResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| QuizError::Cache("memo database lock poisoned".to_string()))
    }

    /// Entry counts per namespace, for `cache info`
    pub fn namespace_counts(&self) -> QuizResult<Vec<(String, i64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT namespace, COUNT(*) FROM memo GROUP BY namespace ORDER BY namespace",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStore for SqliteStore {
    fn get(&self, namespace: &str, key: &str) -> QuizResult<Option<String>> {
        let value = self
            .conn()?
            .query_row(
                "SELECT value FROM memo WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> QuizResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn()?.execute(
            "INSERT OR REPLACE INTO memo (namespace, key, value, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![namespace, key, value, now],
        )?;
        Ok(())
    }

    fn clear(&self) -> QuizResult<usize> {
        Ok(self.conn()?.execute("DELETE FROM memo", [])?)
    }

    fn len(&self) -> QuizResult<usize> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM memo", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store(name: &str) -> SqliteStore {
        let path = PathBuf::from(format!(
            "/tmp/quizgpt_memo_{}_{}.db",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        SqliteStore::open_at_path(path).unwrap()
    }

    #[test]
    fn test_put_get_and_overwrite() {
        let store = test_store("put_get");

        assert_eq!(store.get("quiz", "k").unwrap(), None);
        store.put("quiz", "k", "first").unwrap();
        store.put("quiz", "k", "second").unwrap();

        assert_eq!(store.get("quiz", "k").unwrap().as_deref(), Some("second"));
        assert_eq!(store.len().unwrap(), 1);

        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn test_entries_survive_reopen_until_cleared() {
        let store = test_store("reopen");
        store.put("split_file", "a", "[]").unwrap();
        store.put("wikipedia", "Paris", "[]").unwrap();
        let path = store.path.clone();
        drop(store);

        let reopened = SqliteStore::open_at_path(path.clone()).unwrap();
        assert_eq!(
            reopened.namespace_counts().unwrap(),
            vec![("split_file".to_string(), 1), ("wikipedia".to_string(), 1)]
        );
        assert_eq!(reopened.clear().unwrap(), 2);
        assert_eq!(reopened.len().unwrap(), 0);

        let _ = std::fs::remove_file(&path);
    }
}
