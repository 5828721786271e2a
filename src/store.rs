//! Persistent key-value store shared with account verification
//!
//! A single SQLite table of string keys and values with optional expiry.
//! Keys are derived from account names:
//!
//! - `pin:<user>`  - current verification PIN for `<user>`
//! - `host:<user>` - IRC host verified as belonging to `<user>`

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{BotError, Result};

/// SQLite-backed key-value store
pub struct Store {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

/// Key holding the verification PIN for an account
pub fn pin_key(user: &str) -> String {
    format!("pin:{}", user)
}

/// Key holding the verified host for an account
pub fn host_key(user: &str) -> String {
    format!("host:{}", user)
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl Store {
    /// Open (creating if needed) the store at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(|e| BotError::Store {
            message: format!("Failed to open {}: {}", path.display(), e),
        })?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER
            );
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Value for `key`, unless missing or expired
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                params![key, now_secs()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Set `key`, clearing any expiry
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO kv (key, value, expires_at) VALUES (?1, ?2, NULL)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = NULL",
            params![key, value],
        )?;
        Ok(())
    }

    /// Expire `key` after `ttl`. Returns false when the key does not exist.
    pub fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let conn = self.conn.lock();
        let at = now_secs() + ttl.as_secs() as i64;
        let changed = conn.execute(
            "UPDATE kv SET expires_at = ?2 WHERE key = ?1",
            params![key, at],
        )?;
        Ok(changed > 0)
    }

    /// Generate and store a fresh 6-digit PIN for `user`
    pub fn issue_pin(&self, user: &str) -> Result<String> {
        let pin = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        self.set(&pin_key(user), &pin)?;
        Ok(pin)
    }

    /// Whether `host` has been verified for `user`
    pub fn is_verified(&self, user: &str, host: &str) -> Result<bool> {
        Ok(self.get(&host_key(user))?.as_deref() == Some(host))
    }
}
