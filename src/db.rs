// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Context;
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::Result;
use crate::models::{Collection, CollectionPath, TransactionRecord, collection_from_value};
use crate::store::{ListenerHandle, Listeners, RecordStore, SnapshotCallback, lock};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Spendspace", "spendspace"));

pub fn default_db_path() -> anyhow::Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("spendspace.sqlite"))
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    -- One row per record under <collection>/<user_id>; body is the raw JSON record.
    CREATE TABLE IF NOT EXISTS records(
        collection TEXT NOT NULL CHECK(collection IN ('incomeList','expenseList')),
        user_id TEXT NOT NULL,
        id TEXT NOT NULL,
        body TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        PRIMARY KEY(collection, user_id, id)
    );
    "#,
    )?;
    Ok(())
}

/// Local keyed store backed by SQLite, with in-process live listeners.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    listeners: Listeners,
}

impl SqliteStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Open DB at {}", path.display()))?;
        Ok(Self::from_connection(conn)?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            listeners: Listeners::new(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    /// Run `f` against the underlying connection (settings, ad-hoc queries).
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = lock(&self.conn);
        f(&conn)
    }

    fn load(conn: &Connection, path: &CollectionPath) -> Result<Option<Collection>> {
        let mut stmt = conn.prepare(
            "SELECT id, body FROM records WHERE collection=?1 AND user_id=?2 ORDER BY id",
        )?;
        let rows = stmt.query_map(
            params![path.kind.collection_name(), path.user.as_str()],
            |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)),
        )?;
        let mut raw = serde_json::Map::new();
        for row in rows {
            let (id, body) = row?;
            match serde_json::from_str::<serde_json::Value>(&body) {
                Ok(v) => {
                    raw.insert(id, v);
                }
                Err(e) => log::debug!("skipping unreadable record {}/{}: {}", path, id, e),
            }
        }
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(collection_from_value(serde_json::Value::Object(raw)))
    }

    fn publish(&self, path: &CollectionPath) -> Result<()> {
        let snap = {
            let conn = lock(&self.conn);
            Self::load(&conn, path)?
        };
        self.listeners.notify(path, snap.as_ref());
        Ok(())
    }
}

fn insert_record(
    conn: &Connection,
    path: &CollectionPath,
    id: &str,
    record: &TransactionRecord,
) -> Result<()> {
    conn.execute(
        "INSERT INTO records(collection, user_id, id, body) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(collection, user_id, id) DO UPDATE SET body=excluded.body, updated_at=datetime('now')",
        params![
            path.kind.collection_name(),
            path.user.as_str(),
            id,
            serde_json::to_string(record)?
        ],
    )?;
    Ok(())
}

impl RecordStore for SqliteStore {
    fn read(&self, path: &CollectionPath) -> Result<Option<Collection>> {
        let conn = lock(&self.conn);
        Self::load(&conn, path)
    }

    fn subscribe(
        &self,
        path: &CollectionPath,
        callback: SnapshotCallback,
    ) -> Result<ListenerHandle> {
        let handle = self.listeners.register(path, callback);
        let snap = self.read(path)?;
        handle.deliver(snap.as_ref());
        Ok(handle)
    }

    fn put(&self, path: &CollectionPath, id: &str, record: &TransactionRecord) -> Result<()> {
        {
            let conn = lock(&self.conn);
            insert_record(&conn, path, id, record)?;
        }
        self.publish(path)
    }

    fn replace(&self, path: &CollectionPath, records: &Collection) -> Result<()> {
        {
            let mut conn = lock(&self.conn);
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM records WHERE collection=?1 AND user_id=?2",
                params![path.kind.collection_name(), path.user.as_str()],
            )?;
            for (id, rec) in records {
                insert_record(&tx, path, id, rec)?;
            }
            tx.commit()?;
        }
        self.publish(path)
    }

    fn delete(&self, path: &CollectionPath, id: &str) -> Result<bool> {
        let n = {
            let conn = lock(&self.conn);
            conn.execute(
                "DELETE FROM records WHERE collection=?1 AND user_id=?2 AND id=?3",
                params![path.kind.collection_name(), path.user.as_str(), id],
            )?
        };
        if n > 0 {
            self.publish(path)?;
        }
        Ok(n > 0)
    }
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn clear_setting(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM settings WHERE key=?1", params![key])?;
    Ok(())
}
