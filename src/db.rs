// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::StoreError;
use crate::store::{Collection, Document, DocumentStore, merge_fields};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Tallybook", "tallybook"));

pub const DB_ENV: &str = "TALLYBOOK_DB";

pub fn db_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(DB_ENV) {
        let p = p.trim();
        if !p.is_empty() {
            return Ok(PathBuf::from(p));
        }
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("tallybook.sqlite"))
}

/// Open the store at `path`, or at [`db_path`] when none is given.
pub fn open_or_init(path: Option<&Path>) -> Result<SqliteStore> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => db_path()?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Create directory {}", parent.display()))?;
    }
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    SqliteStore::from_connection(conn).with_context(|| format!("Init schema at {}", path.display()))
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS documents(
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        body TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        PRIMARY KEY(collection, id)
    );
    CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
    "#,
    )?;
    Ok(())
}

/// SQLite-backed document store. Each document is one JSON row.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn decode(collection: Collection, id: &str, body: &str) -> Result<Document, StoreError> {
        match serde_json::from_str::<Value>(body)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::Corrupt {
                collection,
                id: id.to_string(),
            }),
        }
    }
}

impl DocumentStore for SqliteStore {
    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE collection=?1 AND id=?2",
                params![collection.name(), id],
                |r| r.get(0),
            )
            .optional()?;
        debug!(%collection, id, found = body.is_some(), "get");
        body.map(|b| Self::decode(collection, id, &b)).transpose()
    }

    fn set(&self, collection: Collection, id: &str, doc: Document) -> Result<(), StoreError> {
        let body = serde_json::to_string(&doc)?;
        self.conn.execute(
            "INSERT INTO documents(collection, id, body) VALUES (?1, ?2, ?3)
             ON CONFLICT(collection, id) DO UPDATE SET body=excluded.body, updated_at=datetime('now')",
            params![collection.name(), id, body],
        )?;
        debug!(%collection, id, "set");
        Ok(())
    }

    fn update(&self, collection: Collection, id: &str, patch: Document) -> Result<(), StoreError> {
        let mut doc = self.get(collection, id)?.ok_or_else(|| StoreError::Missing {
            collection,
            id: id.to_string(),
        })?;
        merge_fields(&mut doc, patch);
        let body = serde_json::to_string(&doc)?;
        self.conn.execute(
            "UPDATE documents SET body=?3, updated_at=datetime('now') WHERE collection=?1 AND id=?2",
            params![collection.name(), id, body],
        )?;
        debug!(%collection, id, "update");
        Ok(())
    }

    fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let n = self.conn.execute(
            "DELETE FROM documents WHERE collection=?1 AND id=?2",
            params![collection.name(), id],
        )?;
        debug!(%collection, id, removed = n > 0, "delete");
        Ok(n > 0)
    }

    fn scan(&self, collection: Collection) -> Result<Vec<(String, Document)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, body FROM documents WHERE collection=?1")?;
        let rows = stmt.query_map(params![collection.name()], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, body) = row?;
            let doc = Self::decode(collection, &id, &body)?;
            out.push((id, doc));
        }
        debug!(%collection, count = out.len(), "scan");
        Ok(out)
    }
}
