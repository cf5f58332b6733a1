// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Document store abstraction.
//!
//! The catalog and the ledger only ever talk to a [`DocumentStore`]: two named
//! collections of JSON objects keyed by string id. Writes are single-document
//! and last-writer-wins; nothing here assumes ordering or transactions.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::RwLock;

use serde_json::{Map, Value};

use crate::error::StoreError;

/// A stored document body.
pub type Document = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Catalog,
    Purchases,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Catalog => "catalog",
            Collection::Purchases => "purchases",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait DocumentStore {
    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    /// Write `doc` under `id`, replacing any existing body.
    fn set(&self, collection: Collection, id: &str, doc: Document) -> Result<(), StoreError>;

    /// Merge the top-level fields of `patch` into an existing document.
    ///
    /// Fails with [`StoreError::Missing`] when there is no document to update.
    fn update(&self, collection: Collection, id: &str, patch: Document) -> Result<(), StoreError>;

    /// Returns whether a document was removed.
    fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError>;

    /// Every document in the collection, in no particular order.
    fn scan(&self, collection: Collection) -> Result<Vec<(String, Document)>, StoreError>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        (**self).get(collection, id)
    }

    fn set(&self, collection: Collection, id: &str, doc: Document) -> Result<(), StoreError> {
        (**self).set(collection, id, doc)
    }

    fn update(&self, collection: Collection, id: &str, patch: Document) -> Result<(), StoreError> {
        (**self).update(collection, id, patch)
    }

    fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        (**self).delete(collection, id)
    }

    fn scan(&self, collection: Collection) -> Result<Vec<(String, Document)>, StoreError> {
        (**self).scan(collection)
    }
}

/// Top-level field merge used by every `update` implementation.
pub fn merge_fields(doc: &mut Document, patch: Document) {
    for (k, v) in patch {
        doc.insert(k, v);
    }
}

/// Serialize a value that must encode as a JSON object.
pub fn to_document<T: serde::Serialize>(
    collection: Collection,
    id: &str,
    value: &T,
) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::Corrupt {
            collection,
            id: id.to_string(),
        }),
    }
}

/// In-memory store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<BTreeMap<(Collection, String), Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<(Collection, String), Document>> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<(Collection, String), Document>> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.read().get(&(collection, id.to_string())).cloned())
    }

    fn set(&self, collection: Collection, id: &str, doc: Document) -> Result<(), StoreError> {
        self.write().insert((collection, id.to_string()), doc);
        Ok(())
    }

    fn update(&self, collection: Collection, id: &str, patch: Document) -> Result<(), StoreError> {
        let mut map = self.write();
        match map.get_mut(&(collection, id.to_string())) {
            Some(doc) => {
                merge_fields(doc, patch);
                Ok(())
            }
            None => Err(StoreError::Missing {
                collection,
                id: id.to_string(),
            }),
        }
    }

    fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        Ok(self.write().remove(&(collection, id.to_string())).is_some())
    }

    fn scan(&self, collection: Collection) -> Result<Vec<(String, Document)>, StoreError> {
        Ok(self
            .read()
            .iter()
            .filter(|((c, _), _)| *c == collection)
            .map(|((_, id), doc)| (id.clone(), doc.clone()))
            .collect())
    }
}
