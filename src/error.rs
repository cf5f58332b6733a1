// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error types shared by the store, catalog, and ledger layers.

use thiserror::Error;

use crate::store::Collection;

/// Failure raised by a [`DocumentStore`](crate::store::DocumentStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("document encoding: {0}")]
    Json(#[from] serde_json::Error),

    /// A partial update targeted a document that does not exist.
    #[error("no document '{id}' in {collection}")]
    Missing { collection: Collection, id: String },

    /// A stored document is not a JSON object.
    #[error("document '{id}' in {collection} is not an object")]
    Corrupt { collection: Collection, id: String },
}

/// Result type used by the catalog and ledger.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The operation referenced a product or date record that does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} '{id}' already exists")]
    AlreadyExists { kind: &'static str, id: String },

    /// Missing required field, non-numeric quantity/price, or inconsistent input.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn product_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "product",
            id: id.into(),
        }
    }

    pub fn record_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "purchase record",
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
