// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Product catalog over the `catalog` collection.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Product, ProductPatch};
use crate::store::{Collection, Document, DocumentStore, to_document};

const COLLECTION: Collection = Collection::Catalog;

pub struct Catalog<S> {
    store: S,
}

impl<S: DocumentStore> Catalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Add a new product. An existing id is rejected; see [`Catalog::upsert`].
    pub fn add(&self, product: Product) -> LedgerResult<Product> {
        let product = validate(product)?;
        if self.store.get(COLLECTION, &product.id)?.is_some() {
            return Err(LedgerError::AlreadyExists {
                kind: "product",
                id: product.id,
            });
        }
        self.write(&product)?;
        info!(id = %product.id, "product added");
        Ok(product)
    }

    /// Add or overwrite a product.
    pub fn upsert(&self, product: Product) -> LedgerResult<Product> {
        let product = validate(product)?;
        self.write(&product)?;
        info!(id = %product.id, "product written");
        Ok(product)
    }

    pub fn update(&self, id: &str, patch: ProductPatch) -> LedgerResult<Product> {
        let id = id.trim();
        let mut product = self
            .get(id)?
            .ok_or_else(|| LedgerError::product_not_found(id))?;
        if patch.is_empty() {
            return Err(LedgerError::validation("nothing to update"));
        }
        if let Some(name) = &patch.name {
            product.name = name.trim().to_string();
        }
        if let Some(v) = &patch.category {
            product.category = v.trim().to_string();
        }
        if let Some(v) = &patch.subcategory {
            product.subcategory = v.trim().to_string();
        }
        if let Some(v) = &patch.unit {
            product.unit = v.trim().to_string();
        }
        if patch.price.is_some() {
            product.price = patch.price;
        }
        let product = validate(product)?;
        let fields = to_document(COLLECTION, id, &patch)?;
        self.store.update(COLLECTION, id, trimmed(fields))?;
        info!(id, "product updated");
        Ok(product)
    }

    /// Remove a product. Purchase records that reference it are left alone.
    pub fn delete(&self, id: &str) -> LedgerResult<()> {
        let id = id.trim();
        if !self.store.delete(COLLECTION, id)? {
            return Err(LedgerError::product_not_found(id));
        }
        info!(id, "product deleted");
        Ok(())
    }

    pub fn get(&self, id: &str) -> LedgerResult<Option<Product>> {
        match self.store.get(COLLECTION, id)? {
            Some(doc) => Ok(Some(decode(id, doc)?)),
            None => Ok(None),
        }
    }

    pub fn list(&self) -> LedgerResult<BTreeMap<String, Product>> {
        let mut out = BTreeMap::new();
        for (id, doc) in self.store.scan(COLLECTION)? {
            match decode(&id, doc) {
                Ok(p) => {
                    out.insert(id, p);
                }
                Err(err) => warn!(%id, %err, "skipping unreadable product"),
            }
        }
        Ok(out)
    }

    fn write(&self, product: &Product) -> LedgerResult<()> {
        let doc = to_document(COLLECTION, &product.id, product)?;
        self.store.set(COLLECTION, &product.id, doc)?;
        Ok(())
    }
}

fn decode(id: &str, doc: Document) -> LedgerResult<Product> {
    let mut product: Product = serde_json::from_value(Value::Object(doc))
        .map_err(crate::error::StoreError::from)?;
    product.id = id.to_string();
    Ok(product)
}

fn trimmed(mut fields: Document) -> Document {
    for v in fields.values_mut() {
        if let Value::String(s) = v {
            *s = s.trim().to_string();
        }
    }
    fields
}

fn validate(mut product: Product) -> LedgerResult<Product> {
    product.id = product.id.trim().to_string();
    product.name = product.name.trim().to_string();
    product.category = product.category.trim().to_string();
    product.subcategory = product.subcategory.trim().to_string();
    product.unit = product.unit.trim().to_string();
    if product.id.is_empty() {
        return Err(LedgerError::validation("product id is required"));
    }
    if product.name.is_empty() {
        return Err(LedgerError::validation(format!(
            "product '{}' needs a name",
            product.id
        )));
    }
    if product.price.is_some_and(|p| p < Decimal::ZERO) {
        return Err(LedgerError::validation(format!(
            "product '{}' has a negative price",
            product.id
        )));
    }
    Ok(product)
}
