// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Purchase ledger over the `purchases` collection.
//!
//! One document per calendar date, keyed `YYYY-MM-DD`, holding an ordered
//! `items` array and a `paid` flag. Recording more items for a date appends
//! to the stored array; stored items are carried over as raw JSON so fields
//! this crate does not know about survive the merge.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::{LedgerError, LedgerResult, StoreError};
use crate::models::{LineItem, PurchaseRecord};
use crate::store::{Collection, Document, DocumentStore};
use crate::totals::{self, TotalReport};

const COLLECTION: Collection = Collection::Purchases;

pub fn record_id(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_record_id(id: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(id, "%Y-%m-%d").ok()
}

pub struct Ledger<S> {
    store: S,
}

impl<S: DocumentStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Append `items` to the record for `date`, creating it unpaid if needed.
    ///
    /// The whole batch is validated before anything is written. An existing
    /// record keeps its items and its paid flag.
    pub fn record_purchase(
        &self,
        date: NaiveDate,
        items: Vec<LineItem>,
    ) -> LedgerResult<PurchaseRecord> {
        let items = validate_items(items)?;
        let added = items.len();
        let mut encoded = items
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::from)?;

        // The returned record is decoded before anything is written, so an
        // unreadable stored record leaves the store untouched.
        let id = record_id(date);
        let record = match self.store.get(COLLECTION, &id)? {
            None => {
                let mut doc = Document::new();
                doc.insert("items".into(), Value::Array(encoded));
                doc.insert("paid".into(), Value::Bool(false));
                let record = decode(&id, date, doc.clone())?;
                self.store.set(COLLECTION, &id, doc)?;
                record
            }
            Some(mut doc) => {
                let mut stored = take_items(&id, &mut doc)?;
                stored.append(&mut encoded);
                let mut patch = Document::new();
                patch.insert("items".into(), Value::Array(stored));
                doc.extend(patch.clone());
                let record = decode(&id, date, doc)?;
                self.store.update(COLLECTION, &id, patch)?;
                record
            }
        };
        info!(date = %id, added, total_items = record.items.len(), "purchase recorded");
        Ok(record)
    }

    /// Mark the record for `date` as paid. Marking a paid record is a no-op.
    pub fn mark_paid(&self, date: NaiveDate) -> LedgerResult<()> {
        let id = record_id(date);
        let mut patch = Document::new();
        patch.insert("paid".into(), json!(true));
        match self.store.update(COLLECTION, &id, patch) {
            Ok(()) => {}
            Err(StoreError::Missing { .. }) => return Err(LedgerError::record_not_found(id)),
            Err(e) => return Err(e.into()),
        }
        info!(date = %id, "marked paid");
        Ok(())
    }

    pub fn record(&self, date: NaiveDate) -> LedgerResult<Option<PurchaseRecord>> {
        let id = record_id(date);
        match self.store.get(COLLECTION, &id)? {
            Some(doc) => Ok(Some(decode(&id, date, doc)?)),
            None => Ok(None),
        }
    }

    /// Every readable record, oldest first.
    pub fn records(&self) -> LedgerResult<Vec<PurchaseRecord>> {
        let mut out = Vec::new();
        for (id, doc) in self.store.scan(COLLECTION)? {
            let Some(date) = parse_record_id(&id) else {
                warn!(%id, "skipping purchase record with a non-date id");
                continue;
            };
            match decode(&id, date, doc) {
                Ok(r) => out.push(r),
                Err(err) => warn!(%id, %err, "skipping unreadable purchase record"),
            }
        }
        out.sort_by_key(|r| r.date);
        Ok(out)
    }

    pub fn remove(&self, date: NaiveDate) -> LedgerResult<()> {
        let id = record_id(date);
        if !self.store.delete(COLLECTION, &id)? {
            return Err(LedgerError::record_not_found(id));
        }
        info!(date = %id, "purchase record removed");
        Ok(())
    }

    pub fn unpaid_total(&self) -> LedgerResult<TotalReport> {
        Ok(totals::compute_unpaid_total(&self.records()?))
    }
}

fn take_items(id: &str, doc: &mut Document) -> LedgerResult<Vec<Value>> {
    match doc.remove("items") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(v)) => Ok(v),
        Some(_) => Err(StoreError::Corrupt {
            collection: COLLECTION,
            id: id.to_string(),
        }
        .into()),
    }
}

/// Items are read one by one; an unreadable item stays in place as a
/// placeholder that totals report as an issue.
fn decode(id: &str, date: NaiveDate, mut doc: Document) -> LedgerResult<PurchaseRecord> {
    let items = take_items(id, &mut doc)?
        .into_iter()
        .map(LineItem::from_stored)
        .collect();
    let paid = match doc.get("paid") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            warn!(%id, paid = %other, "non-boolean paid flag read as unpaid");
            false
        }
    };
    Ok(PurchaseRecord { date, items, paid })
}

/// Check a batch of new items. Fails on the first bad item.
pub fn validate_items(items: Vec<LineItem>) -> LedgerResult<Vec<LineItem>> {
    if items.is_empty() {
        return Err(LedgerError::validation("no items to record"));
    }
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| validate_item(i, item))
        .collect()
}

/// Check a new item and fill in `total_price` from quantity and unit price.
fn validate_item(index: usize, mut item: LineItem) -> LedgerResult<LineItem> {
    let n = index + 1;
    item.product_id = item.product_id.trim().to_string();
    if item.product_id.is_empty() {
        return Err(LedgerError::validation(format!(
            "item {}: product_id is required",
            n
        )));
    }
    item.market = item
        .market
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());
    if item.unreadable.is_some() {
        return Err(LedgerError::validation(format!(
            "item {} ({}): unreadable item",
            n, item.product_id
        )));
    }

    let (quantity, unit_price, total_price) = totals::item_numbers(&item).map_err(|reason| {
        LedgerError::validation(format!("item {} ({}): {}", n, item.product_id, reason))
    })?;

    if quantity.is_some_and(|q| q <= Decimal::ZERO) {
        return Err(LedgerError::validation(format!(
            "item {} ({}): quantity must be positive",
            n, item.product_id
        )));
    }
    if unit_price.is_some_and(|p| p < Decimal::ZERO) || total_price.is_some_and(|p| p < Decimal::ZERO)
    {
        return Err(LedgerError::validation(format!(
            "item {} ({}): prices cannot be negative",
            n, item.product_id
        )));
    }
    let out_of_range = || {
        LedgerError::validation(format!(
            "item {} ({}): quantity x unit_price is out of range",
            n, item.product_id
        ))
    };
    match (quantity, unit_price, total_price) {
        (Some(q), Some(p), Some(t)) => {
            let computed = q.checked_mul(p).ok_or_else(out_of_range)?;
            if computed != t {
                return Err(LedgerError::validation(format!(
                    "item {} ({}): total_price {} does not match {} x {}",
                    n, item.product_id, t, q, p
                )));
            }
            Ok(item)
        }
        (_, _, Some(_)) => Ok(item),
        (Some(q), Some(p), None) => {
            let total = q.checked_mul(p).ok_or_else(out_of_range)?;
            item.total_price = Some(total.into());
            Ok(item)
        }
        _ => Err(LedgerError::validation(format!(
            "item {} ({}): needs total_price or quantity and unit_price",
            n, item.product_id
        ))),
    }
}
