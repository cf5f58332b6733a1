// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::catalog::Catalog;
use crate::ledger::{Ledger, parse_record_id};
use crate::store::{Collection, DocumentStore};
use crate::totals;
use crate::utils::pretty_table;
use anyhow::Result;

/// Collect `(issue, detail)` pairs describing problems in stored data.
pub fn diagnose<S: DocumentStore>(store: &S) -> Result<Vec<(String, String)>> {
    let mut rows = Vec::new();

    // 1) Purchase documents not keyed by a date
    for (id, _) in store.scan(Collection::Purchases)? {
        if parse_record_id(&id).is_none() {
            rows.push(("non_date_record".into(), id));
        }
    }

    let products = Catalog::new(store).list()?;
    for record in Ledger::new(store).records()? {
        for (i, item) in record.items.iter().enumerate() {
            let at = format!("{} #{} {}", record.date, i + 1, item.product_id);
            // 2) References to products missing from the catalog
            if !products.contains_key(&item.product_id) {
                rows.push(("unknown_product".into(), at.clone()));
            }
            // 3) Items that cannot be totalled
            if let Err(reason) = totals::item_total(item) {
                rows.push(("untotalled_item".into(), format!("{}: {}", at, reason)));
            }
            // 4) Stored total disagrees with quantity x unit price
            if let Some((stored, computed)) = totals::total_mismatch(item) {
                let computed = computed.map_or("out of range".to_string(), |c| c.to_string());
                rows.push((
                    "total_mismatch".into(),
                    format!("{}: stored {} vs {}", at, stored, computed),
                ));
            }
        }
    }
    Ok(rows)
}

pub fn handle<S: DocumentStore>(store: &S) -> Result<()> {
    let rows: Vec<Vec<String>> = diagnose(store)?
        .into_iter()
        .map(|(issue, detail)| vec![issue, detail])
        .collect();
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
