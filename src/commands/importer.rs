// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::models::{LineItem, Numeric};
use crate::store::DocumentStore;
use crate::utils::parse_date;
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::collections::BTreeMap;
use tracing::info;

pub fn handle<S: DocumentStore>(store: &S, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("purchases", sub)) => import_purchases(store, sub),
        _ => Ok(()),
    }
}

fn field(rec: &csv::StringRecord, i: usize) -> Option<String> {
    rec.get(i)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Read `date,product_id,quantity,unit_price,total_price,market` rows grouped
/// by date. Rows keep their file order inside each date.
pub fn read_batches(path: &str) -> Result<BTreeMap<NaiveDate, Vec<LineItem>>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;

    let mut batches: BTreeMap<NaiveDate, Vec<LineItem>> = BTreeMap::new();
    for (n, result) in rdr.records().enumerate() {
        let line = n + 2;
        let rec = result.with_context(|| format!("Read CSV line {}", line))?;
        let date_raw = field(&rec, 0).with_context(|| format!("line {}: date missing", line))?;
        let date = parse_date(&date_raw).with_context(|| format!("line {}", line))?;
        let product_id =
            field(&rec, 1).with_context(|| format!("line {}: product_id missing", line))?;
        let mut item = LineItem::new(product_id);
        item.quantity = field(&rec, 2).map(|s| Numeric::parse(&s));
        item.unit_price = field(&rec, 3).map(|s| Numeric::parse(&s));
        item.total_price = field(&rec, 4).map(|s| Numeric::parse(&s));
        item.market = field(&rec, 5);
        batches.entry(date).or_default().push(item);
    }
    Ok(batches)
}

fn import_purchases<S: DocumentStore>(store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let batches = read_batches(path)?;
    if batches.is_empty() {
        return Err(anyhow!("No rows in {}", path));
    }

    // Validate every batch before writing any of them.
    for (date, items) in &batches {
        crate::ledger::validate_items(items.clone())
            .with_context(|| format!("Rows for {} in {}", date, path))?;
    }

    let ledger = Ledger::new(store);
    let mut count = 0;
    for (date, items) in batches {
        count += items.len();
        ledger
            .record_purchase(date, items)
            .with_context(|| format!("Record purchases for {}", date))?;
    }
    info!(path, count, "import finished");
    println!("Imported {} items from {}", count, path);
    Ok(())
}
