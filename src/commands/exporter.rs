// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::store::DocumentStore;
use crate::utils::fmt_numeric;
use anyhow::{Result, bail};
use serde_json::json;

pub fn handle<S: DocumentStore>(store: &S, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("purchases", sub)) => export_purchases(store, sub),
        _ => Ok(()),
    }
}

fn export_purchases<S: DocumentStore>(store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().trim().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap().trim();
    if fmt != "csv" && fmt != "json" {
        bail!("Unknown format: {} (use csv|json)", fmt);
    }

    let records = Ledger::new(store).records()?;
    let mut rows = Vec::new();
    for r in &records {
        for it in &r.items {
            rows.push((
                r.date.to_string(),
                r.paid,
                it.product_id.clone(),
                fmt_numeric(it.quantity.as_ref()),
                fmt_numeric(it.unit_price.as_ref()),
                fmt_numeric(it.total_price.as_ref()),
                it.market.clone().unwrap_or_default(),
            ));
        }
    }

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "date",
                "paid",
                "product_id",
                "quantity",
                "unit_price",
                "total_price",
                "market",
            ])?;
            for (d, paid, p, q, u, t, mk) in rows {
                wtr.write_record([d, paid.to_string(), p, q, u, t, mk])?;
            }
            wtr.flush()?;
        }
        _ => {
            let items: Vec<_> = rows
                .into_iter()
                .map(|(d, paid, p, q, u, t, mk)| {
                    json!({
                        "date": d, "paid": paid, "product_id": p, "quantity": q,
                        "unit_price": u, "total_price": t, "market": mk
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
    }
    println!("Exported purchases to {}", out);
    Ok(())
}
