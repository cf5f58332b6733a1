// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::catalog::Catalog;
use crate::ledger::Ledger;
use crate::models::{LineItem, Numeric};
use crate::store::DocumentStore;
use crate::totals::{self, IssueReason};
use crate::utils::{
    fmt_money, fmt_numeric, in_month, maybe_print_json, opt_arg, parse_date, parse_month,
    pretty_table,
};
use anyhow::{Context, Result, anyhow};
use serde::Serialize;

pub fn handle<S: DocumentStore>(store: &S, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, sub)?,
        Some(("show", sub)) => show(store, sub)?,
        Some(("list", sub)) => list(store, sub)?,
        Some(("pay", sub)) => {
            let date = parse_date(sub.get_one::<String>("date").unwrap())?;
            Ledger::new(store).mark_paid(date)?;
            println!("Marked {} as paid", date);
        }
        Some(("rm", sub)) => {
            let date = parse_date(sub.get_one::<String>("date").unwrap())?;
            Ledger::new(store).remove(date)?;
            println!("Removed purchases for {}", date);
        }
        _ => {}
    }
    Ok(())
}

/// Build a line item from CLI input, taking the unit price from the catalog
/// when none was given.
pub fn item_from_args<S: DocumentStore>(store: &S, sub: &clap::ArgMatches) -> Result<LineItem> {
    let product_id = sub.get_one::<String>("product").unwrap().trim().to_string();
    let quantity = Numeric::parse(sub.get_one::<String>("quantity").unwrap());
    let total = opt_arg(sub, "total").map(|t| Numeric::parse(&t));
    let unit_price = match opt_arg(sub, "unit-price") {
        Some(p) => Some(Numeric::parse(&p)),
        None if total.is_some() => None,
        None => {
            let product = Catalog::new(store)
                .get(&product_id)?
                .ok_or_else(|| anyhow!("Product '{}' not found; pass --unit-price", product_id))?;
            let price = product
                .price
                .with_context(|| format!("Product '{}' has no price; pass --unit-price", product_id))?;
            Some(price.into())
        }
    };
    let mut item = LineItem::new(product_id).with_quantity(quantity);
    item.unit_price = unit_price;
    item.total_price = total;
    item.market = opt_arg(sub, "market");
    Ok(item)
}

fn add<S: DocumentStore>(store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let item = item_from_args(store, sub)?;
    let product_id = item.product_id.clone();
    let record = Ledger::new(store).record_purchase(date, vec![item])?;
    let report = totals::record_total(&record);
    println!(
        "Recorded '{}' on {} ({} items, total {})",
        product_id,
        date,
        record.items.len(),
        fmt_money(&report.total)
    );
    Ok(())
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    date: String,
    paid: bool,
    items: &'a [LineItem],
    total: String,
    issues: Vec<String>,
}

fn show<S: DocumentStore>(store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let record = Ledger::new(store)
        .record(date)?
        .ok_or_else(|| anyhow!("No purchases recorded for {}", date))?;
    let report = totals::record_total(&record);
    let out = ShowOutput {
        date: date.to_string(),
        paid: record.paid,
        items: &record.items,
        total: fmt_money(&report.total),
        issues: report
            .issues
            .iter()
            .map(|i| format!("item {} ({}): {}", i.index + 1, i.product_id, i.reason))
            .collect(),
    };
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &out)? {
        return Ok(());
    }
    let rows = record
        .items
        .iter()
        .map(|it| {
            let line = match totals::item_total(it) {
                Ok(t) => fmt_money(&t),
                Err(IssueReason::MissingPrice) => "?".into(),
                Err(IssueReason::Overflow) => "overflow".into(),
                Err(_) => "invalid".into(),
            };
            vec![
                it.product_id.clone(),
                fmt_numeric(it.quantity.as_ref()),
                fmt_numeric(it.unit_price.as_ref()),
                line,
                it.market.clone().unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Product", "Qty", "Unit Price", "Total", "Market"], rows)
    );
    println!(
        "Total: {}  ({})",
        out.total,
        if out.paid { "paid" } else { "unpaid" }
    );
    for issue in &out.issues {
        eprintln!("skipped {}", issue);
    }
    Ok(())
}

#[derive(Serialize)]
pub struct RecordRow {
    pub date: String,
    pub items: usize,
    pub total: String,
    pub paid: bool,
    pub skipped: usize,
}

pub fn query_rows<S: DocumentStore>(store: &S, sub: &clap::ArgMatches) -> Result<Vec<RecordRow>> {
    let month = match sub.get_one::<String>("month") {
        Some(m) => Some(parse_month(m)?),
        None => None,
    };
    let unpaid_only = sub.get_flag("unpaid");
    let mut data = Vec::new();
    for record in Ledger::new(store).records()?.iter().rev() {
        if unpaid_only && record.paid {
            continue;
        }
        if !in_month(record.date, month.as_deref()) {
            continue;
        }
        let report = totals::record_total(record);
        data.push(RecordRow {
            date: record.date.to_string(),
            items: record.items.len(),
            total: fmt_money(&report.total),
            paid: record.paid,
            skipped: report.issues.len(),
        });
    }
    Ok(data)
}

fn list<S: DocumentStore>(store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(store, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.items.to_string(),
                    r.total.clone(),
                    if r.paid { "yes".into() } else { "no".into() },
                    r.skipped.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Items", "Total", "Paid", "Skipped"], rows)
        );
    }
    Ok(())
}
