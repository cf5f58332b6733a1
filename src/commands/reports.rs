// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Ledger;
use crate::store::DocumentStore;
use crate::totals::{self, DailyTotal};
use crate::utils::{fmt_money, in_month, maybe_print_json, parse_month, pretty_table};
use anyhow::Result;
use serde::Serialize;

pub fn handle<S: DocumentStore>(store: &S, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("unpaid", sub)) => unpaid(store, sub)?,
        Some(("running", sub)) => running(store, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
struct UnpaidOutput {
    dates: Vec<String>,
    total: String,
    skipped: Vec<String>,
}

fn unpaid<S: DocumentStore>(store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let records = Ledger::new(store).records()?;
    let report = totals::compute_unpaid_total(&records);
    let out = UnpaidOutput {
        dates: records
            .iter()
            .filter(|r| !r.paid)
            .map(|r| r.date.to_string())
            .collect(),
        total: fmt_money(&report.total),
        skipped: report
            .issues
            .iter()
            .map(|i| {
                let date = i.date.map(|d| d.to_string()).unwrap_or_default();
                format!("{} item {} ({}): {}", date, i.index + 1, i.product_id, i.reason)
            })
            .collect(),
    };
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &out)? {
        return Ok(());
    }
    println!(
        "Unpaid: {} across {} date(s)",
        out.total,
        out.dates.len()
    );
    for s in &out.skipped {
        eprintln!("skipped {}", s);
    }
    Ok(())
}

/// Running totals, optionally restricted to one month. The cumulative column
/// restarts at the first date shown.
pub fn running_rows<S: DocumentStore>(
    store: &S,
    month: Option<&str>,
) -> Result<Vec<DailyTotal>> {
    let records: Vec<_> = Ledger::new(store)
        .records()?
        .into_iter()
        .filter(|r| in_month(r.date, month))
        .collect();
    Ok(totals::running_totals(&records))
}

fn running<S: DocumentStore>(store: &S, sub: &clap::ArgMatches) -> Result<()> {
    let month = match sub.get_one::<String>("month") {
        Some(m) => Some(parse_month(m)?),
        None => None,
    };
    let data = running_rows(store, month.as_deref())?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|d| {
                vec![
                    d.date.to_string(),
                    fmt_money(&d.total),
                    fmt_money(&d.running),
                    if d.paid { "yes".into() } else { "no".into() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Total", "Running", "Paid"], rows)
        );
    }
    Ok(())
}
