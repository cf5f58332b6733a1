// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Totals over line items and purchase records.
//!
//! A bad item never aborts a computation: it is skipped and reported as an
//! [`ItemIssue`] next to the total of everything else.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::models::{LineItem, Numeric, PurchaseRecord};

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueReason {
    #[error("{field} is not a number: {raw}")]
    NotNumeric { field: &'static str, raw: String },

    #[error("no total_price and no quantity/unit_price pair")]
    MissingPrice,

    #[error("amount is out of range")]
    Overflow,

    #[error("stored item is unreadable: {detail}")]
    Unreadable { detail: String },
}

/// An item that was left out of a total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemIssue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Position of the item inside its record.
    pub index: usize,
    pub product_id: String,
    pub reason: IssueReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TotalReport {
    pub total: Decimal,
    pub issues: Vec<ItemIssue>,
}

impl TotalReport {
    /// Add each item to the total, or record why it was left out. An item
    /// that would push the total out of range is left out too.
    fn accumulate(&mut self, date: Option<NaiveDate>, items: &[LineItem]) {
        for (index, item) in items.iter().enumerate() {
            let summed = item_total(item)
                .and_then(|t| self.total.checked_add(t).ok_or(IssueReason::Overflow));
            match summed {
                Ok(total) => self.total = total,
                Err(reason) => self.issues.push(ItemIssue {
                    date,
                    index,
                    product_id: item.product_id.clone(),
                    reason,
                }),
            }
        }
    }
}

fn numeric_field(
    field: &'static str,
    value: Option<&Numeric>,
) -> Result<Option<Decimal>, IssueReason> {
    value
        .map(|n| {
            n.as_decimal().ok_or_else(|| IssueReason::NotNumeric {
                field,
                raw: n.to_string(),
            })
        })
        .transpose()
}

/// The decoded numbers of an item, or why they cannot be used.
pub fn item_numbers(
    item: &LineItem,
) -> Result<(Option<Decimal>, Option<Decimal>, Option<Decimal>), IssueReason> {
    if let Some(detail) = &item.unreadable {
        return Err(IssueReason::Unreadable {
            detail: detail.clone(),
        });
    }
    let quantity = numeric_field("quantity", item.quantity.as_ref())?;
    let unit_price = numeric_field("unit_price", item.unit_price.as_ref())?;
    let total_price = numeric_field("total_price", item.total_price.as_ref())?;
    Ok((quantity, unit_price, total_price))
}

/// Total for one item: the stored `total_price` when there is one, otherwise
/// `quantity * unit_price`.
pub fn item_total(item: &LineItem) -> Result<Decimal, IssueReason> {
    match item_numbers(item)? {
        (_, _, Some(total)) => Ok(total),
        (Some(q), Some(p), None) => q.checked_mul(p).ok_or(IssueReason::Overflow),
        _ => Err(IssueReason::MissingPrice),
    }
}

/// Stored total and `quantity * unit_price` when an item carries all three
/// numbers and they disagree. `None` for the product means it is out of range.
pub fn total_mismatch(item: &LineItem) -> Option<(Decimal, Option<Decimal>)> {
    match item_numbers(item).ok()? {
        (Some(q), Some(p), Some(total)) => match q.checked_mul(p) {
            Some(computed) if computed == total => None,
            computed => Some((total, computed)),
        },
        _ => None,
    }
}

pub fn compute_total(items: &[LineItem]) -> TotalReport {
    let mut report = TotalReport::default();
    report.accumulate(None, items);
    report
}

pub fn record_total(record: &PurchaseRecord) -> TotalReport {
    let mut report = TotalReport::default();
    report.accumulate(Some(record.date), &record.items);
    report
}

/// Sum of every record that has not been paid yet.
pub fn compute_unpaid_total<'a, I>(records: I) -> TotalReport
where
    I: IntoIterator<Item = &'a PurchaseRecord>,
{
    let mut report = TotalReport::default();
    for record in records.into_iter().filter(|r| !r.paid) {
        report.accumulate(Some(record.date), &record.items);
    }
    report
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub paid: bool,
    pub items: usize,
    pub total: Decimal,
    pub running: Decimal,
    pub skipped: usize,
}

/// Per-date totals with a cumulative column, in date order. The cumulative
/// column saturates at `Decimal::MAX`.
pub fn running_totals(records: &[PurchaseRecord]) -> Vec<DailyTotal> {
    let mut sorted: Vec<&PurchaseRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.date);
    let mut running = Decimal::ZERO;
    sorted
        .into_iter()
        .map(|r| {
            let report = record_total(r);
            running = running.checked_add(report.total).unwrap_or(Decimal::MAX);
            DailyTotal {
                date: r.date,
                paid: r.paid,
                items: r.items.len(),
                total: report.total,
                running,
                skipped: report.issues.len(),
            }
        })
        .collect()
}
