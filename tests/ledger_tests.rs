// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;
use tallybook::db::SqliteStore;
use tallybook::error::{LedgerError, StoreError};
use tallybook::ledger::Ledger;
use tallybook::models::{LineItem, Numeric};
use tallybook::store::{Collection, DocumentStore, MemoryStore};
use tallybook::totals::{self, IssueReason};
use tallybook::utils::parse_date;

fn day() -> chrono::NaiveDate {
    parse_date("2024-01-01").unwrap()
}

#[test]
fn second_batch_is_appended_to_same_date() {
    let store = SqliteStore::open_in_memory().unwrap();
    let ledger = Ledger::new(&store);
    ledger
        .record_purchase(
            day(),
            vec![LineItem::priced("bread", 2, 5).with_total_price(10)],
        )
        .unwrap();
    let record = ledger
        .record_purchase(
            day(),
            vec![LineItem::priced("milk", 1, 20).with_total_price(20)],
        )
        .unwrap();

    assert_eq!(record.items.len(), 2);
    assert_eq!(record.items[0].product_id, "bread");
    assert_eq!(record.items[1].product_id, "milk");
    assert!(!record.paid);
    assert_eq!(totals::record_total(&record).total, Decimal::from(30));
    assert_eq!(ledger.record(day()).unwrap().unwrap(), record);
}

#[test]
fn total_is_derived_when_missing() {
    let store = MemoryStore::new();
    let ledger = Ledger::new(&store);
    let record = ledger
        .record_purchase(day(), vec![LineItem::priced("eggs", 12, "0.25")])
        .unwrap();
    assert_eq!(
        record.items[0].total_price,
        Some(Numeric::Value(Decimal::from(3)))
    );
}

#[test]
fn mark_paid_is_idempotent() {
    let store = MemoryStore::new();
    let ledger = Ledger::new(&store);
    ledger
        .record_purchase(day(), vec![LineItem::priced("bread", 2, 5)])
        .unwrap();
    ledger.mark_paid(day()).unwrap();
    let once = ledger.record(day()).unwrap().unwrap();
    ledger.mark_paid(day()).unwrap();
    let twice = ledger.record(day()).unwrap().unwrap();

    assert!(twice.paid);
    assert_eq!(once, twice);
}

#[test]
fn mark_paid_on_missing_date_is_not_found() {
    let store = MemoryStore::new();
    let err = Ledger::new(&store).mark_paid(day()).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn appending_keeps_paid_flag() {
    let store = MemoryStore::new();
    let ledger = Ledger::new(&store);
    ledger
        .record_purchase(day(), vec![LineItem::priced("bread", 2, 5)])
        .unwrap();
    ledger.mark_paid(day()).unwrap();
    let record = ledger
        .record_purchase(day(), vec![LineItem::priced("milk", 1, 20)])
        .unwrap();
    assert!(record.paid);
    assert_eq!(record.items.len(), 2);
}

#[test]
fn invalid_batch_writes_nothing() {
    let store = MemoryStore::new();
    let ledger = Ledger::new(&store);

    let err = ledger
        .record_purchase(
            day(),
            vec![
                LineItem::priced("bread", 2, 5),
                LineItem::priced("milk", "abc", 20),
            ],
        )
        .unwrap_err();
    assert!(err.is_validation());
    assert!(ledger.record(day()).unwrap().is_none());

    for bad in [
        LineItem::new("salt"),
        LineItem::new("").with_total_price(3),
        LineItem::priced("oil", 0, 3),
        LineItem::priced("oil", 1, -3),
        LineItem::priced("oil", 2, 3).with_total_price(7),
    ] {
        assert!(ledger.record_purchase(day(), vec![bad]).unwrap_err().is_validation());
    }
    assert!(ledger.record_purchase(day(), vec![]).unwrap_err().is_validation());
    assert!(ledger.records().unwrap().is_empty());
}

#[test]
fn legacy_items_survive_a_merge() {
    let store = MemoryStore::new();
    store
        .set(
            Collection::Purchases,
            "2024-01-01",
            json!({
                "items": [
                    {"product_id": "tea", "quantity": 3, "total_price": 45, "note": "old"},
                    {"product_id": "sugar", "quantity": "abc", "price": 5}
                ]
            })
            .as_object()
            .unwrap()
            .clone(),
        )
        .unwrap();

    let ledger = Ledger::new(&store);
    let record = ledger
        .record_purchase(day(), vec![LineItem::priced("milk", 1, 20)])
        .unwrap();
    assert!(!record.paid);
    assert_eq!(record.items.len(), 3);
    assert_eq!(record.items[1].unit_price, Some(Numeric::from(5)));

    let raw = store
        .get(Collection::Purchases, "2024-01-01")
        .unwrap()
        .unwrap();
    let items = raw["items"].as_array().unwrap();
    assert_eq!(items[0]["note"], json!("old"));
    assert_eq!(items[1]["quantity"], json!("abc"));

    let report = totals::record_total(&record);
    assert_eq!(report.total, Decimal::from(65));
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].product_id, "sugar");
}

fn stored(store: &MemoryStore, id: &str, body: serde_json::Value) {
    store
        .set(Collection::Purchases, id, body.as_object().unwrap().clone())
        .unwrap();
}

#[test]
fn items_that_are_not_an_array_are_corrupt_and_left_alone() {
    let store = MemoryStore::new();
    stored(&store, "2024-01-01", json!({"items": "bread", "paid": false}));

    let err = Ledger::new(&store)
        .record_purchase(day(), vec![LineItem::priced("milk", 1, 20)])
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Storage(StoreError::Corrupt { .. })
    ));
    let raw = store
        .get(Collection::Purchases, "2024-01-01")
        .unwrap()
        .unwrap();
    assert_eq!(raw["items"], json!("bread"));
}

#[test]
fn wrong_typed_legacy_fields_keep_the_date_visible() {
    let store = MemoryStore::new();
    stored(
        &store,
        "2024-01-01",
        json!({
            "items": [
                {"product_id": "bread", "total_price": 10},
                {"product_id": "milk", "total_price": 20, "market": 7},
                {"product_id": 42, "total_price": 5},
                "tea",
                {"product_id": "jam", "quantity": [1]}
            ]
        }),
    );

    let ledger = Ledger::new(&store);
    let records = ledger.records().unwrap();
    assert_eq!(records.len(), 1);
    let items = &records[0].items;
    assert_eq!(items.len(), 5);
    assert_eq!(items[1].market.as_deref(), Some("7"));
    assert_eq!(items[2].product_id, "42");

    let report = ledger.unpaid_total().unwrap();
    assert_eq!(report.total, Decimal::from(35));
    // the bare string is unreadable; the array quantity is not a number
    let kinds: Vec<(usize, bool)> = report
        .issues
        .iter()
        .map(|i| (i.index, matches!(i.reason, IssueReason::Unreadable { .. })))
        .collect();
    assert_eq!(kinds, vec![(3, true), (4, false)]);
}

#[test]
fn appending_to_a_record_with_unreadable_items_succeeds_once() {
    let store = MemoryStore::new();
    stored(
        &store,
        "2024-01-01",
        json!({"items": [{"product_id": "bread", "total_price": 10}, ["junk"]]}),
    );

    let record = Ledger::new(&store)
        .record_purchase(day(), vec![LineItem::priced("milk", 1, 20)])
        .unwrap();
    assert_eq!(record.items.len(), 3);
    assert!(record.items[1].unreadable.is_some());

    let raw = store
        .get(Collection::Purchases, "2024-01-01")
        .unwrap()
        .unwrap();
    assert_eq!(raw["items"].as_array().unwrap().len(), 3);
    assert_eq!(raw["items"][1], json!(["junk"]));
}

#[test]
fn out_of_range_amounts_are_rejected_or_skipped() {
    let huge = "100000000000000000000";
    let store = MemoryStore::new();
    let ledger = Ledger::new(&store);

    let err = ledger
        .record_purchase(day(), vec![LineItem::priced("huge", huge, huge)])
        .unwrap_err();
    assert!(err.is_validation());
    assert!(store
        .get(Collection::Purchases, "2024-01-01")
        .unwrap()
        .is_none());

    stored(
        &store,
        "2024-01-02",
        json!({
            "items": [
                {"product_id": "bread", "total_price": 10},
                {"product_id": "huge", "quantity": huge, "unit_price": huge}
            ]
        }),
    );
    let report = ledger.unpaid_total().unwrap();
    assert_eq!(report.total, Decimal::from(10));
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].reason, IssueReason::Overflow);
}

#[test]
fn records_are_sorted_and_skip_non_date_ids() {
    let store = MemoryStore::new();
    let ledger = Ledger::new(&store);
    for d in ["2024-03-02", "2024-01-15", "2024-02-01"] {
        ledger
            .record_purchase(parse_date(d).unwrap(), vec![LineItem::priced("x", 1, 1)])
            .unwrap();
    }
    store
        .set(
            Collection::Purchases,
            "yesterday",
            json!({"items": []}).as_object().unwrap().clone(),
        )
        .unwrap();

    let dates: Vec<String> = ledger
        .records()
        .unwrap()
        .iter()
        .map(|r| r.date.to_string())
        .collect();
    assert_eq!(dates, vec!["2024-01-15", "2024-02-01", "2024-03-02"]);
}

#[test]
fn remove_record() {
    let store = MemoryStore::new();
    let ledger = Ledger::new(&store);
    ledger
        .record_purchase(day(), vec![LineItem::priced("x", 1, 1)])
        .unwrap();
    ledger.remove(day()).unwrap();
    assert!(ledger.record(day()).unwrap().is_none());
    assert!(ledger.remove(day()).unwrap_err().is_not_found());
}

#[test]
fn unpaid_total_ignores_paid_dates() {
    let store = MemoryStore::new();
    let ledger = Ledger::new(&store);
    let d2 = parse_date("2024-01-02").unwrap();
    ledger
        .record_purchase(day(), vec![LineItem::priced("bread", 2, 5)])
        .unwrap();
    ledger
        .record_purchase(d2, vec![LineItem::priced("milk", 1, 20)])
        .unwrap();
    assert_eq!(ledger.unpaid_total().unwrap().total, Decimal::from(30));
    ledger.mark_paid(day()).unwrap();
    assert_eq!(ledger.unpaid_total().unwrap().total, Decimal::from(20));
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    /// Recording several batches on one date yields their concatenation.
    #[test]
    fn batches_concatenate_in_order(
        batches in prop::collection::vec(
            prop::collection::vec((1i64..50, 0i64..500), 1..5),
            1..6,
        )
    ) {
        let store = MemoryStore::new();
        let ledger = Ledger::new(&store);
        let mut expected = Vec::new();
        for (b, batch) in batches.iter().enumerate() {
            let items: Vec<LineItem> = batch
                .iter()
                .enumerate()
                .map(|(i, (q, p))| LineItem::priced(format!("p{}-{}", b, i), *q, *p))
                .collect();
            expected.extend(items.iter().map(|it| it.product_id.clone()));
            ledger.record_purchase(day(), items).unwrap();
        }
        let record = ledger.record(day()).unwrap().unwrap();
        let got: Vec<String> = record.items.iter().map(|it| it.product_id.clone()).collect();
        prop_assert_eq!(got, expected);

        let sum: i64 = batches.iter().flatten().map(|(q, p)| q * p).sum();
        prop_assert_eq!(totals::record_total(&record).total, Decimal::from(sum));
    }
}
