// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use tallybook::catalog::Catalog;
use tallybook::commands::{products, purchases, reports};
use tallybook::db::SqliteStore;
use tallybook::ledger::Ledger;
use tallybook::models::Numeric;
use tallybook::{cli, utils::parse_date};

fn run(store: &SqliteStore, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["tallybook"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("product", sub)) => products::handle(store, sub),
        Some(("purchase", sub)) => purchases::handle(store, sub),
        Some(("report", sub)) => reports::handle(store, sub),
        _ => panic!("unexpected command"),
    }
}

fn setup() -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    run(
        &store,
        &[
            "product", "add", "--id", " bread ", "--name", "Bread", "--category", "Bakery",
            "--unit", "piece", "--price", "5",
        ],
    )
    .unwrap();
    run(
        &store,
        &["product", "add", "--id", "milk", "--name", "Milk", "--category", "Dairy"],
    )
    .unwrap();
    store
}

#[test]
fn product_add_trims_and_rejects_duplicates() {
    let store = setup();
    let p = Catalog::new(&store).get("bread").unwrap().unwrap();
    assert_eq!(p.price, Some(Decimal::from(5)));

    assert!(run(&store, &["product", "add", "--id", "bread", "--name", "Again"]).is_err());
    run(
        &store,
        &["product", "add", "--id", "bread", "--name", "Again", "--replace"],
    )
    .unwrap();
    let p = Catalog::new(&store).get("bread").unwrap().unwrap();
    assert_eq!(p.name, "Again");
    assert_eq!(p.price, None);
}

#[test]
fn product_list_filters_by_category_and_pattern() {
    let store = setup();
    let catalog = Catalog::new(&store);
    let matches = cli::build_cli().get_matches_from([
        "tallybook", "product", "list", "--category", "dairy",
    ]);
    let Some(("product", p)) = matches.subcommand() else {
        panic!("no product subcommand");
    };
    let Some(("list", list_m)) = p.subcommand() else {
        panic!("no list subcommand");
    };
    let rows = products::query_rows(&catalog, list_m).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "milk");

    let matches =
        cli::build_cli().get_matches_from(["tallybook", "product", "list", "--match", "(?i)^bre"]);
    let Some(("product", p)) = matches.subcommand() else {
        panic!("no product subcommand");
    };
    let Some(("list", list_m)) = p.subcommand() else {
        panic!("no list subcommand");
    };
    let rows = products::query_rows(&catalog, list_m).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].price, "5.00");
}

#[test]
fn purchase_add_uses_catalog_price_and_merges() {
    let store = setup();
    run(
        &store,
        &["purchase", "add", "--date", "2024-01-01", "--product", "bread", "--quantity", "2"],
    )
    .unwrap();
    run(
        &store,
        &[
            "purchase", "add", "--date", "2024-01-01", "--product", "milk", "--quantity", "1",
            "--unit-price", "20", "--market", " Corner Shop ",
        ],
    )
    .unwrap();

    let record = Ledger::new(&store)
        .record(parse_date("2024-01-01").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(record.items.len(), 2);
    assert_eq!(record.items[0].unit_price, Some(Numeric::from(5)));
    assert_eq!(record.items[0].total_price, Some(Numeric::from(10)));
    assert_eq!(record.items[1].market.as_deref(), Some("Corner Shop"));
}

#[test]
fn purchase_add_without_any_price_fails() {
    let store = setup();
    // milk has no catalog price
    let err = run(
        &store,
        &["purchase", "add", "--date", "2024-01-01", "--product", "milk", "--quantity", "1"],
    )
    .unwrap_err();
    assert!(err.to_string().contains("has no price"));
    assert!(
        run(
            &store,
            &["purchase", "add", "--date", "2024-01-01", "--product", "ghost", "--quantity", "1"],
        )
        .is_err()
    );
    assert!(Ledger::new(&store).records().unwrap().is_empty());
}

#[test]
fn purchase_pay_and_unpaid_listing() {
    let store = setup();
    for (d, q) in [("2024-01-01", "2"), ("2024-01-02", "3")] {
        run(
            &store,
            &["purchase", "add", "--date", d, "--product", "bread", "--quantity", q],
        )
        .unwrap();
    }
    run(&store, &["purchase", "pay", "--date", "2024-01-01"]).unwrap();
    assert!(run(&store, &["purchase", "pay", "--date", "2024-02-01"]).is_err());

    let matches = cli::build_cli().get_matches_from(["tallybook", "purchase", "list", "--unpaid"]);
    let Some(("purchase", p)) = matches.subcommand() else {
        panic!("no purchase subcommand");
    };
    let Some(("list", list_m)) = p.subcommand() else {
        panic!("no list subcommand");
    };
    let rows = purchases::query_rows(&store, list_m).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, "2024-01-02");
    assert_eq!(rows[0].total, "15.00");

    run(&store, &["report", "unpaid"]).unwrap();
    run(&store, &["purchase", "show", "--date", "2024-01-01", "--json"]).unwrap();
}

#[test]
fn running_report_restricted_to_month() {
    let store = setup();
    for d in ["2024-01-30", "2024-02-01", "2024-02-03"] {
        run(
            &store,
            &["purchase", "add", "--date", d, "--product", "bread", "--quantity", "1"],
        )
        .unwrap();
    }
    let rows = reports::running_rows(&store, Some("2024-02")).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].running, Decimal::from(10));

    let rows = reports::running_rows(&store, None).unwrap();
    assert_eq!(rows.last().unwrap().running, Decimal::from(15));
}

#[test]
fn purchase_rm_removes_record() {
    let store = setup();
    run(
        &store,
        &["purchase", "add", "--date", "2024-01-01", "--product", "bread", "--quantity", "1"],
    )
    .unwrap();
    run(&store, &["purchase", "rm", "--date", "2024-01-01"]).unwrap();
    assert!(run(&store, &["purchase", "rm", "--date", "2024-01-01"]).is_err());
}
