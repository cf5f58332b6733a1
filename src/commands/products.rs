// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::catalog::Catalog;
use crate::models::{Product, ProductPatch};
use crate::store::DocumentStore;
use crate::utils::{fmt_money, maybe_print_json, opt_arg, parse_decimal, pretty_table};
use anyhow::{Result, anyhow};
use regex::Regex;
use serde::Serialize;

pub fn handle<S: DocumentStore>(store: &S, m: &clap::ArgMatches) -> Result<()> {
    let catalog = Catalog::new(store);
    match m.subcommand() {
        Some(("add", sub)) => {
            let mut product = Product::new(
                sub.get_one::<String>("id").unwrap().as_str(),
                sub.get_one::<String>("name").unwrap().as_str(),
            );
            product.category = opt_arg(sub, "category").unwrap_or_default();
            product.subcategory = opt_arg(sub, "subcategory").unwrap_or_default();
            product.unit = opt_arg(sub, "unit").unwrap_or_default();
            product.price = opt_arg(sub, "price")
                .map(|p| parse_decimal(&p))
                .transpose()?;
            let product = if sub.get_flag("replace") {
                catalog.upsert(product)?
            } else {
                catalog.add(product)?
            };
            println!("Added product '{}' ({})", product.id, product.name);
        }
        Some(("edit", sub)) => {
            let id = sub.get_one::<String>("id").unwrap();
            let patch = ProductPatch {
                name: opt_arg(sub, "name"),
                category: opt_arg(sub, "category"),
                subcategory: opt_arg(sub, "subcategory"),
                unit: opt_arg(sub, "unit"),
                price: opt_arg(sub, "price")
                    .map(|p| parse_decimal(&p))
                    .transpose()?,
            };
            let product = catalog.update(id, patch)?;
            println!("Updated product '{}'", product.id);
        }
        Some(("rm", sub)) => {
            let id = sub.get_one::<String>("id").unwrap().trim();
            catalog.delete(id)?;
            println!("Removed product '{}'", id);
        }
        Some(("list", sub)) => list(&catalog, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub unit: String,
    pub price: String,
}

pub fn query_rows<S: DocumentStore>(
    catalog: &Catalog<S>,
    sub: &clap::ArgMatches,
) -> Result<Vec<ProductRow>> {
    let category = opt_arg(sub, "category");
    let pattern = match opt_arg(sub, "match") {
        Some(p) => Some(
            Regex::new(&p).map_err(|err| anyhow!("Invalid regex pattern '{}': {}", p, err))?,
        ),
        None => None,
    };
    let mut data = Vec::new();
    for (id, p) in catalog.list()? {
        if let Some(cat) = &category {
            if !p.category.eq_ignore_ascii_case(cat) {
                continue;
            }
        }
        if let Some(re) = &pattern {
            if !re.is_match(&id) && !re.is_match(&p.name) {
                continue;
            }
        }
        data.push(ProductRow {
            id,
            name: p.name,
            category: p.category,
            subcategory: p.subcategory,
            unit: p.unit,
            price: p.price.map(|d| fmt_money(&d)).unwrap_or_default(),
        });
    }
    Ok(data)
}

fn list<S: DocumentStore>(catalog: &Catalog<S>, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(catalog, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .into_iter()
            .map(|r| vec![r.id, r.name, r.category, r.subcategory, r.unit, r.price])
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Name", "Category", "Subcategory", "Unit", "Price"],
                rows
            )
        );
    }
    Ok(())
}
