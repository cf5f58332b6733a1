// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .conflicts_with("jsonl")
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

fn req(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id).long(id).required(true).help(help)
}

fn opt(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id).long(id).help(help)
}

fn product_attrs(cmd: Command) -> Command {
    cmd.arg(opt("category", "Category"))
        .arg(opt("subcategory", "Subcategory"))
        .arg(opt("unit", "Unit of measure, e.g. kg, piece"))
        .arg(opt("price", "Unit price"))
}

pub fn build_cli() -> Command {
    Command::new("tallybook")
        .version(crate_version!())
        .about("Daily purchase ledger and product catalog")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .help("Path to the SQLite database (overrides TALLYBOOK_DB)"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("product")
                .about("Manage the product catalog")
                .subcommand(product_attrs(
                    Command::new("add")
                        .about("Add a product")
                        .arg(req("id", "Product id"))
                        .arg(req("name", "Display name"))
                        .arg(
                            Arg::new("replace")
                                .long("replace")
                                .action(ArgAction::SetTrue)
                                .help("Overwrite an existing product with the same id"),
                        ),
                ))
                .subcommand(product_attrs(
                    Command::new("edit")
                        .about("Change attributes of a product")
                        .arg(req("id", "Product id"))
                        .arg(opt("name", "Display name")),
                ))
                .subcommand(
                    Command::new("rm")
                        .about("Remove a product")
                        .arg(req("id", "Product id")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List products")
                        .arg(opt("category", "Only this category"))
                        .arg(opt("match", "Regex matched against id and name")),
                )),
        )
        .subcommand(
            Command::new("purchase")
                .about("Record and settle daily purchases")
                .subcommand(
                    Command::new("add")
                        .about("Record a purchased item for a date")
                        .arg(req("date", "YYYY-MM-DD"))
                        .arg(req("product", "Product id"))
                        .arg(req("quantity", "Quantity bought"))
                        .arg(opt(
                            "unit-price",
                            "Unit price (defaults to the catalog price)",
                        ))
                        .arg(opt("total", "Total price for the line"))
                        .arg(opt("market", "Market or vendor")),
                )
                .subcommand(json_flags(
                    Command::new("show")
                        .about("Show the items recorded for a date")
                        .arg(req("date", "YYYY-MM-DD")),
                ))
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List purchase records with totals")
                        .arg(
                            Arg::new("unpaid")
                                .long("unpaid")
                                .action(ArgAction::SetTrue)
                                .help("Only unpaid dates"),
                        )
                        .arg(opt("month", "YYYY-MM")),
                ))
                .subcommand(
                    Command::new("pay")
                        .about("Mark a date as paid")
                        .arg(req("date", "YYYY-MM-DD")),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Remove the record for a date")
                        .arg(req("date", "YYYY-MM-DD")),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Totals")
                .subcommand(json_flags(
                    Command::new("unpaid").about("Outstanding total over unpaid dates"),
                ))
                .subcommand(json_flags(
                    Command::new("running")
                        .about("Per-date and running totals")
                        .arg(opt("month", "YYYY-MM")),
                )),
        )
        .subcommand(
            Command::new("import")
                .about("Import data")
                .subcommand(
                    Command::new("purchases")
                        .about(
                            "Import line items from CSV: date,product_id,quantity,unit_price,total_price,market",
                        )
                        .arg(req("path", "CSV file")),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(
                    Command::new("purchases")
                        .about("Export every line item")
                        .arg(req("format", "csv|json"))
                        .arg(req("out", "Output file")),
                ),
        )
        .subcommand(Command::new("doctor").about("Check stored data for problems"))
}
