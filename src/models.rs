// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// A catalog entry. `id` is the document id and is not part of the stored body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            subcategory: String::new(),
            unit: String::new(),
            price: None,
        }
    }
}

/// Attributes to change on an existing product; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.subcategory.is_none()
            && self.unit.is_none()
            && self.price.is_none()
    }
}

/// A stored quantity or price. Older records hold free text in these fields,
/// so anything that does not parse as a decimal is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Value(Decimal),
    Invalid(serde_json::Value),
}

impl Numeric {
    /// Parse user input, keeping the raw text when it is not a number.
    pub fn parse(s: &str) -> Self {
        match s.trim().parse::<Decimal>() {
            Ok(d) => Numeric::Value(d),
            Err(_) => Numeric::Invalid(serde_json::Value::String(s.to_string())),
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Numeric::Value(d) => Some(*d),
            Numeric::Invalid(_) => None,
        }
    }
}

impl From<Decimal> for Numeric {
    fn from(d: Decimal) -> Self {
        Numeric::Value(d)
    }
}

impl From<i64> for Numeric {
    fn from(n: i64) -> Self {
        Numeric::Value(Decimal::from(n))
    }
}

impl From<i32> for Numeric {
    fn from(n: i32) -> Self {
        Numeric::Value(Decimal::from(n))
    }
}

impl From<&str> for Numeric {
    fn from(s: &str) -> Self {
        Numeric::parse(s)
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Value(d) => write!(f, "{}", d),
            Numeric::Invalid(serde_json::Value::String(s)) => write!(f, "{:?}", s),
            Numeric::Invalid(v) => write!(f, "{}", v),
        }
    }
}

/// One purchased product entry inside a purchase record.
///
/// Covers every stored variant: total only, quantity and unit price only, or
/// all three.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, deserialize_with = "scalar_text")]
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Numeric>,
    #[serde(default, alias = "price", skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<Numeric>,
    #[serde(
        default,
        alias = "vendor",
        deserialize_with = "opt_scalar_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub market: Option<String>,
    /// Set when the stored entry could not be read as an item at all.
    #[serde(skip)]
    pub unreadable: Option<String>,
}

impl LineItem {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            quantity: None,
            unit_price: None,
            total_price: None,
            market: None,
            unreadable: None,
        }
    }

    /// Read a stored entry. An entry that is not a usable item becomes a
    /// placeholder carrying the decode error, so it keeps its position.
    pub fn from_stored(raw: Value) -> Self {
        if !raw.is_object() {
            let mut item = Self::new(String::new());
            item.unreadable = Some(format!("expected an object, found {}", raw));
            return item;
        }
        match serde_json::from_value::<LineItem>(raw.clone()) {
            Ok(item) => item,
            Err(err) => {
                let product_id = raw
                    .get("product_id")
                    .and_then(scalar_to_text)
                    .unwrap_or_default();
                let mut item = Self::new(product_id);
                item.unreadable = Some(err.to_string());
                item
            }
        }
    }

    pub fn priced(
        product_id: impl Into<String>,
        quantity: impl Into<Numeric>,
        unit_price: impl Into<Numeric>,
    ) -> Self {
        Self::new(product_id)
            .with_quantity(quantity)
            .with_unit_price(unit_price)
    }

    pub fn with_quantity(mut self, q: impl Into<Numeric>) -> Self {
        self.quantity = Some(q.into());
        self
    }

    pub fn with_unit_price(mut self, p: impl Into<Numeric>) -> Self {
        self.unit_price = Some(p.into());
        self
    }

    pub fn with_total_price(mut self, p: impl Into<Numeric>) -> Self {
        self.total_price = Some(p.into());
        self
    }

    pub fn with_market(mut self, m: impl Into<String>) -> Self {
        self.market = Some(m.into());
        self
    }
}

fn scalar_to_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// Older records hold numbers or booleans in text fields.
fn scalar_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(opt_scalar_text(d)?.unwrap_or_default())
}

fn opt_scalar_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        v => scalar_to_text(&v)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected text, found {}", v))),
    }
}

/// Everything bought on one date, plus whether it has been paid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseRecord {
    pub date: NaiveDate,
    pub items: Vec<LineItem>,
    pub paid: bool,
}
