//! Downstream cleaning of scraped collections.
//!
//! Turns stored [`ProductRecord`]s into analysis rows: irrelevant listings are
//! filtered out, duplicates by URL removed, implausible prices dropped, and
//! the pack size, unit price and name-based classification attached.

mod classify;

pub use classify::Category;

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::models::ProductRecord;

/// Prices outside this range (rupiah) are listing noise.
pub const MIN_PRICE: i64 = 1_000;
pub const MAX_PRICE: i64 = 10_000_000;

static PACK_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+[.,]?\d*)\s?(kg|g|gram|gr|ml|l|liter)").unwrap());

/// Pack size in kilograms (or litres) read from a product name.
///
/// Grams and millilitres are scaled down by 1000. `"Gula Aren 500gr"` is 0.5.
pub fn parse_weight_kg(product_name: &str) -> Option<f64> {
    let name = product_name.to_lowercase();
    let caps = PACK_SIZE.captures(&name)?;
    let value: f64 = caps[1].replace(',', ".").parse().ok()?;
    match &caps[2] {
        "g" | "gram" | "gr" | "ml" => Some(value / 1000.0),
        _ => Some(value),
    }
}

/// One cleaned listing, ready for analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedProduct {
    pub product_name: String,
    pub subtype: String,
    pub price: i64,
    pub weight_kg: Option<f64>,
    pub price_per_kg: Option<f64>,
    pub sold: i64,
    pub shop_name: String,
    pub url: String,
    pub category: Category,
    pub ecommerce: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
pub struct CleanReport {
    pub products: Vec<CleanedProduct>,
    pub dropped_irrelevant: usize,
    pub dropped_duplicates: usize,
    pub dropped_price: usize,
}

impl CleanReport {
    pub fn dropped(&self) -> usize {
        self.dropped_irrelevant + self.dropped_duplicates + self.dropped_price
    }
}

/// Clean a collection's records for `category`.
///
/// Filters run in order: relevance keywords, duplicate URL (first kept),
/// then the price range. A record with no parseable price is dropped.
pub fn clean_records(records: Vec<ProductRecord>, category: Category) -> CleanReport {
    let mut report = CleanReport::default();
    let mut seen_urls = HashSet::new();

    for record in records {
        if !category.is_relevant(&record.product_name) {
            report.dropped_irrelevant += 1;
            continue;
        }
        if !seen_urls.insert(record.product_url.clone()) {
            report.dropped_duplicates += 1;
            continue;
        }
        let price = match record.price_clean {
            Some(p) if (MIN_PRICE..=MAX_PRICE).contains(&p) => p,
            _ => {
                report.dropped_price += 1;
                continue;
            }
        };

        let weight_kg = parse_weight_kg(&record.product_name).filter(|w| *w > 0.0);
        let price_per_kg = weight_kg.map(|w| price as f64 / w);

        report.products.push(CleanedProduct {
            subtype: category.subtype(&record.product_name).to_string(),
            attributes: category.attributes(&record.product_name),
            price,
            weight_kg,
            price_per_kg,
            sold: record.sold_count_clean,
            shop_name: record.shop_name,
            url: record.product_url,
            category,
            ecommerce: record.ecommerce,
            search_query: record.search_query,
            product_name: record.product_name,
        });
    }

    debug!(
        "Cleaned as {}: kept {}, dropped {} irrelevant, {} duplicate, {} out-of-range price",
        category,
        report.products.len(),
        report.dropped_irrelevant,
        report.dropped_duplicates,
        report.dropped_price
    );
    report
}
