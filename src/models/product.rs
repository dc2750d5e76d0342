//! Scrape request and product record types.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::utils::{clean_price, clean_sold_count};

/// Parameters of a single run. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    pub query: String,
    pub max_products: usize,
    pub max_pages: u32,
}

impl ScrapeRequest {
    pub fn new(
        query: impl Into<String>,
        max_products: usize,
        max_pages: u32,
    ) -> Result<Self, ConfigError> {
        if max_products == 0 {
            return Err(ConfigError::NotPositive("max_products"));
        }
        if max_pages == 0 {
            return Err(ConfigError::NotPositive("max_pages"));
        }
        Ok(Self {
            query: query.into(),
            max_products,
            max_pages,
        })
    }
}

/// Position of the run within the result pages of one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageContext<'a> {
    pub query: &'a str,
    /// 1-based page number.
    pub page_number: u32,
}

/// One product card as persisted.
///
/// Field names are consumed verbatim by the cleaning step and the dashboard;
/// renaming any of them breaks the downstream pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub timestamp_scrape: String,
    pub ecommerce: String,
    pub product_name: String,
    pub price_raw: String,
    pub price_clean: Option<i64>,
    pub shop_name: String,
    pub location: String,
    pub sold_count_raw: String,
    pub sold_count_clean: i64,
    pub product_url: String,
    /// Query that produced this record; attached by the run driver before saving.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
}

/// Raw field values as they come off a card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProductFields {
    pub product_name: String,
    pub price: String,
    pub shop_name: String,
    pub location: String,
    pub sold_count: String,
    pub product_url: String,
}

impl ProductRecord {
    /// Build a record from raw card text, deriving the numeric fields.
    pub fn from_raw(ecommerce: &str, raw: RawProductFields) -> Self {
        Self {
            timestamp_scrape: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            ecommerce: ecommerce.to_string(),
            price_clean: clean_price(&raw.price),
            sold_count_clean: clean_sold_count(&raw.sold_count),
            product_name: raw.product_name,
            price_raw: raw.price,
            shop_name: raw.shop_name,
            location: raw.location,
            sold_count_raw: raw.sold_count,
            product_url: raw.product_url,
            search_query: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_rejects_zero_caps() {
        assert!(ScrapeRequest::new("gula aren", 0, 1).is_err());
        assert!(ScrapeRequest::new("gula aren", 1, 0).is_err());
        let req = ScrapeRequest::new("gula aren", 10, 2).unwrap();
        assert_eq!(req.max_products, 10);
    }

    #[test]
    fn record_derives_clean_fields() {
        let record = ProductRecord::from_raw(
            "Tokopedia",
            RawProductFields {
                product_name: "Gula Aren Semut 1kg".into(),
                price: "Rp45.500".into(),
                shop_name: "Toko Aren".into(),
                location: "Bandung".into(),
                sold_count: "2rb terjual".into(),
                product_url: "https://www.tokopedia.com/tokoaren/gula".into(),
            },
        );

        assert_eq!(record.price_clean, Some(45500));
        assert_eq!(record.sold_count_clean, 2000);
        assert_eq!(record.price_raw, "Rp45.500");
        assert!(record.timestamp_scrape.ends_with('Z'));
    }

    #[test]
    fn serialized_field_names_are_stable() {
        let record = ProductRecord::from_raw("Tokopedia", RawProductFields::default());
        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "timestamp_scrape",
            "ecommerce",
            "product_name",
            "price_raw",
            "price_clean",
            "shop_name",
            "location",
            "sold_count_raw",
            "sold_count_clean",
            "product_url",
        ] {
            assert!(obj.contains_key(key), "missing {}", key);
        }
        assert!(!obj.contains_key("search_query"));
        assert!(obj["price_clean"].is_null());
    }
}
