//! Marketplace variants.
//!
//! A site contributes only pure data and functions: how to build a search
//! URL, which selectors mark loaded content and product cards, and the
//! per-field cascades with their defaults. The orchestration engine is
//! shared by all of them.

mod shopee;
mod tokopedia;

pub use shopee::Shopee;
pub use tokopedia::Tokopedia;

use std::fmt;

use super::cascade::SelectorCascade;
use crate::error::ConfigError;
use crate::models::PageContext;
use crate::utils::collection_key;

/// Per-field selector cascades for one site's product cards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelectors {
    pub name: SelectorCascade,
    pub price: SelectorCascade,
    pub shop: SelectorCascade,
    pub location: SelectorCascade,
    pub sold_count: SelectorCascade,
    /// Elements whose `href` is the product link.
    pub url: SelectorCascade,
}

/// Placeholder values used when a field cannot be read from a card.
///
/// `product_name` doubles as the rejection sentinel: a card whose name
/// comes back equal to it is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefaults {
    pub product_name: String,
    pub price: String,
    pub shop_name: String,
    pub location: String,
    pub sold_count: String,
    pub product_url: String,
}

impl Default for FieldDefaults {
    fn default() -> Self {
        Self {
            product_name: "Nama produk tidak tersedia".to_string(),
            price: "Harga tidak tersedia".to_string(),
            shop_name: "Nama toko tidak tersedia".to_string(),
            location: "Lokasi tidak tersedia".to_string(),
            sold_count: "0 terjual".to_string(),
            product_url: "URL tidak tersedia".to_string(),
        }
    }
}

/// A marketplace the scraper knows how to read.
pub trait Site: fmt::Debug + Send + Sync {
    /// Display name stored in `ProductRecord::ecommerce`.
    fn name(&self) -> &'static str;

    /// Lowercase identifier used on the command line and in collection keys.
    fn key(&self) -> &'static str;

    /// Search URL for the given query and 1-based page.
    fn build_url(&self, context: PageContext<'_>) -> String;

    /// Elements whose presence means the results have started rendering.
    fn container_selectors(&self) -> &SelectorCascade;

    fn card_selectors(&self) -> &SelectorCascade;

    fn fields(&self) -> &FieldSelectors;

    fn defaults(&self) -> &FieldDefaults;

    /// Text that marks a price in free-form card text.
    fn currency_marker(&self) -> &str {
        "Rp"
    }

    /// Text that marks a sold-count label in free-form card text.
    fn sold_marker(&self) -> &str {
        "terjual"
    }

    /// File name prefix for debug captures.
    fn debug_prefix(&self) -> String {
        format!("{}_debug", self.key())
    }

    /// Collection the records of one query are saved under.
    fn collection_for(&self, query: &str) -> String {
        collection_key(self.key(), query)
    }
}

/// Names accepted by [`site_by_name`].
pub const SITE_NAMES: &[&str] = &["tokopedia", "shopee"];

/// Look up a site by its key (case-insensitive).
pub fn site_by_name(name: &str) -> Result<Box<dyn Site>, ConfigError> {
    match name.trim().to_lowercase().as_str() {
        "tokopedia" => Ok(Box::new(Tokopedia::new())),
        "shopee" => Ok(Box::new(Shopee::new())),
        _ => Err(ConfigError::UnknownSite(name.to_string())),
    }
}

/// Encode a query for a URL parameter (spaces become `%20`).
pub(crate) fn encode_query(query: &str) -> String {
    urlencoding::encode(query.trim()).into_owned()
}
