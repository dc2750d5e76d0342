//! shopee.co.id search results.

use super::{encode_query, FieldDefaults, FieldSelectors, Site};
use crate::models::PageContext;
use crate::scrapers::cascade::SelectorCascade;

const BASE_URL: &str = "https://shopee.co.id/search";

/// Shopee search listing. Pages are zero-based in the URL.
#[derive(Debug, Clone)]
pub struct Shopee {
    containers: SelectorCascade,
    cards: SelectorCascade,
    fields: FieldSelectors,
    defaults: FieldDefaults,
}

impl Shopee {
    pub fn new() -> Self {
        Self {
            containers: SelectorCascade::new([
                r#"div[data-sqe="item"]"#,
                ".shopee-search-item-result__items",
            ]),
            cards: SelectorCascade::new([
                r#"div[data-sqe="item"]"#,
                "li.shopee-search-item-result__item",
            ]),
            fields: FieldSelectors {
                name: SelectorCascade::new([r#"div[data-sqe="name"] > div"#]),
                price: SelectorCascade::new(["div._3_NTr6 span.ZEgDH9"]),
                // Cards do not show the seller
                shop: SelectorCascade::default(),
                location: SelectorCascade::new(["div._1_U22_"]),
                sold_count: SelectorCascade::new(["div.z-ve1m"]),
                url: SelectorCascade::new(["a"]),
            },
            defaults: FieldDefaults {
                price: "0".to_string(),
                shop_name: "N/A on card".to_string(),
                ..FieldDefaults::default()
            },
        }
    }
}

impl Default for Shopee {
    fn default() -> Self {
        Self::new()
    }
}

impl Site for Shopee {
    fn name(&self) -> &'static str {
        "Shopee"
    }

    fn key(&self) -> &'static str {
        "shopee"
    }

    fn build_url(&self, context: PageContext<'_>) -> String {
        format!(
            "{}?keyword={}&page={}",
            BASE_URL,
            encode_query(context.query),
            context.page_number.saturating_sub(1)
        )
    }

    fn container_selectors(&self) -> &SelectorCascade {
        &self.containers
    }

    fn card_selectors(&self) -> &SelectorCascade {
        &self.cards
    }

    fn fields(&self) -> &FieldSelectors {
        &self.fields
    }

    fn defaults(&self) -> &FieldDefaults {
        &self.defaults
    }
}
