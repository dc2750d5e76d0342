//! tokopedia.com search results.

use super::{encode_query, FieldDefaults, FieldSelectors, Site};
use crate::models::PageContext;
use crate::scrapers::cascade::SelectorCascade;

const BASE_URL: &str = "https://www.tokopedia.com/search";

/// Tokopedia search listing.
///
/// Class names on the cards are hashed by the site's build and rotate;
/// each cascade falls back to `data-testid` attributes and then to plain
/// structure.
#[derive(Debug, Clone)]
pub struct Tokopedia {
    containers: SelectorCascade,
    cards: SelectorCascade,
    fields: FieldSelectors,
    defaults: FieldDefaults,
}

impl Tokopedia {
    pub fn new() -> Self {
        Self {
            containers: SelectorCascade::new([
                r#"div[data-testid="divSRPContentProducts"]"#,
                ".css-jza1fo",
                ".css-5wh65g",
            ]),
            cards: SelectorCascade::new([
                ".css-jza1fo",
                ".css-5wh65g",
                r#"div[data-testid="divProductWrapper"]"#,
                r#"div[data-testid="divSRPContentProducts"] > div > div"#,
            ]),
            fields: FieldSelectors {
                name: SelectorCascade::new([
                    r#"span[class*="_0T8-iGxMpV6NEsYEhwkqEg"]"#,
                    r#"span[class*="0T8-iGxMpV6NEsYEhwkqEg"]"#,
                    "div > div > div > span",
                    r#"span[data-testid="spnSRPProdName"]"#,
                    ".prd_link-product-name",
                    "div > a > div > div > div > span",
                ]),
                price: SelectorCascade::new([
                    r#"div[class*="_67d6E1xDKIzw"]"#,
                    r#"div[class*="67d6E1xDKIzw"]"#,
                    r#"div[class*="t4jWW3NandT5hvCFAiotYg"]"#,
                    r#"span[data-testid="spnSRPProdPrice"]"#,
                    r#"div[class*="price"]"#,
                ]),
                shop: SelectorCascade::new([
                    r#"span[class*="T0rpy-LEwYNQifsgB-3SQw"]"#,
                    r#"span[class*="pC8DMVkBZGW7-egObcWMFQ"]"#,
                    r#"span[data-testid="spnSRPProdSellerName"]"#,
                    r#"span[class*="shop"]"#,
                ]),
                location: SelectorCascade::new([
                    r#"span[class*="pC8DMVkBZGW7-egObcWMFQ"]:last-child"#,
                    r#"span[data-testid="spnSRPProdTabShopLoc"]"#,
                ]),
                sold_count: SelectorCascade::new([
                    r#"span[class*="se8WAnkjbVXZNA8mT+Veuw"]"#,
                    r#"span[class*="se8WAnkjbVXZNA8mT"]"#,
                    r#"span[class*="sold"]"#,
                ]),
                url: SelectorCascade::new(["a"]),
            },
            defaults: FieldDefaults::default(),
        }
    }
}

impl Default for Tokopedia {
    fn default() -> Self {
        Self::new()
    }
}

impl Site for Tokopedia {
    fn name(&self) -> &'static str {
        "Tokopedia"
    }

    fn key(&self) -> &'static str {
        "tokopedia"
    }

    /// Page 1 carries no `page` parameter; the site treats it as `page=1`.
    fn build_url(&self, context: PageContext<'_>) -> String {
        let query = encode_query(context.query);
        if context.page_number <= 1 {
            format!("{}?st=&q={}", BASE_URL, query)
        } else {
            format!("{}?st=&q={}&page={}", BASE_URL, query, context.page_number)
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    fn url(query: &str, page_number: u32) -> String {
        Tokopedia::new().build_url(PageContext { query, page_number })
    }

    #[test]
    fn first_page_omits_page_parameter() {
        assert_eq!(
            url("gula aren", 1),
            "https://www.tokopedia.com/search?st=&q=gula%20aren"
        );
    }

    #[test]
    fn later_pages_carry_page_number() {
        assert_eq!(
            url("gula aren", 3),
            "https://www.tokopedia.com/search?st=&q=gula%20aren&page=3"
        );
    }

    #[test]
    fn selectors_parse() {
        let site = Tokopedia::new();
        let fields = site.fields();
        for selector in site
            .container_selectors()
            .iter()
            .chain(site.card_selectors().iter())
            .chain(fields.name.iter())
            .chain(fields.price.iter())
            .chain(fields.shop.iter())
            .chain(fields.location.iter())
            .chain(fields.sold_count.iter())
            .chain(fields.url.iter())
        {
            assert!(
                scraper::Selector::parse(selector).is_ok(),
                "selector should parse: {}",
                selector
            );
        }
    }
}
