//! Field extraction from a single card.
//!
//! Every function here is total: lookups that miss, throw, or hit a stale
//! node fall through to the next candidate and finally to the caller's
//! default. Nothing is raised to the caller.

use tracing::trace;

use super::browser::CardElement;
use super::cascade::{try_in_order, SelectorCascade};
use crate::utils::extract_price_token;

/// Descendants scanned by the broad price and sold-count fallbacks.
const TEXT_BEARING: &str = "div, span";

/// Descendants scanned by the attribute fallback.
const ANCHORS: &str = "a";

/// Trimmed text of the first descendant matching `selector`, if non-empty.
async fn probe_text<E: CardElement>(card: &E, selector: &str) -> Option<String> {
    let element = match card.find_element(selector).await {
        Ok(element) => element,
        Err(e) => {
            trace!("{} missed: {}", selector, e);
            return None;
        }
    };
    non_empty(element.text().await.ok()?)
}

async fn probe_attribute<E: CardElement>(card: &E, selector: &str, name: &str) -> Option<String> {
    let element = card.find_element(selector).await.ok()?;
    non_empty(element.attribute(name).await.ok()??)
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == text.len() {
        Some(text)
    } else {
        Some(trimmed.to_string())
    }
}

/// First descendant text (trimmed) for which `accept` returns a value.
async fn scan_text<E, F>(card: &E, mut accept: F) -> Option<String>
where
    E: CardElement,
    F: FnMut(&str) -> Option<String>,
{
    let elements = card.find_elements(TEXT_BEARING).await.ok()?;
    for element in elements {
        let Ok(text) = element.text().await else {
            continue;
        };
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        if let Some(found) = accept(text) {
            return Some(found);
        }
    }
    None
}

/// Text of the first cascade member that matches with non-empty content.
///
/// Returns `default` when the cascade is exhausted.
pub async fn extract_text<E: CardElement>(
    card: &E,
    selectors: &SelectorCascade,
    default: &str,
) -> String {
    try_in_order(selectors.iter(), |sel| probe_text(card, sel))
        .await
        .unwrap_or_else(|| default.to_string())
}

/// Like [`extract_text`], then scans all text-bearing descendants for one
/// containing `currency_marker`.
///
/// A hit from the scan is narrowed to the `Rp…` amount when one is present,
/// so `"Diskon Rp12.500"` yields `"Rp12.500"`.
pub async fn extract_price<E: CardElement>(
    card: &E,
    selectors: &SelectorCascade,
    currency_marker: &str,
    default: &str,
) -> String {
    if let Some(text) = try_in_order(selectors.iter(), |sel| probe_text(card, sel)).await {
        return text;
    }

    scan_text(card, |text| {
        text.contains(currency_marker).then(|| {
            extract_price_token(text)
                .unwrap_or(text)
                .to_string()
        })
    })
    .await
    .unwrap_or_else(|| default.to_string())
}

/// Like [`extract_text`], then scans for the first descendant whose text
/// contains `sold_marker` (e.g. `terjual`).
pub async fn extract_sold_count<E: CardElement>(
    card: &E,
    selectors: &SelectorCascade,
    sold_marker: &str,
    default: &str,
) -> String {
    if let Some(text) = try_in_order(selectors.iter(), |sel| probe_text(card, sel)).await {
        return text;
    }

    scan_text(card, |text| text.contains(sold_marker).then(|| text.to_string()))
        .await
        .unwrap_or_else(|| default.to_string())
}

/// Non-empty attribute value from the first matching cascade member.
///
/// Falls back to the first anchor descendant carrying a non-empty value.
pub async fn extract_attribute<E: CardElement>(
    card: &E,
    selectors: &SelectorCascade,
    attribute: &str,
    default: &str,
) -> String {
    if let Some(value) =
        try_in_order(selectors.iter(), |sel| probe_attribute(card, sel, attribute)).await
    {
        return value;
    }

    if let Ok(anchors) = card.find_elements(ANCHORS).await {
        for anchor in anchors {
            if let Ok(Some(value)) = anchor.attribute(attribute).await {
                if let Some(value) = non_empty(value) {
                    return value;
                }
            }
        }
    }

    default.to_string()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::scrapers::browser::{FixtureElement, FixturePage, ScrapePage};

    async fn card(html: &str) -> FixtureElement {
        let page = FixturePage::builder()
            .page("https://shop.test/", format!("<div id=\"card\">{}</div>", html))
            .build();
        page.navigate("https://shop.test/", Duration::from_secs(1))
            .await
            .unwrap();
        page.find_elements("#card").await.unwrap().remove(0)
    }

    fn cascade(selectors: &[&str]) -> SelectorCascade {
        SelectorCascade::new(selectors.iter().copied())
    }

    #[tokio::test]
    async fn first_non_empty_match_wins() {
        let card = card(
            r#"<span class="a">   </span><span class="b"> Gula Aren 1kg </span><span class="c">later</span>"#,
        )
        .await;
        let text = extract_text(&card, &cascade(&[".missing", ".a", ".b", ".c"]), "none").await;
        assert_eq!(text, "Gula Aren 1kg");
    }

    #[tokio::test]
    async fn exhausted_cascade_returns_default() {
        let card = card("<span>text</span>").await;
        let text = extract_text(&card, &cascade(&[".x", "div[", ".y"]), "Nama produk tidak tersedia").await;
        assert_eq!(text, "Nama produk tidak tersedia");

        let empty = extract_text(&card, &SelectorCascade::default(), "fallback").await;
        assert_eq!(empty, "fallback");
    }

    #[tokio::test]
    async fn price_falls_back_to_currency_scan() {
        let card = card(r#"<div><span>Promo</span><span>Hemat Rp12.500 hari ini</span></div>"#).await;
        let price = extract_price(&card, &cascade(&[".price"]), "Rp", "Harga tidak tersedia").await;
        assert_eq!(price, "Rp12.500");
    }

    #[tokio::test]
    async fn price_scan_keeps_text_without_amount() {
        let card = card(r#"<span>Rp -</span>"#).await;
        let price = extract_price(&card, &cascade(&[".price"]), "Rp", "Harga tidak tersedia").await;
        assert_eq!(price, "Rp -");

        let card = self::card("<span>Gratis</span>").await;
        let price = extract_price(&card, &cascade(&[".price"]), "Rp", "Harga tidak tersedia").await;
        assert_eq!(price, "Harga tidak tersedia");
    }

    #[tokio::test]
    async fn sold_count_falls_back_to_marker_scan() {
        let card = card(r#"<span>Jakarta</span><span>2rb terjual</span>"#).await;
        let sold = extract_sold_count(&card, &cascade(&[".sold"]), "terjual", "0 terjual").await;
        assert_eq!(sold, "2rb terjual");

        let card = self::card("<span>Jakarta</span>").await;
        let sold = extract_sold_count(&card, &cascade(&[".sold"]), "terjual", "0 terjual").await;
        assert_eq!(sold, "0 terjual");
    }

    #[tokio::test]
    async fn attribute_falls_back_to_any_anchor() {
        let card = card(
            r#"<a class="img" href="">x</a><div><a href="https://shop.test/p/1">name</a></div>"#,
        )
        .await;
        let url = extract_attribute(&card, &cascade(&["a.img"]), "href", "URL tidak tersedia").await;
        assert_eq!(url, "https://shop.test/p/1");

        let card = self::card("<span>no links</span>").await;
        let url = extract_attribute(&card, &cascade(&["a"]), "href", "URL tidak tersedia").await;
        assert_eq!(url, "URL tidak tersedia");
    }

    #[tokio::test]
    async fn stale_card_yields_defaults() {
        let card = card(r#"<span class="name" data-fixture-stale="1">Gone</span>"#).await;
        let text = extract_text(&card, &cascade(&[".name"]), "default").await;
        assert_eq!(text, "default");
    }
}
