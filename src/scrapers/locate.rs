//! Card discovery.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::browser::{wait_for_elements, ScrapePage};
use super::cascade::{try_in_order, SelectorCascade};

/// Find product cards using the first selector that matches anything.
///
/// Each selector gets its own bounded wait of `per_selector`. The winning
/// selector's full match set is returned as-is; results are never merged
/// across selectors. An exhausted cascade yields an empty vector.
pub async fn find_cards<P: ScrapePage>(
    page: &P,
    selectors: &SelectorCascade,
    per_selector: Duration,
    poll_interval: Duration,
) -> Vec<P::Element> {
    let found = try_in_order(selectors.iter(), |selector| async move {
        match wait_for_elements(page, selector, per_selector, poll_interval).await {
            Ok(cards) => Some((selector, cards)),
            Err(e) => {
                debug!("Card selector {} gave nothing: {}", selector, e);
                None
            }
        }
    })
    .await;

    match found {
        Some((selector, cards)) => {
            info!("Found {} product cards with selector '{}'", cards.len(), selector);
            cards
        }
        None => {
            warn!("No product cards matched any of {}", selectors);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::browser::{CardElement, FixturePage};

    const GRID: &str = r#"
        <div class="grid">
          <div class="wrapper"><span>A</span></div>
          <div class="wrapper"><span>B</span></div>
          <div class="item"><span>C</span></div>
        </div>"#;

    async fn page() -> FixturePage {
        let page = FixturePage::builder().page("https://shop.test/", GRID).build();
        page.navigate("https://shop.test/", Duration::from_secs(1))
            .await
            .unwrap();
        page
    }

    #[tokio::test]
    async fn first_matching_selector_wins_without_merging() {
        let page = page().await;
        let cascade = SelectorCascade::new([".missing", ".wrapper", ".item"]);
        let cards = find_cards(&page, &cascade, Duration::ZERO, Duration::from_millis(1)).await;

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].text().await.unwrap(), "A");
        assert_eq!(cards[1].text().await.unwrap(), "B");
    }

    #[tokio::test]
    async fn exhausted_cascade_is_empty_not_an_error() {
        let page = page().await;
        let cascade = SelectorCascade::new([".missing", "div[", ".nope"]);
        let cards = find_cards(&page, &cascade, Duration::ZERO, Duration::from_millis(1)).await;
        assert!(cards.is_empty());
    }
}
