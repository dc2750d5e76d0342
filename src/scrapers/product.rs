//! Turning one card into a [`ProductRecord`].

use tracing::{debug, trace};

use super::browser::CardElement;
use super::extract::{extract_attribute, extract_price, extract_sold_count, extract_text};
use super::pacing::DelayRange;
use super::sites::Site;
use crate::error::ScrapeResult;
use crate::models::{ProductRecord, RawProductFields};

/// Reads product cards using one site's cascades.
#[derive(Debug, Clone, Copy)]
pub struct ProductExtractor<'a> {
    site: &'a dyn Site,
    settle: DelayRange,
}

impl<'a> ProductExtractor<'a> {
    pub fn new(site: &'a dyn Site, settle: DelayRange) -> Self {
        Self { site, settle }
    }

    /// Extract a record from `card`.
    ///
    /// Returns `Ok(None)` when the name could not be read, which is the only
    /// reason a card is rejected; every other field may fall back to its
    /// default. A card whose own handle has gone stale fails with
    /// `StaleElement`.
    pub async fn extract<E: CardElement>(&self, card: &E) -> ScrapeResult<Option<ProductRecord>> {
        if let Err(e) = card.scroll_into_view().await {
            trace!("scrollIntoView failed: {}", e);
        }
        self.settle.pause().await;

        // Cards are often the product anchor themselves
        let own_href = card.attribute("href").await?;

        let fields = self.site.fields();
        let defaults = self.site.defaults();

        let product_name = extract_text(card, &fields.name, &defaults.product_name).await;
        if product_name == defaults.product_name {
            debug!("Card has no readable product name");
            return Ok(None);
        }

        let price = extract_price(
            card,
            &fields.price,
            self.site.currency_marker(),
            &defaults.price,
        )
        .await;
        let shop_name = extract_text(card, &fields.shop, &defaults.shop_name).await;
        let location = extract_text(card, &fields.location, &defaults.location).await;
        let sold_count = extract_sold_count(
            card,
            &fields.sold_count,
            self.site.sold_marker(),
            &defaults.sold_count,
        )
        .await;

        let product_url = match own_href.filter(|href| !href.trim().is_empty()) {
            Some(href) => href,
            None => extract_attribute(card, &fields.url, "href", &defaults.product_url).await,
        };

        Ok(Some(ProductRecord::from_raw(
            self.site.name(),
            RawProductFields {
                product_name,
                price,
                shop_name,
                location,
                sold_count,
                product_url,
            },
        )))
    }
}
