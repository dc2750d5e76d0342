//! Driver seam between the scraping engine and a concrete browser.
//!
//! The engine only ever talks to these two traits. [`ChromiumPage`] drives a
//! real browser over CDP; [`FixturePage`] serves in-memory HTML for tests and
//! for replaying saved pages.
//!
//! [`ChromiumPage`]: super::ChromiumPage
//! [`FixturePage`]: super::FixturePage

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScrapeResult;

/// Handle to one element inside the current page.
///
/// Handles go stale when the page navigates or re-renders; reads then fail
/// with [`ScrapeError::StaleElement`](crate::error::ScrapeError::StaleElement).
#[async_trait]
pub trait CardElement: Send + Sync + Sized {
    /// First descendant matching `selector`, or `ElementNotFound`.
    async fn find_element(&self, selector: &str) -> ScrapeResult<Self>;

    /// All descendants matching `selector` in document order.
    async fn find_elements(&self, selector: &str) -> ScrapeResult<Vec<Self>>;

    /// Rendered text content (not trimmed).
    async fn text(&self) -> ScrapeResult<String>;

    /// Attribute value, `None` when the attribute is absent.
    async fn attribute(&self, name: &str) -> ScrapeResult<Option<String>>;

    /// Center the element in the viewport.
    async fn scroll_into_view(&self) -> ScrapeResult<()>;
}

/// One browser tab owned by a single run.
#[async_trait]
pub trait ScrapePage: Send + Sync {
    type Element: CardElement;

    /// Navigate and wait for the load event, bounded by `timeout`.
    ///
    /// A slow load returns `ScrapeError::Timeout`; the page may still hold
    /// partial content afterwards.
    async fn navigate(&self, url: &str, timeout: Duration) -> ScrapeResult<()>;

    /// All elements matching `selector` in document order (possibly empty).
    async fn find_elements(&self, selector: &str) -> ScrapeResult<Vec<Self::Element>>;

    async fn document_height(&self) -> ScrapeResult<f64>;

    async fn viewport_height(&self) -> ScrapeResult<f64>;

    /// Scroll the window to an absolute vertical offset.
    async fn scroll_to(&self, y: f64) -> ScrapeResult<()>;

    async fn scroll_to_bottom(&self) -> ScrapeResult<()>;

    /// PNG screenshot of the full page.
    async fn screenshot(&self) -> ScrapeResult<Vec<u8>>;

    /// Serialized markup of the current document.
    async fn content(&self) -> ScrapeResult<String>;

    /// Release the tab and its browser. Consumes the page.
    async fn close(self) -> ScrapeResult<()>
    where
        Self: Sized;
}
