//! In-memory page driver backed by static HTML.
//!
//! Serves canned markup per URL with CSS selector support from the `scraper`
//! crate. Used by the test suite and for re-running extraction against pages
//! saved by the debug capture.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use super::page::{CardElement, ScrapePage};
use crate::error::{ScrapeError, ScrapeResult};

/// Attribute that makes every read on an element fail as stale.
pub const STALE_MARKER: &str = "data-fixture-stale";

/// Eight-byte PNG signature returned as the screenshot payload.
const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

const BLANK_DOCUMENT: &str = "<html><head></head><body></body></html>";

/// How document height reacts to scrolling.
#[derive(Debug, Clone, Copy)]
struct HeightGrowth {
    initial: f64,
    step: f64,
    max: f64,
}

/// Observable state of a fixture page, shared with test assertions.
#[derive(Debug, Default)]
pub struct FixtureState {
    pub url: Option<String>,
    pub html: String,
    pub document_height: f64,
    pub scroll_y: f64,
    /// Every URL passed to `navigate`, in order.
    pub visits: Vec<String>,
    /// Every absolute scroll offset requested, in order.
    pub scrolls: Vec<f64>,
    pub close_calls: u32,
}

/// Cloneable view onto a [`FixturePage`]'s state that outlives the page.
#[derive(Debug, Clone)]
pub struct FixtureProbe(Arc<Mutex<FixtureState>>);

impl FixtureProbe {
    pub fn state(&self) -> MutexGuard<'_, FixtureState> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Builder for [`FixturePage`].
#[derive(Debug)]
pub struct FixturePageBuilder {
    routes: HashMap<String, String>,
    broken: HashSet<String>,
    slow: HashSet<String>,
    viewport_height: f64,
    growth: HeightGrowth,
}

impl FixturePageBuilder {
    /// Serve `html` for `url`. Unknown URLs load an empty document.
    pub fn page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.routes.insert(url.into(), html.into());
        self
    }

    /// Navigating to `url` fails with a navigation error.
    pub fn broken(mut self, url: impl Into<String>) -> Self {
        self.broken.insert(url.into());
        self
    }

    /// Navigating to `url` loads its content but reports a load timeout.
    pub fn slow(mut self, url: impl Into<String>) -> Self {
        self.slow.insert(url.into());
        self
    }

    pub fn viewport_height(mut self, height: f64) -> Self {
        self.viewport_height = height;
        self
    }

    /// Document height starts at `initial` and grows by `step` per scroll up to `max`.
    pub fn scroll_growth(mut self, initial: f64, step: f64, max: f64) -> Self {
        self.growth = HeightGrowth { initial, step, max };
        self
    }

    pub fn build(self) -> FixturePage {
        let state = FixtureState {
            html: BLANK_DOCUMENT.to_string(),
            document_height: self.growth.initial,
            ..Default::default()
        };
        FixturePage {
            routes: self.routes,
            broken: self.broken,
            slow: self.slow,
            viewport_height: self.viewport_height,
            growth: self.growth,
            state: Arc::new(Mutex::new(state)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// A page whose documents are static HTML strings.
#[derive(Debug)]
pub struct FixturePage {
    routes: HashMap<String, String>,
    broken: HashSet<String>,
    slow: HashSet<String>,
    viewport_height: f64,
    growth: HeightGrowth,
    state: Arc<Mutex<FixtureState>>,
    generation: Arc<AtomicU64>,
}

impl FixturePage {
    pub fn builder() -> FixturePageBuilder {
        FixturePageBuilder {
            routes: HashMap::new(),
            broken: HashSet::new(),
            slow: HashSet::new(),
            viewport_height: 800.0,
            growth: HeightGrowth {
                initial: 2400.0,
                step: 0.0,
                max: 2400.0,
            },
        }
    }

    /// Page serving a single saved document, already "navigated".
    pub fn from_saved(html: impl Into<String>) -> Self {
        let page = Self::builder().build();
        page.lock().html = html.into();
        page
    }

    pub fn probe(&self) -> FixtureProbe {
        FixtureProbe(Arc::clone(&self.state))
    }

    fn lock(&self) -> MutexGuard<'_, FixtureState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load(&self, url: &str) {
        let html = self
            .routes
            .get(url)
            .cloned()
            .unwrap_or_else(|| BLANK_DOCUMENT.to_string());
        self.generation.fetch_add(1, Ordering::SeqCst);

        let mut state = self.lock();
        state.url = Some(url.to_string());
        state.html = html;
        state.scroll_y = 0.0;
        state.document_height = self.growth.initial;
    }
}

fn parse_selector(selector: &str) -> ScrapeResult<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::InvalidSelector(format!("{}: {}", selector, e)))
}

#[async_trait]
impl ScrapePage for FixturePage {
    type Element = FixtureElement;

    async fn navigate(&self, url: &str, timeout: Duration) -> ScrapeResult<()> {
        self.lock().visits.push(url.to_string());

        if self.broken.contains(url) {
            return Err(ScrapeError::Navigation {
                url: url.to_string(),
                message: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }

        self.load(url);

        if self.slow.contains(url) {
            return Err(ScrapeError::Timeout {
                what: format!("page load of {}", url),
                after: timeout,
            });
        }
        Ok(())
    }

    async fn find_elements(&self, selector: &str) -> ScrapeResult<Vec<FixtureElement>> {
        let selector = parse_selector(selector)?;
        let html = self.lock().html.clone();
        let document = Html::parse_document(&html);
        let generation = self.generation.load(Ordering::SeqCst);

        Ok(document
            .select(&selector)
            .map(|el| FixtureElement::new(el, generation, Arc::clone(&self.generation)))
            .collect())
    }

    async fn document_height(&self) -> ScrapeResult<f64> {
        Ok(self.lock().document_height)
    }

    async fn viewport_height(&self) -> ScrapeResult<f64> {
        Ok(self.viewport_height)
    }

    async fn scroll_to(&self, y: f64) -> ScrapeResult<()> {
        let mut state = self.lock();
        state.scrolls.push(y);
        state.scroll_y = y.min(state.document_height).max(0.0);
        state.document_height = (state.document_height + self.growth.step).min(self.growth.max);
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> ScrapeResult<()> {
        let height = self.lock().document_height;
        self.scroll_to(height).await
    }

    async fn screenshot(&self) -> ScrapeResult<Vec<u8>> {
        Ok(PNG_SIGNATURE.to_vec())
    }

    async fn content(&self) -> ScrapeResult<String> {
        Ok(self.lock().html.clone())
    }

    async fn close(self) -> ScrapeResult<()> {
        self.lock().close_calls += 1;
        Ok(())
    }
}

/// Element snapshot from a [`FixturePage`].
///
/// Stores the element's outer HTML and the page generation it was taken
/// from; any navigation after that makes it stale.
#[derive(Debug, Clone)]
pub struct FixtureElement {
    html: String,
    stale: bool,
    generation: u64,
    live_generation: Arc<AtomicU64>,
}

impl FixtureElement {
    fn new(el: ElementRef<'_>, generation: u64, live_generation: Arc<AtomicU64>) -> Self {
        Self {
            html: el.html(),
            stale: el.value().attr(STALE_MARKER).is_some(),
            generation,
            live_generation,
        }
    }

    fn check_live(&self) -> ScrapeResult<()> {
        if self.stale || self.generation != self.live_generation.load(Ordering::SeqCst) {
            return Err(ScrapeError::StaleElement);
        }
        Ok(())
    }

    /// Run `f` against this element re-parsed from its markup.
    fn with_root<T>(&self, f: impl FnOnce(ElementRef<'_>) -> ScrapeResult<T>) -> ScrapeResult<T> {
        self.check_live()?;
        let fragment = Html::parse_fragment(&self.html);
        let root = fragment
            .root_element()
            .children()
            .find_map(ElementRef::wrap)
            .ok_or(ScrapeError::StaleElement)?;
        f(root)
    }

    fn descendants(&self, selector: &str) -> ScrapeResult<Vec<FixtureElement>> {
        let selector = parse_selector(selector)?;
        self.with_root(|root| {
            Ok(root
                .select(&selector)
                .map(|el| FixtureElement::new(el, self.generation, Arc::clone(&self.live_generation)))
                .collect())
        })
    }
}

#[async_trait]
impl CardElement for FixtureElement {
    async fn find_element(&self, selector: &str) -> ScrapeResult<Self> {
        self.descendants(selector)?
            .into_iter()
            .next()
            .ok_or_else(|| ScrapeError::ElementNotFound(selector.to_string()))
    }

    async fn find_elements(&self, selector: &str) -> ScrapeResult<Vec<Self>> {
        self.descendants(selector)
    }

    async fn text(&self) -> ScrapeResult<String> {
        self.with_root(|root| {
            let raw: String = root.text().collect();
            Ok(raw.split_whitespace().collect::<Vec<_>>().join(" "))
        })
    }

    async fn attribute(&self, name: &str) -> ScrapeResult<Option<String>> {
        self.with_root(|root| Ok(root.value().attr(name).map(str::to_string)))
    }

    async fn scroll_into_view(&self) -> ScrapeResult<()> {
        self.check_live()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <div id="grid">
          <div class="card"><a href="/p/1"><span class="name">Gula  Aren</span></a></div>
          <div class="card" data-fixture-stale="1"><span class="name">Gone</span></div>
        </div>"#;

    async fn loaded() -> FixturePage {
        let page = FixturePage::builder().page("https://shop.test/", LISTING).build();
        page.navigate("https://shop.test/", Duration::from_secs(1))
            .await
            .unwrap();
        page
    }

    #[tokio::test]
    async fn finds_descendants_and_text() {
        let page = loaded().await;
        let cards = page.find_elements(".card").await.unwrap();
        assert_eq!(cards.len(), 2);

        let name = cards[0].find_element("span.name").await.unwrap();
        assert_eq!(name.text().await.unwrap(), "Gula Aren");

        let link = cards[0].find_element("a").await.unwrap();
        assert_eq!(link.attribute("href").await.unwrap().as_deref(), Some("/p/1"));
        assert_eq!(link.attribute("title").await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_descendant_is_not_found() {
        let page = loaded().await;
        let cards = page.find_elements(".card").await.unwrap();
        let err = cards[0].find_element(".price").await.unwrap_err();
        assert!(matches!(err, ScrapeError::ElementNotFound(_)));
    }

    #[tokio::test]
    async fn marked_and_navigated_elements_are_stale() {
        let page = loaded().await;
        let cards = page.find_elements(".card").await.unwrap();
        assert!(cards[1].text().await.unwrap_err().is_stale());

        page.navigate("https://shop.test/", Duration::from_secs(1))
            .await
            .unwrap();
        assert!(cards[0].text().await.unwrap_err().is_stale());
    }

    #[tokio::test]
    async fn broken_and_slow_navigation() {
        let page = FixturePage::builder()
            .page("https://shop.test/slow", "<div class=\"card\"></div>")
            .broken("https://shop.test/broken")
            .slow("https://shop.test/slow")
            .build();

        let err = page
            .navigate("https://shop.test/broken", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.is_run_fatal());

        let err = page
            .navigate("https://shop.test/slow", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(page.find_elements(".card").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_selector_is_reported() {
        let page = loaded().await;
        let err = page.find_elements("div[").await.unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidSelector(_)));
    }
}
