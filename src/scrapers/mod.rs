//! Browser-driven scraping of marketplace search results.
//!
//! Leaf-first: [`extract`] reads fields from a card, [`locate`] finds cards,
//! [`scroll`] loads lazy content, [`navigate`] opens result pages,
//! [`product`] turns a card into a record and [`orchestrator`] runs the
//! page loop. [`sites`] holds the per-marketplace selectors.

pub mod browser;
pub mod cascade;
pub mod debug;
pub mod extract;
pub mod locate;
pub mod navigate;
pub mod orchestrator;
pub mod pacing;
pub mod product;
pub mod progress;
pub mod scroll;
pub mod sites;

#[cfg(feature = "browser")]
pub use browser::ChromiumPage;
pub use browser::{BrowserLauncher, BrowserSettings, CardElement, FixturePage, ScrapePage};
pub use cascade::{try_in_order, SelectorCascade};
pub use debug::{DebugArtifacts, DebugCapture};
pub use extract::{extract_attribute, extract_price, extract_sold_count, extract_text};
pub use locate::find_cards;
pub use navigate::{LoadOutcome, PageNavigator};
pub use orchestrator::{
    FinishReason, RunOutcome, RunPhase, RunStats, ScrapeOptions, ScrapeOrchestrator,
    DEFAULT_SCROLL_CYCLES,
};
pub use pacing::{DelayRange, Pacing, Timeouts};
pub use product::ProductExtractor;
pub use progress::{RecordingProgress, ScrapeEvent, ScrapeProgress, TracingProgress};
pub use scroll::{scroll_and_wait, ScrollReport};
pub use sites::{site_by_name, FieldDefaults, FieldSelectors, Shopee, Site, Tokopedia, SITE_NAMES};
