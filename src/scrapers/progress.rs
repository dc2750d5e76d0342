//! Operator-facing progress reporting.
//!
//! A run reports what it is doing through a [`ScrapeProgress`] passed in by
//! the caller, so the CLI can print styled lines while tests record events.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{error, info, warn};

/// Something worth telling the operator about.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeEvent {
    RunStarted {
        site: String,
        query: String,
    },
    PageStarted {
        page: u32,
        url: String,
    },
    /// Navigation or the initial content wait ran out of time; the page is
    /// scraped anyway.
    PageSlow {
        page: u32,
        reason: String,
    },
    CardsFound {
        page: u32,
        count: usize,
    },
    NoCards {
        page: u32,
    },
    ProductExtracted {
        page: u32,
        index: usize,
        total: usize,
        product_name: String,
        price_raw: String,
        shop_name: String,
    },
    /// Name extraction fell back to the default; the card was dropped.
    CardRejected {
        page: u32,
        index: usize,
    },
    CardStale {
        page: u32,
        index: usize,
    },
    CardFailed {
        page: u32,
        index: usize,
        error: String,
    },
    PageFinished {
        page: u32,
        total: usize,
    },
    Cooldown {
        after_pages: u32,
        delay: Duration,
    },
    DebugCaptured {
        tag: String,
    },
    RunAborted {
        error: String,
    },
    RunFinished {
        total: usize,
        pages: u32,
    },
}

/// Sink for [`ScrapeEvent`]s.
pub trait ScrapeProgress: Send + Sync {
    fn event(&self, event: ScrapeEvent);
}

/// Reports through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ScrapeProgress for TracingProgress {
    fn event(&self, event: ScrapeEvent) {
        match event {
            ScrapeEvent::RunStarted { site, query } => {
                info!("Starting {} scrape for '{}'", site, query)
            }
            ScrapeEvent::PageStarted { page, url } => info!("Page {}: {}", page, url),
            ScrapeEvent::PageSlow { page, reason } => {
                warn!("Page {} loaded slowly ({}), continuing", page, reason)
            }
            ScrapeEvent::CardsFound { page, count } => {
                info!("Page {}: {} product cards", page, count)
            }
            ScrapeEvent::NoCards { page } => warn!("Page {}: no product cards found", page),
            ScrapeEvent::ProductExtracted {
                page,
                index,
                total,
                product_name,
                price_raw,
                shop_name,
            } => info!(
                "Page {} card {}: {} | {} | {} (total {})",
                page,
                index + 1,
                product_name,
                price_raw,
                shop_name,
                total
            ),
            ScrapeEvent::CardRejected { page, index } => {
                info!("Page {} card {}: no product name, skipped", page, index + 1)
            }
            ScrapeEvent::CardStale { page, index } => {
                warn!("Page {} card {}: element went stale, skipped", page, index + 1)
            }
            ScrapeEvent::CardFailed { page, index, error } => {
                warn!("Page {} card {}: {}", page, index + 1, error)
            }
            ScrapeEvent::PageFinished { page, total } => {
                info!("Page {} done, {} products so far", page, total)
            }
            ScrapeEvent::Cooldown { after_pages, delay } => info!(
                "Cooling down for {:.1}s after {} pages",
                delay.as_secs_f32(),
                after_pages
            ),
            ScrapeEvent::DebugCaptured { tag } => info!("Saved debug capture '{}'", tag),
            ScrapeEvent::RunAborted { error: e } => error!("Run aborted: {}", e),
            ScrapeEvent::RunFinished { total, pages } => {
                info!("Extraction complete: {} products from {} pages", total, pages)
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingProgress {
    events: Arc<Mutex<Vec<ScrapeEvent>>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ScrapeEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    /// Tags of all debug captures, in order.
    pub fn debug_tags(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ScrapeEvent::DebugCaptured { tag } => Some(tag),
                _ => None,
            })
            .collect()
    }
}

impl ScrapeProgress for RecordingProgress {
    fn event(&self, event: ScrapeEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl<T: ScrapeProgress + ?Sized> ScrapeProgress for Arc<T> {
    fn event(&self, event: ScrapeEvent) {
        (**self).event(event)
    }
}
