//! The page/card loop for one run.
//!
//! ```text
//! Starting -> Navigating -> Scrolling -> Locating -> Extracting -+-> Finished
//!                 ^                                             |
//!                 +------------------ next page ----------------+
//! ```
//!
//! A run ends when the product cap is reached, the page cap is reached, or a
//! run-fatal error occurs. Every other failure is absorbed at the card or
//! page level. The page is closed exactly once on every exit path.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::browser::ScrapePage;
use super::debug::{empty_page_tag, timeout_tag, DebugCapture, FATAL_TAG};
use super::locate::find_cards;
use super::navigate::{LoadOutcome, PageNavigator};
use super::pacing::{Pacing, Timeouts};
use super::product::ProductExtractor;
use super::progress::{ScrapeEvent, ScrapeProgress};
use super::scroll::scroll_and_wait;
use super::sites::Site;
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{PageContext, ProductRecord, ScrapeRequest};

/// Default number of scroll steps per page.
pub const DEFAULT_SCROLL_CYCLES: u32 = 25;

/// Tunables for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeOptions {
    pub scroll_cycles: u32,
    pub pacing: Pacing,
    pub timeouts: Timeouts,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            scroll_cycles: DEFAULT_SCROLL_CYCLES,
            pacing: Pacing::default(),
            timeouts: Timeouts::default(),
        }
    }
}

/// Where the run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Starting,
    Navigating { page: u32 },
    Scrolling { page: u32 },
    Locating { page: u32 },
    Extracting { page: u32 },
    Finished,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Starting => write!(f, "starting"),
            RunPhase::Navigating { page } => write!(f, "navigating page {}", page),
            RunPhase::Scrolling { page } => write!(f, "scrolling page {}", page),
            RunPhase::Locating { page } => write!(f, "locating cards on page {}", page),
            RunPhase::Extracting { page } => write!(f, "extracting page {}", page),
            RunPhase::Finished => write!(f, "finished"),
        }
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    ProductCap,
    PageCap,
    /// Aborted by a run-fatal error; records gathered before it are kept.
    Fatal(String),
}

impl FinishReason {
    pub fn is_fatal(&self) -> bool {
        matches!(self, FinishReason::Fatal(_))
    }
}

/// Per-run counters for the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub cards_seen: usize,
    pub rejected: usize,
    pub stale: usize,
    pub failed: usize,
    pub empty_pages: u32,
    pub degraded_pages: u32,
}

/// Result of [`ScrapeOrchestrator::run`].
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Accepted records in document order, never more than `max_products`.
    pub records: Vec<ProductRecord>,
    pub pages_visited: u32,
    pub finish: FinishReason,
    pub stats: RunStats,
}

/// Insertion-ordered records with a hard cap.
#[derive(Debug)]
struct RunAccumulator {
    records: Vec<ProductRecord>,
    cap: usize,
}

impl RunAccumulator {
    fn new(cap: usize) -> Self {
        Self {
            records: Vec::with_capacity(cap.min(512)),
            cap,
        }
    }

    fn is_full(&self) -> bool {
        self.records.len() >= self.cap
    }

    fn push(&mut self, record: ProductRecord) -> bool {
        if self.is_full() {
            return false;
        }
        self.records.push(record);
        true
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// Mutable state of one run.
#[derive(Debug)]
struct RunState {
    phase: RunPhase,
    pages_visited: u32,
    accumulator: RunAccumulator,
    stats: RunStats,
}

impl RunState {
    fn enter(&mut self, phase: RunPhase) {
        debug!("Run phase: {} -> {}", self.phase, phase);
        self.phase = phase;
    }
}

/// Drives one site through the page loop.
pub struct ScrapeOrchestrator<'a> {
    site: &'a dyn Site,
    options: ScrapeOptions,
    debug: DebugCapture,
    progress: Arc<dyn ScrapeProgress>,
}

impl<'a> ScrapeOrchestrator<'a> {
    pub fn new(
        site: &'a dyn Site,
        options: ScrapeOptions,
        debug: DebugCapture,
        progress: Arc<dyn ScrapeProgress>,
    ) -> Self {
        Self {
            site,
            options,
            debug,
            progress,
        }
    }

    /// Run `request` on `page`, taking ownership of the page.
    ///
    /// Never fails: a fatal error ends the run early and is reported in
    /// [`RunOutcome::finish`] together with the records gathered so far.
    pub async fn run<P: ScrapePage>(&self, page: P, request: &ScrapeRequest) -> RunOutcome {
        info!("Initializing {} scraper for '{}'", self.site.name(), request.query);
        self.progress.event(ScrapeEvent::RunStarted {
            site: self.site.name().to_string(),
            query: request.query.clone(),
        });

        let mut state = RunState {
            phase: RunPhase::Starting,
            pages_visited: 0,
            accumulator: RunAccumulator::new(request.max_products),
            stats: RunStats::default(),
        };

        let finish = match self.drive(&page, request, &mut state).await {
            Ok(reason) => reason,
            Err(e) => {
                error!("Run aborted while {}: {}", state.phase, e);
                self.progress.event(ScrapeEvent::RunAborted {
                    error: e.to_string(),
                });
                let artifacts = self.debug.capture(&page, FATAL_TAG).await;
                if !artifacts.is_empty() {
                    self.progress.event(ScrapeEvent::DebugCaptured {
                        tag: FATAL_TAG.to_string(),
                    });
                }
                FinishReason::Fatal(e.to_string())
            }
        };
        state.enter(RunPhase::Finished);

        if let Err(e) = page.close().await {
            warn!("Error while closing the browser: {}", e);
        }

        let RunState {
            pages_visited,
            accumulator,
            stats,
            ..
        } = state;
        self.progress.event(ScrapeEvent::RunFinished {
            total: accumulator.len(),
            pages: pages_visited,
        });

        RunOutcome {
            records: accumulator.records,
            pages_visited,
            finish,
            stats,
        }
    }

    /// The page loop. An `Err` is always run-fatal.
    async fn drive<P: ScrapePage>(
        &self,
        page: &P,
        request: &ScrapeRequest,
        state: &mut RunState,
    ) -> ScrapeResult<FinishReason> {
        let pacing = &self.options.pacing;
        let mut page_number = 1;

        while page_number <= request.max_pages && !state.accumulator.is_full() {
            self.scrape_page(page, request, page_number, state).await?;

            if state.accumulator.is_full() {
                info!("Reached maximum number of products ({})", request.max_products);
                break;
            }
            if page_number < request.max_pages && pacing.cooldown_due(page_number) {
                let delay = pacing.cooldown.sample();
                self.progress.event(ScrapeEvent::Cooldown {
                    after_pages: page_number,
                    delay,
                });
                tokio::time::sleep(delay).await;
            }
            page_number += 1;
        }

        Ok(if state.accumulator.is_full() {
            FinishReason::ProductCap
        } else {
            FinishReason::PageCap
        })
    }

    async fn scrape_page<P: ScrapePage>(
        &self,
        page: &P,
        request: &ScrapeRequest,
        page_number: u32,
        state: &mut RunState,
    ) -> ScrapeResult<()> {
        let options = &self.options;
        let context = PageContext {
            query: &request.query,
            page_number,
        };
        let url = self.site.build_url(context);

        state.enter(RunPhase::Navigating { page: page_number });
        state.pages_visited += 1;
        self.progress.event(ScrapeEvent::PageStarted {
            page: page_number,
            url: url.clone(),
        });

        let navigator = PageNavigator::new(&options.timeouts, &self.debug);
        let outcome = navigator
            .navigate_and_wait(page, &url, self.site.container_selectors(), page_number)
            .await?;
        if let LoadOutcome::Degraded { reason, artifacts } = outcome {
            state.stats.degraded_pages += 1;
            self.progress.event(ScrapeEvent::PageSlow {
                page: page_number,
                reason,
            });
            if !artifacts.is_empty() {
                self.progress.event(ScrapeEvent::DebugCaptured {
                    tag: timeout_tag(page_number),
                });
            }
        }

        options.pacing.dwell.pause().await;

        state.enter(RunPhase::Scrolling { page: page_number });
        match scroll_and_wait(page, options.scroll_cycles, &options.pacing).await {
            Ok(report) => debug!(
                "Scrolled {} cycles, height {} (stabilized: {})",
                report.cycles, report.final_height, report.stabilized
            ),
            Err(e) if e.is_run_fatal() => return Err(e),
            Err(e) => warn!("Scrolling page {} stopped early: {}", page_number, e),
        }

        state.enter(RunPhase::Locating { page: page_number });
        let cards = find_cards(
            page,
            self.site.card_selectors(),
            options.timeouts.card_wait(),
            options.timeouts.poll_interval(),
        )
        .await;

        if cards.is_empty() {
            state.stats.empty_pages += 1;
            self.progress.event(ScrapeEvent::NoCards { page: page_number });
            let tag = empty_page_tag(page_number);
            if !self.debug.capture(page, &tag).await.is_empty() {
                self.progress.event(ScrapeEvent::DebugCaptured { tag });
            }
            return Ok(());
        }
        self.progress.event(ScrapeEvent::CardsFound {
            page: page_number,
            count: cards.len(),
        });

        state.enter(RunPhase::Extracting { page: page_number });
        let extractor = ProductExtractor::new(self.site, options.pacing.card_settle);

        for (index, card) in cards.iter().enumerate() {
            if state.accumulator.is_full() {
                debug!("Product cap reached, {} cards left unread", cards.len() - index);
                break;
            }
            state.stats.cards_seen += 1;

            match extractor.extract(card).await {
                Ok(Some(record)) => {
                    let event = ScrapeEvent::ProductExtracted {
                        page: page_number,
                        index,
                        total: state.accumulator.len() + 1,
                        product_name: record.product_name.clone(),
                        price_raw: record.price_raw.clone(),
                        shop_name: record.shop_name.clone(),
                    };
                    if state.accumulator.push(record) {
                        self.progress.event(event);
                    }
                }
                Ok(None) => {
                    state.stats.rejected += 1;
                    self.progress.event(ScrapeEvent::CardRejected {
                        page: page_number,
                        index,
                    });
                }
                Err(ScrapeError::StaleElement) => {
                    state.stats.stale += 1;
                    self.progress.event(ScrapeEvent::CardStale {
                        page: page_number,
                        index,
                    });
                }
                Err(e) => {
                    state.stats.failed += 1;
                    self.progress.event(ScrapeEvent::CardFailed {
                        page: page_number,
                        index,
                        error: e.to_string(),
                    });
                }
            }
        }

        self.progress.event(ScrapeEvent::PageFinished {
            page: page_number,
            total: state.accumulator.len(),
        });
        Ok(())
    }
}
