//! Navigation to a results page and the wait for its first content.

use tracing::{info, warn};

use super::browser::{wait_for_elements, ScrapePage};
use super::cascade::SelectorCascade;
use super::debug::{timeout_tag, DebugArtifacts, DebugCapture};
use super::pacing::Timeouts;
use crate::error::ScrapeResult;

/// How far a page got before we started working on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Load event fired and a content container appeared.
    Ready,
    /// Navigation or the content wait timed out. Partial content may
    /// still be scrapable; a debug capture was taken.
    Degraded {
        reason: String,
        artifacts: DebugArtifacts,
    },
}

impl LoadOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadOutcome::Ready)
    }
}

/// Issues navigations with bounded waits.
#[derive(Debug, Clone)]
pub struct PageNavigator<'a> {
    timeouts: &'a Timeouts,
    debug: &'a DebugCapture,
}

impl<'a> PageNavigator<'a> {
    pub fn new(timeouts: &'a Timeouts, debug: &'a DebugCapture) -> Self {
        Self { timeouts, debug }
    }

    /// Navigate to `url` and wait for any of `containers` to appear.
    ///
    /// Timeouts degrade the page instead of failing it: the page is captured
    /// as `timeout_page_<n>` and the caller carries on. Navigation errors
    /// and a dead browser are returned.
    pub async fn navigate_and_wait<P: ScrapePage>(
        &self,
        page: &P,
        url: &str,
        containers: &SelectorCascade,
        page_number: u32,
    ) -> ScrapeResult<LoadOutcome> {
        info!("Opening search page: {}", url);

        let mut degraded = None;
        match page.navigate(url, self.timeouts.page_load()).await {
            Ok(()) => {}
            Err(e) if e.is_timeout() => {
                warn!("Page load timed out, continuing with partial content: {}", e);
                degraded = Some(e.to_string());
            }
            Err(e) => return Err(e),
        }

        // One selector group, so whichever container renders first ends the wait
        let wait = wait_for_elements(
            page,
            &containers.as_group(),
            self.timeouts.content_wait(),
            self.timeouts.poll_interval(),
        )
        .await;

        match wait {
            Ok(found) => {
                info!("Initial product container loaded ({} elements)", found.len());
            }
            Err(e) if e.is_run_fatal() => return Err(e),
            Err(e) => {
                warn!("Initial content did not appear: {}", e);
                degraded.get_or_insert_with(|| e.to_string());
            }
        }

        match degraded {
            None => Ok(LoadOutcome::Ready),
            Some(reason) => {
                let artifacts = self.debug.capture(page, &timeout_tag(page_number)).await;
                Ok(LoadOutcome::Degraded { reason, artifacts })
            }
        }
    }
}
