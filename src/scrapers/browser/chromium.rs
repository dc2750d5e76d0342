//! chromiumoxide implementation of the page driver.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, Page};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::cookies::load_cookies;
use super::page::{CardElement, ScrapePage};
use super::stealth::STEALTH_SCRIPTS;
use super::BrowserSettings;
use crate::error::{ScrapeError, ScrapeResult};

/// CDP error texts that mean the node behind a handle is gone.
const STALE_MARKERS: &[&str] = &[
    "Could not find node with given id",
    "No node with given id found",
    "Node is detached from document",
    "Cannot find context with specified id",
    "Node with given id does not belong to the document",
];

/// Map a CDP error onto the scraping taxonomy.
fn classify(err: CdpError) -> ScrapeError {
    let message = err.to_string();
    if STALE_MARKERS.iter().any(|m| message.contains(m)) {
        return ScrapeError::StaleElement;
    }
    if message.contains("timed out") || message.contains("Timeout") {
        return ScrapeError::Timeout {
            what: "browser response".to_string(),
            after: Duration::ZERO,
        };
    }
    ScrapeError::Browser(message)
}

/// A live browser tab together with the browser process that owns it.
pub struct ChromiumPage {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    stealth: bool,
    /// Connected to someone else's browser: leave it running on close.
    remote: bool,
}

impl ChromiumPage {
    pub(crate) async fn open(
        browser: Browser,
        handler: JoinHandle<()>,
        settings: &BrowserSettings,
        remote: bool,
    ) -> ScrapeResult<Self> {
        let page = browser.new_page("about:blank").await.map_err(classify)?;

        // User agent has to be in place before the first real navigation
        page.execute(SetUserAgentOverrideParams::new(settings.user_agent.clone()))
            .await
            .map_err(classify)?;

        if let Some(ref cookies_file) = settings.cookies_file {
            if cookies_file.exists() {
                load_cookies(&page, cookies_file).await?;
            } else {
                warn!("Cookies file not found: {:?}", cookies_file);
            }
        }

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
            stealth: settings.stealth,
            remote,
        })
    }

    async fn apply_stealth(&self) {
        debug!("Applying stealth scripts");
        for script in STEALTH_SCRIPTS {
            if let Err(e) = self.page.evaluate(script.to_string()).await {
                debug!("Stealth script injection skipped: {}", e);
            }
        }
    }

    async fn eval_f64(&self, expression: &str) -> ScrapeResult<f64> {
        self.page
            .evaluate(expression.to_string())
            .await
            .map_err(classify)?
            .into_value::<f64>()
            .map_err(|e| ScrapeError::Script(format!("{}: {}", expression, e)))
    }

    async fn eval_unit(&self, expression: String) -> ScrapeResult<()> {
        self.page.evaluate(expression).await.map_err(classify)?;
        Ok(())
    }
}

#[async_trait]
impl ScrapePage for ChromiumPage {
    type Element = ChromiumElement;

    async fn navigate(&self, url: &str, timeout: Duration) -> ScrapeResult<()> {
        info!("Navigating to {}", url);
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Err(_) => {
                return Err(ScrapeError::Timeout {
                    what: format!("page load of {}", url),
                    after: timeout,
                })
            }
            Ok(Err(e)) => {
                return match classify(e) {
                    timeout_err @ ScrapeError::Timeout { .. } => Err(timeout_err),
                    other => Err(ScrapeError::Navigation {
                        url: url.to_string(),
                        message: other.to_string(),
                    }),
                }
            }
            Ok(Ok(_)) => {}
        }

        if self.stealth {
            self.apply_stealth().await;
        }
        Ok(())
    }

    async fn find_elements(&self, selector: &str) -> ScrapeResult<Vec<ChromiumElement>> {
        let elements = self.page.find_elements(selector).await.map_err(classify)?;
        Ok(elements.into_iter().map(ChromiumElement).collect())
    }

    async fn document_height(&self) -> ScrapeResult<f64> {
        self.eval_f64("document.body.scrollHeight").await
    }

    async fn viewport_height(&self) -> ScrapeResult<f64> {
        self.eval_f64("window.innerHeight").await
    }

    async fn scroll_to(&self, y: f64) -> ScrapeResult<()> {
        self.eval_unit(format!("window.scrollTo(0, {});", y)).await
    }

    async fn scroll_to_bottom(&self) -> ScrapeResult<()> {
        self.eval_unit("window.scrollTo(0, document.body.scrollHeight);".to_string())
            .await
    }

    async fn screenshot(&self) -> ScrapeResult<Vec<u8>> {
        self.page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .map_err(classify)
    }

    async fn content(&self) -> ScrapeResult<String> {
        self.page.content().await.map_err(classify)
    }

    async fn close(self) -> ScrapeResult<()> {
        let Self {
            browser,
            page,
            handler,
            remote,
            ..
        } = self;

        info!("Closing browser");
        if let Err(e) = page.close().await {
            debug!("Page close failed: {}", e);
        }

        if !remote {
            let mut browser = browser.into_inner();
            if let Err(e) = browser.close().await {
                warn!("Browser close failed: {}", e);
            }
            if let Err(e) = browser.wait().await {
                warn!("Waiting for browser exit failed: {}", e);
            }
        }

        handler.abort();
        Ok(())
    }
}

/// Element handle inside a [`ChromiumPage`].
pub struct ChromiumElement(Element);

#[async_trait]
impl CardElement for ChromiumElement {
    async fn find_element(&self, selector: &str) -> ScrapeResult<Self> {
        // querySelectorAll keeps "no match" distinct from a dead node
        self.find_elements(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ScrapeError::ElementNotFound(selector.to_string()))
    }

    async fn find_elements(&self, selector: &str) -> ScrapeResult<Vec<Self>> {
        let elements = self.0.find_elements(selector).await.map_err(classify)?;
        Ok(elements.into_iter().map(ChromiumElement).collect())
    }

    async fn text(&self) -> ScrapeResult<String> {
        Ok(self.0.inner_text().await.map_err(classify)?.unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> ScrapeResult<Option<String>> {
        self.0.attribute(name).await.map_err(classify)
    }

    async fn scroll_into_view(&self) -> ScrapeResult<()> {
        self.0
            .call_js_fn(
                "function() { this.scrollIntoView({block: 'center'}); }",
                false,
            )
            .await
            .map_err(classify)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_node_errors_are_classified() {
        let err = classify(CdpError::ChromeMessage(
            "Could not find node with given id".to_string(),
        ));
        assert!(err.is_stale());

        let err = classify(CdpError::ChromeMessage("Target closed".to_string()));
        assert!(err.is_run_fatal());
    }
}
