//! Bounded polling waits.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::page::ScrapePage;
use crate::error::{ScrapeError, ScrapeResult};

/// Poll until `selector` matches at least one element or `timeout` elapses.
///
/// Returns the matches from the first successful poll. Run-fatal driver
/// errors are propagated immediately; anything else counts as "not yet".
/// Each individual query is itself bounded by the remaining time.
pub async fn wait_for_elements<P: ScrapePage>(
    page: &P,
    selector: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> ScrapeResult<Vec<P::Element>> {
    let deadline = Instant::now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        // Always allow one query, even with a zero timeout.
        let budget = remaining.max(poll_interval);

        match tokio::time::timeout(budget, page.find_elements(selector)).await {
            Ok(Ok(found)) if !found.is_empty() => return Ok(found),
            Ok(Ok(_)) => {}
            Ok(Err(e)) if e.is_run_fatal() => return Err(e),
            Ok(Err(e)) => debug!("Query for {} failed while waiting: {}", selector, e),
            Err(_) => debug!("Query for {} did not answer within {:?}", selector, budget),
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ScrapeError::Timeout {
                what: format!("selector {}", selector),
                after: timeout,
            });
        }
        tokio::time::sleep(poll_interval.min(remaining)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::browser::FixturePage;

    #[tokio::test]
    async fn returns_matches_when_present() {
        let page = FixturePage::builder()
            .page("https://shop.test/", r#"<div class="card">a</div><div class="card">b</div>"#)
            .build();
        page.navigate("https://shop.test/", Duration::from_secs(1))
            .await
            .unwrap();

        let found = wait_for_elements(&page, ".card", Duration::ZERO, Duration::from_millis(5))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn times_out_without_matches() {
        let page = FixturePage::builder()
            .page("https://shop.test/", "<p>empty</p>")
            .build();
        page.navigate("https://shop.test/", Duration::from_secs(1))
            .await
            .unwrap();

        let err = wait_for_elements(
            &page,
            ".card",
            Duration::from_millis(20),
            Duration::from_millis(5),
        )
        .await
        .unwrap_err();
        assert!(err.is_timeout());
    }
}
