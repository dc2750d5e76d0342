//! Incremental scrolling to trigger lazy-loaded results.

use tracing::{debug, info};

use super::browser::ScrapePage;
use super::pacing::Pacing;
use crate::error::ScrapeResult;

/// What a scroll pass did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollReport {
    /// Scroll steps performed.
    pub cycles: u32,
    /// Document height after the last step.
    pub final_height: f64,
    /// The loop ended early because the height stopped growing.
    pub stabilized: bool,
}

/// Scroll down one viewport at a time until the page stops growing or
/// `max_cycles` steps have been made, then jump to the bottom and back to
/// the top.
///
/// Step `i` (0-based) targets `(i + 1) * viewport`. When a step leaves the
/// document height unchanged the height is re-read once after the confirm
/// pause; if it is still unchanged the loop ends.
pub async fn scroll_and_wait<P: ScrapePage>(
    page: &P,
    max_cycles: u32,
    pacing: &Pacing,
) -> ScrapeResult<ScrollReport> {
    let mut last_height = page.document_height().await?;
    let viewport = page.viewport_height().await?;
    debug!("Scrolling: height {} viewport {}", last_height, viewport);

    let mut report = ScrollReport {
        cycles: 0,
        final_height: last_height,
        stabilized: false,
    };

    for cycle in 0..max_cycles {
        page.scroll_to(f64::from(cycle + 1) * viewport).await?;
        report.cycles = cycle + 1;

        if cycle % 5 == 0 {
            info!("Incremental scrolling ({}/{})", cycle + 1, max_cycles);
        }
        pacing.scroll_step(cycle).pause().await;

        let mut new_height = page.document_height().await?;
        if new_height == last_height {
            debug!("Height unchanged at {}, confirming", new_height);
            pacing.scroll_confirm.pause().await;

            new_height = page.document_height().await?;
            if new_height == last_height {
                debug!("No more content loading after {} cycles", cycle + 1);
                report.stabilized = true;
                break;
            }
        }
        last_height = new_height;
    }
    report.final_height = last_height;

    page.scroll_to_bottom().await?;
    pacing.settle_bottom.pause().await;

    page.scroll_to(0.0).await?;
    pacing.settle_top.pause().await;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::scrapers::browser::FixturePage;

    async fn loaded(page: FixturePage) -> FixturePage {
        page.navigate("https://shop.test/", Duration::from_secs(1))
            .await
            .unwrap();
        page
    }

    #[tokio::test]
    async fn stops_once_height_settles() {
        // 1000 -> 1500 -> 2000 -> 2000: third step sees no growth
        let page = loaded(
            FixturePage::builder()
                .viewport_height(500.0)
                .scroll_growth(1000.0, 500.0, 2000.0)
                .build(),
        )
        .await;
        let probe = page.probe();

        let report = scroll_and_wait(&page, 25, &Pacing::none()).await.unwrap();
        assert!(report.stabilized);
        assert_eq!(report.cycles, 3);
        assert_eq!(report.final_height, 2000.0);

        let scrolls = probe.state().scrolls.clone();
        assert_eq!(&scrolls[..3], &[500.0, 1000.0, 1500.0]);
        // final bottom jump, then back to top
        assert_eq!(scrolls[3], 2000.0);
        assert_eq!(scrolls[4], 0.0);
        assert_eq!(probe.state().scroll_y, 0.0);
    }

    #[tokio::test]
    async fn cycle_budget_bounds_growing_pages() {
        let page = loaded(
            FixturePage::builder()
                .viewport_height(100.0)
                .scroll_growth(1000.0, 100.0, 1_000_000.0)
                .build(),
        )
        .await;
        let probe = page.probe();

        let report = scroll_and_wait(&page, 4, &Pacing::none()).await.unwrap();
        assert!(!report.stabilized);
        assert_eq!(report.cycles, 4);
        assert_eq!(probe.state().scrolls.len(), 6);
    }

    #[tokio::test]
    async fn zero_cycles_still_resets_to_top() {
        let page = loaded(FixturePage::builder().build()).await;
        let probe = page.probe();

        let report = scroll_and_wait(&page, 0, &Pacing::none()).await.unwrap();
        assert_eq!(report.cycles, 0);
        assert_eq!(probe.state().scrolls, vec![2400.0, 0.0]);
    }
}
