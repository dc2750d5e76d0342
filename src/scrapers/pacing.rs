//! Delays and timeouts for one run.
//!
//! Every pause in the pipeline comes from here so a test can switch them all
//! off with [`Pacing::none`] while production keeps human-looking jitter.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Inclusive range of milliseconds to sleep, sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub const fn fixed(ms: u64) -> Self {
        Self::new(ms, ms)
    }

    pub const ZERO: DelayRange = DelayRange::fixed(0);

    pub fn sample(&self) -> Duration {
        let (lo, hi) = if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        };
        let ms = if lo == hi {
            lo
        } else {
            rand::thread_rng().gen_range(lo..=hi)
        };
        Duration::from_millis(ms)
    }

    /// Sleep for a sampled duration.
    pub async fn pause(&self) -> Duration {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        delay
    }
}

/// Pauses applied during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pacing {
    /// Dwell after the initial content shows up, before scrolling.
    pub dwell: DelayRange,
    /// Between scroll steps during the first few cycles.
    pub scroll_initial: DelayRange,
    /// How many cycles count as "first few".
    pub scroll_initial_cycles: u32,
    /// Between later scroll steps.
    pub scroll_steady: DelayRange,
    /// Extra wait before re-checking a height that did not grow.
    pub scroll_confirm: DelayRange,
    /// After the final jump to the bottom.
    pub settle_bottom: DelayRange,
    /// After returning to the top.
    pub settle_top: DelayRange,
    /// After centering a card, before reading it.
    pub card_settle: DelayRange,
    /// Longer break taken every `cooldown_every` pages.
    pub cooldown: DelayRange,
    pub cooldown_every: u32,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            dwell: DelayRange::new(2000, 4000),
            scroll_initial: DelayRange::new(2500, 3500),
            scroll_initial_cycles: 3,
            scroll_steady: DelayRange::new(1500, 2500),
            scroll_confirm: DelayRange::fixed(3000),
            settle_bottom: DelayRange::fixed(3000),
            settle_top: DelayRange::fixed(1000),
            card_settle: DelayRange::fixed(500),
            cooldown: DelayRange::new(5000, 10000),
            cooldown_every: 5,
        }
    }
}

impl Pacing {
    /// No pauses at all.
    pub fn none() -> Self {
        Self {
            dwell: DelayRange::ZERO,
            scroll_initial: DelayRange::ZERO,
            scroll_initial_cycles: 0,
            scroll_steady: DelayRange::ZERO,
            scroll_confirm: DelayRange::ZERO,
            settle_bottom: DelayRange::ZERO,
            settle_top: DelayRange::ZERO,
            card_settle: DelayRange::ZERO,
            cooldown: DelayRange::ZERO,
            cooldown_every: 5,
        }
    }

    /// Delay range for the scroll step with the given 0-based index.
    pub fn scroll_step(&self, cycle: u32) -> &DelayRange {
        if cycle < self.scroll_initial_cycles {
            &self.scroll_initial
        } else {
            &self.scroll_steady
        }
    }

    /// Whether to cool down after finishing `completed_pages` pages.
    pub fn cooldown_due(&self, completed_pages: u32) -> bool {
        self.cooldown_every > 0 && completed_pages > 0 && completed_pages % self.cooldown_every == 0
    }
}

/// Upper bounds on every wait in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Navigation until the load event.
    pub page_load_secs: u64,
    /// Initial content container after navigation.
    pub content_wait_secs: u64,
    /// Per card selector during card discovery; shorter than the content wait.
    pub card_wait_secs: u64,
    /// Polling interval for presence waits.
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            page_load_secs: 30,
            content_wait_secs: 20,
            card_wait_secs: 5,
            poll_interval_ms: 250,
        }
    }
}

impl Timeouts {
    /// Smallest possible bounds, for fixture-driven runs.
    pub fn immediate() -> Self {
        Self {
            page_load_secs: 1,
            content_wait_secs: 0,
            card_wait_secs: 0,
            poll_interval_ms: 1,
        }
    }

    /// Pull the card wait below the content wait.
    ///
    /// Card discovery tries several selectors in turn, so each one must give
    /// up sooner than the page-level wait. A zero content wait allows zero.
    pub fn clamped(mut self) -> Self {
        let max_card_wait = self.content_wait_secs.saturating_sub(1);
        if self.card_wait_secs > max_card_wait {
            warn!(
                "card_wait_secs ({}) must be shorter than content_wait_secs ({}), using {}",
                self.card_wait_secs, self.content_wait_secs, max_card_wait
            );
            self.card_wait_secs = max_card_wait;
        }
        self
    }

    pub fn page_load(&self) -> Duration {
        Duration::from_secs(self.page_load_secs)
    }

    pub fn content_wait(&self) -> Duration {
        Duration::from_secs(self.content_wait_secs)
    }

    pub fn card_wait(&self) -> Duration {
        Duration::from_secs(self.card_wait_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_stays_in_range() {
        let range = DelayRange::new(10, 20);
        for _ in 0..100 {
            let d = range.sample().as_millis() as u64;
            assert!((10..=20).contains(&d));
        }
        assert_eq!(DelayRange::new(20, 10).sample().as_millis() >= 10, true);
        assert_eq!(DelayRange::fixed(7).sample(), Duration::from_millis(7));
    }

    #[test]
    fn first_cycles_use_initial_range() {
        let pacing = Pacing::default();
        assert_eq!(pacing.scroll_step(0), &pacing.scroll_initial);
        assert_eq!(pacing.scroll_step(2), &pacing.scroll_initial);
        assert_eq!(pacing.scroll_step(3), &pacing.scroll_steady);
    }

    #[test]
    fn cooldown_every_fifth_page() {
        let pacing = Pacing::default();
        let due: Vec<u32> = (1..=12).filter(|&p| pacing.cooldown_due(p)).collect();
        assert_eq!(due, vec![5, 10]);

        let never = Pacing {
            cooldown_every: 0,
            ..Pacing::default()
        };
        assert!(!never.cooldown_due(5));
    }

    #[test]
    fn card_wait_stays_below_content_wait() {
        let timeouts = Timeouts {
            content_wait_secs: 10,
            card_wait_secs: 12,
            ..Timeouts::default()
        };
        assert_eq!(timeouts.clamped().card_wait_secs, 9);

        assert_eq!(Timeouts::default().clamped(), Timeouts::default());
        assert_eq!(Timeouts::immediate().clamped(), Timeouts::immediate());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let pacing: Pacing = toml::from_str(
            r#"
            cooldown_every = 3
            [dwell]
            min_ms = 100
            max_ms = 200
            "#,
        )
        .unwrap();
        assert_eq!(pacing.cooldown_every, 3);
        assert_eq!(pacing.dwell, DelayRange::new(100, 200));
        assert_eq!(pacing.settle_top, DelayRange::fixed(1000));
    }
}
