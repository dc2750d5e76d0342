//! Styled terminal output for scrape runs.

use console::style;

use crate::scrapers::{ScrapeEvent, ScrapeProgress};

/// Prints run progress to the terminal.
///
/// Per-card lines are only shown with `per_card`; page-level events always are.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress {
    per_card: bool,
}

impl ConsoleProgress {
    pub fn new(per_card: bool) -> Self {
        Self { per_card }
    }
}

impl ScrapeProgress for ConsoleProgress {
    fn event(&self, event: ScrapeEvent) {
        match event {
            ScrapeEvent::RunStarted { site, query } => {
                println!(
                    "\n{} {} '{}'",
                    style("==>").cyan().bold(),
                    style(site).bold(),
                    query
                );
            }
            ScrapeEvent::PageStarted { page, url } => {
                println!("  {} page {} {}", style("→").cyan(), page, style(url).dim());
            }
            ScrapeEvent::PageSlow { page, reason } => {
                println!(
                    "  {} page {} slow to load ({}), scraping what rendered",
                    style("!").yellow(),
                    page,
                    reason
                );
            }
            ScrapeEvent::CardsFound { page, count } => {
                println!("    {} product cards on page {}", count, page);
            }
            ScrapeEvent::NoCards { page } => {
                println!("  {} no product cards on page {}", style("!").yellow(), page);
            }
            ScrapeEvent::ProductExtracted {
                index,
                product_name,
                price_raw,
                ..
            } if self.per_card => {
                println!(
                    "    {} {:>3}. {} {}",
                    style("✓").green(),
                    index + 1,
                    product_name,
                    style(price_raw).dim()
                );
            }
            ScrapeEvent::CardFailed { index, error, .. } if self.per_card => {
                println!("    {} {:>3}. {}", style("✗").red(), index + 1, error);
            }
            ScrapeEvent::PageFinished { page, total } => {
                println!(
                    "  {} page {} done ({} products so far)",
                    style("✓").green(),
                    page,
                    total
                );
            }
            ScrapeEvent::Cooldown { after_pages, delay } => {
                println!(
                    "  {} cooling down {:.1}s after {} pages",
                    style("…").dim(),
                    delay.as_secs_f32(),
                    after_pages
                );
            }
            ScrapeEvent::DebugCaptured { tag } => {
                println!("  {} saved debug capture '{}'", style("i").blue(), tag);
            }
            ScrapeEvent::RunAborted { error } => {
                println!("  {} run aborted: {}", style("✗").red().bold(), error);
            }
            ScrapeEvent::RunFinished { total, pages } => {
                println!(
                    "{} {} products from {} pages",
                    style("==>").cyan().bold(),
                    style(total).bold(),
                    pages
                );
            }
            _ => {}
        }
    }
}
