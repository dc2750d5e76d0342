//! Scrape command: one isolated browser session per query.

use std::sync::Arc;

use anyhow::Context;
use console::{style, Term};

use crate::cli::ConsoleProgress;
use crate::config::Settings;
use crate::models::ScrapeRequest;
use crate::scrapers::browser::validate_cookie_file;
use crate::scrapers::{
    site_by_name, BrowserLauncher, DebugCapture, FinishReason, ScrapeOrchestrator, ScrapeProgress,
    TracingProgress,
};
use crate::storage::open_store;

/// How a run reports its progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// Styled page-level lines.
    Summary,
    /// Styled lines including every extracted product.
    PerCard,
    /// Plain log records only.
    Log,
}

impl ProgressMode {
    fn sink(self, is_term: bool) -> Arc<dyn ScrapeProgress> {
        match self {
            ProgressMode::Log => Arc::new(TracingProgress),
            // Styled output is noise in a pipe
            _ if !is_term => Arc::new(TracingProgress),
            ProgressMode::Summary => Arc::new(ConsoleProgress::new(false)),
            ProgressMode::PerCard => Arc::new(ConsoleProgress::new(true)),
        }
    }
}

/// Scrape every configured query and save each batch to its collection.
pub async fn cmd_scrape(settings: &Settings, mode: ProgressMode) -> anyhow::Result<()> {
    // Refuse to start without somewhere to put the results
    let store_url = settings.store_url()?;
    let site = site_by_name(&settings.site)?;
    let store = open_store(store_url).with_context(|| format!("Failed to open store {}", store_url))?;
    let debug = DebugCapture::new(&settings.debug_dir, site.debug_prefix())?;
    if let Some(ref cookies) = settings.browser.cookies_file {
        let count = validate_cookie_file(cookies)
            .with_context(|| format!("Unusable cookies file {}", cookies.display()))?;
        tracing::info!("Using {} session cookies from {}", count, cookies.display());
    }
    let launcher = BrowserLauncher::new(settings.browser.clone(), settings.timeouts.page_load());
    let progress = mode.sink(Term::stdout().is_term());

    if settings.queries.is_empty() {
        println!("{} No queries configured", style("!").yellow());
        return Ok(());
    }

    let mut saved_total = 0;
    for query in &settings.queries {
        tracing::info!("===== Starting scrape for '{}' =====", query);
        let request = ScrapeRequest::new(query.as_str(), settings.max_products, settings.max_pages)?;

        let page = match launcher.launch().await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Could not start browser for '{}': {}", query, e);
                println!("{} '{}': {}", style("✗").red(), query, e);
                continue;
            }
        };

        let orchestrator = ScrapeOrchestrator::new(
            site.as_ref(),
            settings.scrape_options(),
            debug.clone(),
            Arc::clone(&progress),
        );
        let outcome = orchestrator.run(page, &request).await;

        let mut records = outcome.records;
        for record in &mut records {
            record.search_query = Some(query.clone());
        }

        if records.is_empty() {
            tracing::warn!("No products scraped for query '{}'", query);
            println!("{} No products for '{}'", style("!").yellow(), query);
            continue;
        }

        let collection = site.collection_for(query);
        let saved = store.save(&records, &collection).await;
        saved_total += saved;

        let note = match outcome.finish {
            FinishReason::ProductCap => "product cap reached".to_string(),
            FinishReason::PageCap => "page cap reached".to_string(),
            FinishReason::Fatal(ref e) => format!("aborted early: {}", e),
        };
        println!(
            "{} Saved {}/{} products for '{}' to {} ({})",
            if outcome.finish.is_fatal() {
                style("!").yellow()
            } else {
                style("✓").green()
            },
            saved,
            records.len(),
            query,
            style(&collection).bold(),
            note
        );
        tracing::debug!(
            "'{}': {} cards seen, {} rejected, {} stale, {} failed, {} empty pages, {} slow pages",
            query,
            outcome.stats.cards_seen,
            outcome.stats.rejected,
            outcome.stats.stale,
            outcome.stats.failed,
            outcome.stats.empty_pages,
            outcome.stats.degraded_pages
        );
    }

    store.close().await;
    println!(
        "\n{} Done: {} products saved across {} queries",
        style("==>").cyan().bold(),
        saved_total,
        settings.queries.len()
    );
    Ok(())
}
