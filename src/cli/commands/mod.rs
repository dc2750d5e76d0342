//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod clean;
mod scrape;
mod url;

use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::{Args, Parser, Subcommand};

use crate::config::{load_settings, Settings};
use crate::scrapers::SITE_NAMES;

fn site_parser() -> PossibleValuesParser {
    PossibleValuesParser::new(SITE_NAMES.iter().copied())
}

#[derive(Parser)]
#[command(name = "kelapa")]
#[command(about = "Marketplace listing scraper for coconut-derived commodities")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Product store URL, e.g. sqlite://products.db or jsonl://data
    #[arg(long, global = true, env = "KELAPA_STORE_URL")]
    store_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape search results for one or more queries and store them
    Scrape(ScrapeArgs),

    /// Clean a stored collection into analysis-ready JSON
    Clean {
        /// Collection to clean (e.g. products_tokopedia_gula_aren)
        collection: Option<String>,
        /// Clean every collection whose category can be inferred
        #[arg(short, long)]
        all: bool,
        /// Category override (gula_aren, briket_kelapa, coconut_sugar, virgin_coconut_oil)
        #[arg(long)]
        category: Option<String>,
        /// Output directory for cleaned_<category>.json files
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Print the search URL a scrape would open
    Url {
        /// Search query
        query: String,
        /// 1-based result page
        #[arg(short, long, default_value = "1")]
        page: u32,
        /// Marketplace
        #[arg(short, long, ignore_case = true, value_parser = site_parser())]
        site: Option<String>,
    },
}

#[derive(Args)]
struct ScrapeArgs {
    /// Search queries (defaults to the configured list)
    queries: Vec<String>,
    /// Marketplace
    #[arg(short, long, ignore_case = true, value_parser = site_parser())]
    site: Option<String>,
    /// Stop after this many products per query
    #[arg(short = 'n', long)]
    max_products: Option<usize>,
    /// Stop after this many result pages per query
    #[arg(short = 'p', long)]
    max_pages: Option<u32>,
    /// Scroll steps per page
    #[arg(long)]
    scroll_cycles: Option<u32>,
    /// Show the browser window
    #[arg(long)]
    headed: bool,
    /// Directory for debug screenshots and page dumps
    #[arg(long)]
    debug_dir: Option<PathBuf>,
    /// Print a line for every extracted product
    #[arg(short = 'P', long, conflicts_with = "quiet")]
    progress: bool,
    /// Report progress through the log instead of the console
    #[arg(short, long)]
    quiet: bool,
}

impl ScrapeArgs {
    fn apply_to(&self, settings: &mut Settings) {
        if !self.queries.is_empty() {
            settings.queries = self.queries.clone();
        }
        if let Some(ref site) = self.site {
            settings.site = site.clone();
        }
        if let Some(max) = self.max_products {
            settings.max_products = max;
        }
        if let Some(max) = self.max_pages {
            settings.max_pages = max;
        }
        if let Some(cycles) = self.scroll_cycles {
            settings.scroll_cycles = cycles;
        }
        if self.headed {
            settings.browser.headless = false;
        }
        if let Some(ref dir) = self.debug_dir {
            settings.debug_dir = dir.clone();
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut settings, _config) = load_settings(cli.config.as_deref()).await?;
    if let Some(url) = cli.store_url {
        settings.store_url = Some(url);
    }

    match cli.command {
        Commands::Scrape(args) => {
            args.apply_to(&mut settings);
            let mode = if args.quiet {
                scrape::ProgressMode::Log
            } else if args.progress {
                scrape::ProgressMode::PerCard
            } else {
                scrape::ProgressMode::Summary
            };
            scrape::cmd_scrape(&settings, mode).await
        }
        Commands::Clean {
            collection,
            all,
            category,
            output,
        } => {
            clean::cmd_clean(
                &settings,
                collection.as_deref(),
                all,
                category.as_deref(),
                &output,
            )
            .await
        }
        Commands::Url { query, page, site } => {
            url::cmd_url(site.as_deref().unwrap_or(&settings.site), &query, page)
        }
    }
}
