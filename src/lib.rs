//! kelapa - marketplace listing scraper for coconut-derived commodities.
//!
//! Drives a browser through marketplace search results, extracts product
//! cards into [`models::ProductRecord`]s, stores them per query, and cleans
//! stored collections for analysis.

pub mod cleaning;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod scrapers;
pub mod storage;
pub mod utils;
