//! Data models for scrape runs and extracted products.

mod product;

pub use product::{PageContext, ProductRecord, RawProductFields, ScrapeRequest};
