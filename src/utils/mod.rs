//! Shared utility functions.
//!
//! - `numeric`: price and sold-count normalisation from listing text
//! - `slug`: collection keys derived from query text

mod numeric;
mod slug;

pub use numeric::{clean_price, clean_sold_count, extract_price_token};
pub use slug::{collection_key, slugify};
