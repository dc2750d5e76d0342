//! Print the navigation target for a query.

use crate::models::PageContext;
use crate::scrapers::site_by_name;

pub fn cmd_url(site: &str, query: &str, page: u32) -> anyhow::Result<()> {
    let site = site_by_name(site)?;
    let page_number = page.max(1);
    println!(
        "{}",
        site.build_url(PageContext {
            query,
            page_number,
        })
    );
    Ok(())
}
