//! Clean command: stored collection in, cleaned JSON out.

use std::path::Path;

use anyhow::{bail, Context};
use console::style;

use crate::cleaning::{clean_records, Category};
use crate::config::Settings;
use crate::storage::{open_store, ProductStore};

/// Clean one collection, or every collection with a recognisable category.
pub async fn cmd_clean(
    settings: &Settings,
    collection: Option<&str>,
    all: bool,
    category: Option<&str>,
    output_dir: &Path,
) -> anyhow::Result<()> {
    let store_url = settings.store_url()?;
    let store = open_store(store_url).with_context(|| format!("Failed to open store {}", store_url))?;
    let category_override = category
        .map(|c| c.parse::<Category>())
        .transpose()
        .map_err(anyhow::Error::msg)?;

    let targets: Vec<String> = match (collection, all) {
        (Some(name), _) => vec![name.to_string()],
        (None, true) => store.collections().await?,
        (None, false) => {
            let available = store.collections().await?;
            println!(
                "{} No collection specified. Use --all or name one.",
                style("✗").red()
            );
            if !available.is_empty() {
                println!("Available collections: {}", available.join(", "));
            }
            return Ok(());
        }
    };

    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    for name in &targets {
        let Some(category) = category_override.or_else(|| Category::from_collection(name)) else {
            if collection.is_some() {
                bail!(
                    "Cannot infer a category from '{}'; pass --category explicitly",
                    name
                );
            }
            println!("{} Skipping {} (unknown category)", style("-").dim(), name);
            continue;
        };
        clean_collection(store.as_ref(), name, category, output_dir).await?;
    }

    store.close().await;
    Ok(())
}

async fn clean_collection(
    store: &dyn ProductStore,
    collection: &str,
    category: Category,
    output_dir: &Path,
) -> anyhow::Result<()> {
    let records = store
        .load(collection)
        .await
        .with_context(|| format!("Failed to load {}", collection))?;
    let loaded = records.len();
    let report = clean_records(records, category);

    let path = output_dir.join(format!("cleaned_{}.json", category.slug()));
    let json = serde_json::to_string_pretty(&report.products)?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "{} {} → {} ({} of {} kept; {} irrelevant, {} duplicate, {} price out of range)",
        style("✓").green(),
        collection,
        style(path.display()).bold(),
        report.products.len(),
        loaded,
        report.dropped_irrelevant,
        report.dropped_duplicates,
        report.dropped_price
    );
    Ok(())
}
