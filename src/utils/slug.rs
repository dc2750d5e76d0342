//! Collection keys for persisted batches.

/// Lowercase a query and join its alphanumeric runs with underscores.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Storage collection for one site/query pair, e.g. `products_tokopedia_gula_aren`.
pub fn collection_key(site: &str, query: &str) -> String {
    format!("products_{}_{}", slugify(site), slugify(query))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("gula aren"), "gula_aren");
        assert_eq!(slugify("  Virgin Coconut  Oil "), "virgin_coconut_oil");
        assert_eq!(slugify("briket-kelapa/shisha"), "briket_kelapa_shisha");
    }

    #[test]
    fn collection_key_format() {
        assert_eq!(
            collection_key("Tokopedia", "gula aren"),
            "products_tokopedia_gula_aren"
        );
    }
}
