//! Configuration management for kelapa using the prefer crate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scrapers::{BrowserSettings, Pacing, ScrapeOptions, Timeouts, DEFAULT_SCROLL_CYCLES};

/// Environment variable that overrides `store_url`.
pub const STORE_URL_ENV: &str = "KELAPA_STORE_URL";

pub const DEFAULT_SITE: &str = "tokopedia";
pub const DEFAULT_QUERY: &str = "gula aren";
pub const DEFAULT_MAX_PRODUCTS: usize = 500;
pub const DEFAULT_MAX_PAGES: u32 = 50;
pub const DEFAULT_DEBUG_DIR: &str = "debug_output";

/// Application settings after config file, environment and defaults are merged.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Product store URL (`sqlite://…` or `jsonl://…`).
    pub store_url: Option<String>,
    /// Where screenshots and page dumps go when a page misbehaves.
    pub debug_dir: PathBuf,
    pub site: String,
    pub queries: Vec<String>,
    pub max_products: usize,
    pub max_pages: u32,
    pub scroll_cycles: u32,
    pub browser: BrowserSettings,
    pub pacing: Pacing,
    pub timeouts: Timeouts,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_url: None,
            debug_dir: PathBuf::from(DEFAULT_DEBUG_DIR),
            site: DEFAULT_SITE.to_string(),
            queries: vec![DEFAULT_QUERY.to_string()],
            max_products: DEFAULT_MAX_PRODUCTS,
            max_pages: DEFAULT_MAX_PAGES,
            scroll_cycles: DEFAULT_SCROLL_CYCLES,
            browser: BrowserSettings::default(),
            pacing: Pacing::default(),
            timeouts: Timeouts::default(),
        }
    }
}

impl Settings {
    /// The configured store URL; scraping and cleaning cannot start without one.
    pub fn store_url(&self) -> Result<&str, ConfigError> {
        self.store_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingStoreUrl)
    }

    pub fn scrape_options(&self) -> ScrapeOptions {
        ScrapeOptions {
            scroll_cycles: self.scroll_cycles,
            pacing: self.pacing.clone(),
            timeouts: self.timeouts.clone(),
        }
    }

    /// Replace `store_url` with a non-empty environment value.
    fn apply_store_url_override(&mut self, env_value: Option<String>) {
        if let Some(url) = env_value.filter(|s| !s.trim().is_empty()) {
            tracing::debug!("Using {} from environment", STORE_URL_ENV);
            self.store_url = Some(url);
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_dir: Option<String>,
    /// Marketplace to scrape (`tokopedia` or `shopee`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queries: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_products: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_cycles: Option<u32>,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub pacing: Pacing,
    #[serde(default)]
    pub timeouts: Timeouts,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers kelapa config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("kelapa").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config file: {}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_error = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| parse_error(e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_error(e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| parse_error(e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref url) = self.store_url {
            settings.store_url = Some(url.clone());
        }
        if let Some(ref dir) = self.debug_dir {
            settings.debug_dir = self.resolve_path(dir, base_dir);
        }
        if let Some(ref site) = self.site {
            settings.site = site.clone();
        }
        if !self.queries.is_empty() {
            settings.queries = self.queries.clone();
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
        if let Some(ref cookies) = self.browser.cookies_file {
            let resolved = self.resolve_path(&cookies.to_string_lossy(), base_dir);
            settings.browser = BrowserSettings {
                cookies_file: Some(resolved),
                ..self.browser.clone()
            };
        } else {
            settings.browser = self.browser.clone();
        }
        settings.pacing = self.pacing.clone();
        settings.timeouts = self.timeouts.clone().clamped();
    }
}

/// Load settings, preferring an explicit config file over discovery.
///
/// An explicit path that cannot be read or parsed is an error; a discovered
/// file that fails to parse is ignored with a warning.
pub async fn load_settings(config_path: Option<&Path>) -> Result<(Settings, Config), ConfigError> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);
    settings.apply_store_url_override(std::env::var(STORE_URL_ENV).ok());

    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }
    Ok((settings, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn toml_config_overrides_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("kelapa.toml");
        std::fs::write(
            &path,
            r#"
            store_url = "sqlite://products.db"
            debug_dir = "debug"
            site = "shopee"
            queries = ["gula aren", "briket kelapa"]
            max_products = 100

            [browser]
            headless = false

            [timeouts]
            page_load_secs = 45
            "#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, tmp.path());

        assert_eq!(settings.store_url().unwrap(), "sqlite://products.db");
        assert_eq!(settings.debug_dir, tmp.path().join("debug"));
        assert_eq!(settings.site, "shopee");
        assert_eq!(settings.queries.len(), 2);
        assert_eq!(settings.max_products, 100);
        assert_eq!(settings.max_pages, DEFAULT_MAX_PAGES);
        assert!(!settings.browser.headless);
        assert_eq!(settings.timeouts.page_load_secs, 45);
        assert_eq!(settings.timeouts.content_wait_secs, 20);
        assert_eq!(config.base_dir().as_deref(), Some(tmp.path()));
    }

    #[tokio::test]
    async fn card_wait_is_clamped_on_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("kelapa.toml");
        std::fs::write(&path, "[timeouts]\ncontent_wait_secs = 8\ncard_wait_secs = 8\n").unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, tmp.path());

        assert_eq!(settings.timeouts.content_wait_secs, 8);
        assert_eq!(settings.timeouts.card_wait_secs, 7);
        assert!(settings.timeouts.card_wait() < settings.timeouts.content_wait());
    }

    #[tokio::test]
    async fn yaml_and_json_by_extension() {
        let tmp = tempfile::tempdir().unwrap();

        let yaml = tmp.path().join("kelapa.yaml");
        std::fs::write(&yaml, "max_pages: 3\nqueries:\n  - vco\n").unwrap();
        let config = Config::load_from_path(&yaml).await.unwrap();
        assert_eq!(config.max_pages, Some(3));
        assert_eq!(config.queries, vec!["vco"]);

        let json = tmp.path().join("kelapa.json");
        std::fs::write(&json, r#"{"scroll_cycles": 5}"#).unwrap();
        let config = Config::load_from_path(&json).await.unwrap();
        assert_eq!(config.scroll_cycles, Some(5));
    }

    #[tokio::test]
    async fn unreadable_or_malformed_files_are_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = Config::load_from_path(&tmp.path().join("nope.toml")).await;
        assert!(matches!(missing, Err(ConfigError::Read { .. })));

        let bad = tmp.path().join("bad.toml");
        std::fs::write(&bad, "max_pages = \"many\"").unwrap();
        assert!(matches!(
            Config::load_from_path(&bad).await,
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn store_url_is_required_and_env_wins() {
        let mut settings = Settings::default();
        assert!(matches!(settings.store_url(), Err(ConfigError::MissingStoreUrl)));

        settings.store_url = Some("sqlite://a.db".into());
        settings.apply_store_url_override(Some("  ".into()));
        assert_eq!(settings.store_url().unwrap(), "sqlite://a.db");

        settings.apply_store_url_override(Some("jsonl:///tmp/kelapa".into()));
        assert_eq!(settings.store_url().unwrap(), "jsonl:///tmp/kelapa");
    }

    #[test]
    fn resolve_path_handles_absolute_and_relative() {
        let config = Config::default();
        let base = Path::new("/etc/kelapa");
        assert_eq!(config.resolve_path("/var/debug", base), PathBuf::from("/var/debug"));
        assert_eq!(config.resolve_path("debug", base), PathBuf::from("/etc/kelapa/debug"));
    }

    #[test]
    fn scrape_options_carry_tunables() {
        let settings = Settings {
            scroll_cycles: 7,
            ..Settings::default()
        };
        let options = settings.scrape_options();
        assert_eq!(options.scroll_cycles, 7);
        assert_eq!(options.timeouts, Timeouts::default());
    }
}
