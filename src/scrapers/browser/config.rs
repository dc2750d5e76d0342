//! Browser session configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Desktop Chrome user agent presented to marketplaces.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Browser session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Run in headless mode (default: true).
    /// Set to false to watch the run or when headless detection is an issue.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Inject the stealth scripts after each navigation (default: true).
    #[serde(default = "default_stealth")]
    pub stealth: bool,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    #[serde(default)]
    pub proxy: Option<String>,

    /// JSON cookie export loaded into the session before the first navigation.
    #[serde(default)]
    pub cookies_file: Option<PathBuf>,

    /// Browser window size in pixels.
    #[serde(default = "default_window")]
    pub window: (u32, u32),

    /// User agent override.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to an existing browser instead of launching one.
    #[serde(default)]
    pub remote_url: Option<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            stealth: default_stealth(),
            proxy: None,
            cookies_file: None,
            window: default_window(),
            user_agent: default_user_agent(),
            chrome_args: Vec::new(),
            remote_url: None,
        }
    }
}

pub fn default_headless() -> bool {
    true
}

fn default_stealth() -> bool {
    true
}

fn default_window() -> (u32, u32) {
    (1920, 1080)
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_uses_defaults() {
        let settings: BrowserSettings = toml::from_str("").unwrap();
        assert!(settings.headless);
        assert!(settings.stealth);
        assert_eq!(settings.window, (1920, 1080));
        assert_eq!(settings.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn headed_with_proxy() {
        let settings: BrowserSettings = toml::from_str(
            r#"
            headless = false
            proxy = "socks5://127.0.0.1:1080"
            chrome_args = ["--lang=id-ID"]
            "#,
        )
        .unwrap();
        assert!(!settings.headless);
        assert_eq!(settings.proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
        assert_eq!(settings.chrome_args, vec!["--lang=id-ID"]);
    }
}
