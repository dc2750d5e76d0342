//! Browser session management and the page driver seam.
//!
//! Uses chromiumoxide (CDP) with a small set of stealth patches to drive
//! marketplace search pages that only render client-side.

#[cfg(feature = "browser")]
mod chromium;
mod config;
mod cookies;
mod fixture;
mod page;
#[cfg(feature = "browser")]
mod stealth;
mod wait;

#[cfg(feature = "browser")]
pub use chromium::{ChromiumElement, ChromiumPage};
pub use config::{BrowserSettings, DEFAULT_USER_AGENT};
pub use cookies::{parse_cookie_export, validate_cookie_file, SessionCookie};
pub use fixture::{FixtureElement, FixturePage, FixturePageBuilder, FixtureProbe, FixtureState, STALE_MARKER};
pub use page::{CardElement, ScrapePage};
pub use wait::wait_for_elements;

use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tracing::info;

use crate::error::{ScrapeError, ScrapeResult};

/// Common Chrome executable paths to check.
const CHROME_PATHS: &[&str] = &[
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    // Common install locations
    "/opt/google/chrome/google-chrome",
];

/// Find a Chrome/Chromium executable on this machine.
pub fn find_chrome() -> ScrapeResult<PathBuf> {
    if let Some(path) = CHROME_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
    {
        return Ok(path);
    }

    for cmd in &[
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Ok(PathBuf::from(path));
                }
            }
        }
    }

    Err(ScrapeError::Browser(
        "Chrome/Chromium not found. Please install it:\n\
         - Arch/Manjaro: sudo pacman -S chromium\n\
         - Ubuntu/Debian: sudo apt install chromium-browser\n\
         - Fedora: sudo dnf install chromium\n\
         - Or download from: https://www.google.com/chrome/"
            .to_string(),
    ))
}

/// Starts one isolated browser session per run.
#[derive(Debug, Clone)]
pub struct BrowserLauncher {
    settings: BrowserSettings,
    page_load_timeout: Duration,
}

impl BrowserLauncher {
    pub fn new(settings: BrowserSettings, page_load_timeout: Duration) -> Self {
        Self {
            settings,
            page_load_timeout,
        }
    }
}

#[cfg(feature = "browser")]
impl BrowserLauncher {
    /// Launch (or connect to) a browser and open a fresh tab.
    pub async fn launch(&self) -> ScrapeResult<ChromiumPage> {
        if let Some(ref remote_url) = self.settings.remote_url {
            return self.connect_remote(remote_url).await;
        }

        info!("Launching browser (headless={})", self.settings.headless);
        let chrome_path = find_chrome()?;
        info!("Using Chrome at {:?}", chrome_path);

        let (width, height) = self.settings.window;
        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(width, height)
            .request_timeout(self.page_load_timeout);

        // with_head means NOT headless
        if !self.settings.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = self.settings.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-notifications")
            .arg("--disable-popup-blocking")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--disable-gpu");

        for arg in &self.settings.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| ScrapeError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::Browser(format!("Failed to launch browser: {}", e)))?;

        ChromiumPage::open(browser, spawn_handler(handler), &self.settings, false).await
    }

    /// Connect to a remote Chrome instance.
    async fn connect_remote(&self, url: &str) -> ScrapeResult<ChromiumPage> {
        info!("Connecting to remote browser at {}", url);

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .timeout(self.page_load_timeout)
            .send()
            .await
            .map_err(|e| ScrapeError::Browser(format!("Failed to reach remote browser: {}", e)))?
            .json()
            .await
            .map_err(|e| ScrapeError::Browser(format!("Failed to parse browser version info: {}", e)))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ScrapeError::Browser("No webSocketDebuggerUrl in response".to_string()))?;

        info!("Connecting to WebSocket: {}", ws_url);

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: self.page_load_timeout,
            ..Default::default()
        };

        let (browser, handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(|e| ScrapeError::Browser(format!("Failed to connect to remote browser: {}", e)))?;

        ChromiumPage::open(browser, spawn_handler(handler), &self.settings, true).await
    }
}

#[cfg(not(feature = "browser"))]
impl BrowserLauncher {
    pub async fn launch(&self) -> ScrapeResult<FixturePage> {
        Err(ScrapeError::Browser(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
                .to_string(),
        ))
    }
}

/// Drive the CDP event loop until the connection drops.
#[cfg(feature = "browser")]
fn spawn_handler(mut handler: chromiumoxide::Handler) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    })
}
