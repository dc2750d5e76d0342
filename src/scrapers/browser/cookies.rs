//! Cookie injection from browser-extension exports.
//!
//! A logged-in marketplace session shows fuller listings and trips fewer
//! challenges. Users export cookies from their own browser as JSON and point
//! `browser.cookies_file` at the file.

use std::path::Path;

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
#[cfg(feature = "browser")]
use chromiumoxide::Page;
use serde::{Deserialize, Serialize};
#[cfg(feature = "browser")]
use tracing::{debug, warn};

use crate::error::{ScrapeError, ScrapeResult};

/// Cookie as stored in an export file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: Option<String>,
}

/// Parse an export file. Accepts both `name` and `key` for the cookie name
/// and silently drops entries without a name or domain.
pub fn parse_cookie_export(json: &str) -> ScrapeResult<Vec<SessionCookie>> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| ScrapeError::Browser(format!("Invalid cookies file: {}", e)))?;

    let field = |entry: &serde_json::Value, key: &str| {
        entry
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let name = entry
                .get("name")
                .or_else(|| entry.get("key"))
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let domain = field(entry, "domain");
            if name.is_empty() || domain.is_empty() {
                return None;
            }
            Some(SessionCookie {
                name,
                value: field(entry, "value"),
                domain,
                path: entry.get("path").and_then(|v| v.as_str()).map(str::to_string),
            })
        })
        .collect())
}

/// Load an export file into the page's cookie jar.
#[cfg(feature = "browser")]
pub(crate) async fn load_cookies(page: &Page, path: &Path) -> ScrapeResult<()> {
    debug!("Loading cookies from {:?}", path);

    let content = std::fs::read_to_string(path)?;
    let cookies = parse_cookie_export(&content)?;

    for cookie in &cookies {
        let mut builder = CookieParam::builder()
            .name(cookie.name.as_str())
            .value(cookie.value.as_str())
            .domain(cookie.domain.as_str());
        if let Some(ref path) = cookie.path {
            builder = builder.path(path.as_str());
        }

        match builder.build() {
            Ok(param) => {
                if let Err(e) = page.set_cookie(param).await {
                    warn!("Failed to set cookie {}: {}", cookie.name, e);
                }
            }
            Err(e) => warn!("Failed to build cookie {}: {}", cookie.name, e),
        }
    }

    debug!("Loaded {} cookies", cookies.len());
    Ok(())
}

/// Check that a cookies file exists and parses, without a browser.
pub fn validate_cookie_file(path: &Path) -> ScrapeResult<usize> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_cookie_export(&content)?.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_key_variants() {
        let json = r#"[
            {"name": "_SID_Tokopedia_", "value": "abc", "domain": ".tokopedia.com", "path": "/"},
            {"key": "DID", "value": "xyz", "domain": ".tokopedia.com"},
            {"name": "", "value": "ignored", "domain": ".tokopedia.com"},
            {"name": "nodomain", "value": "ignored"}
        ]"#;

        let cookies = parse_cookie_export(json).unwrap();
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].path.as_deref(), Some("/"));
        assert_eq!(cookies[1].name, "DID");
        assert_eq!(cookies[1].path, None);
    }

    #[test]
    fn rejects_non_array() {
        assert!(parse_cookie_export("{\"name\": \"x\"}").is_err());
    }

    #[test]
    fn validates_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, r#"[{"name":"a","value":"1","domain":"shopee.co.id"}]"#).unwrap();
        assert_eq!(validate_cookie_file(&path).unwrap(), 1);
    }
}
