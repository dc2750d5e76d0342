//! Screenshot and markup capture for anomalous pages.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::browser::ScrapePage;
use crate::error::ConfigError;

/// Files written by one capture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugArtifacts {
    pub screenshot: Option<PathBuf>,
    pub html: Option<PathBuf>,
}

impl DebugArtifacts {
    pub fn is_empty(&self) -> bool {
        self.screenshot.is_none() && self.html.is_none()
    }
}

/// Writes `<prefix>_<tag>.png` and `<prefix>_<tag>.html` into a directory.
#[derive(Debug, Clone)]
pub struct DebugCapture {
    dir: PathBuf,
    prefix: String,
}

impl DebugCapture {
    /// Create the capture, making `dir` if it does not exist yet.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self, ConfigError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| ConfigError::DebugDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, tag: &str, extension: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.{}", self.prefix, tag, extension))
    }

    /// Save a full-page screenshot and the serialized document.
    ///
    /// Each half is attempted independently; failures are logged and the
    /// corresponding path is left empty.
    pub async fn capture<P: ScrapePage>(&self, page: &P, tag: &str) -> DebugArtifacts {
        let mut artifacts = DebugArtifacts::default();

        match page.screenshot().await {
            Ok(png) => {
                let path = self.path_for(tag, "png");
                match tokio::fs::write(&path, png).await {
                    Ok(()) => artifacts.screenshot = Some(path),
                    Err(e) => warn!("Could not write screenshot {:?}: {}", path, e),
                }
            }
            Err(e) => warn!("Could not take screenshot for {}: {}", tag, e),
        }

        match page.content().await {
            Ok(html) => {
                let path = self.path_for(tag, "html");
                match tokio::fs::write(&path, html).await {
                    Ok(()) => artifacts.html = Some(path),
                    Err(e) => warn!("Could not write page source {:?}: {}", path, e),
                }
            }
            Err(e) => warn!("Could not read page source for {}: {}", tag, e),
        }

        if !artifacts.is_empty() {
            info!("Debug info saved: {}_{}", self.prefix, tag);
        }
        artifacts
    }
}

/// Tag for a page that produced no cards.
pub fn empty_page_tag(page_number: u32) -> String {
    format!("page_{}", page_number)
}

/// Tag for a page whose initial content never appeared.
pub fn timeout_tag(page_number: u32) -> String {
    format!("timeout_page_{}", page_number)
}

/// Tag for the snapshot taken when a run aborts.
pub const FATAL_TAG: &str = "fatal";

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::scrapers::browser::FixturePage;

    #[tokio::test]
    async fn writes_screenshot_and_markup() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("debug_pic");
        let capture = DebugCapture::new(&dir, "tokopedia_debug").unwrap();
        assert!(dir.is_dir());

        let page = FixturePage::builder()
            .page("https://shop.test/", "<p>nothing here</p>")
            .build();
        page.navigate("https://shop.test/", Duration::from_secs(1))
            .await
            .unwrap();

        let artifacts = capture.capture(&page, &empty_page_tag(1)).await;
        let png = artifacts.screenshot.unwrap();
        let html = artifacts.html.unwrap();
        assert_eq!(png, dir.join("tokopedia_debug_page_1.png"));
        assert_eq!(html, dir.join("tokopedia_debug_page_1.html"));
        assert!(std::fs::read_to_string(html).unwrap().contains("nothing here"));
        assert_eq!(&std::fs::read(png).unwrap()[1..4], b"PNG");
    }

    #[test]
    fn tags() {
        assert_eq!(empty_page_tag(3), "page_3");
        assert_eq!(timeout_tag(2), "timeout_page_2");
    }

    #[test]
    fn unusable_directory_is_a_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("taken");
        std::fs::write(&file, "x").unwrap();
        let err = DebugCapture::new(&file, "p").unwrap_err();
        assert!(matches!(err, ConfigError::DebugDir { .. }));
    }
}
