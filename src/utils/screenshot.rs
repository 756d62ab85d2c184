use crate::browser::BrowserSession;
use crate::core::BrowserTrait;
use crate::errors::{PageError, Result};
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];

/// Point in a scenario a screenshot was taken at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenshotPhase {
    Initial,
    Final,
    Error,
}

impl ScreenshotPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenshotPhase::Initial => "initial",
            ScreenshotPhase::Final => "final",
            ScreenshotPhase::Error => "error",
        }
    }
}

impl fmt::Display for ScreenshotPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ScreenshotManager;

impl ScreenshotManager {
    /// `<prefix>-<index>-<phase>-<browser>.png`
    pub fn artifact_name(prefix: &str, index: usize, phase: ScreenshotPhase, browser: &str) -> String {
        format!("{}-{}-{}-{}.png", prefix, index, phase, browser)
    }

    pub async fn capture<B: BrowserTrait>(
        session: &BrowserSession<B>,
        prefix: &str,
        index: usize,
        phase: ScreenshotPhase,
    ) -> Result<PathBuf> {
        let name = Self::artifact_name(prefix, index, phase, session.browser_name());
        let bytes = session.screenshot(true).await?;
        if !bytes.starts_with(PNG_MAGIC) {
            return Err(PageError::ScreenshotFailed(format!(
                "{}: browser returned {} bytes that are not a PNG",
                name,
                bytes.len()
            )));
        }

        let path = session.config().artifacts.screenshot_dir.join(&name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Error-path capture: a failed screenshot must not mask the scenario's
    /// own error, so it is only logged.
    pub async fn capture_quietly<B: BrowserTrait>(
        session: &BrowserSession<B>,
        prefix: &str,
        index: usize,
        phase: ScreenshotPhase,
    ) -> Option<PathBuf> {
        match Self::capture(session, prefix, index, phase).await {
            Ok(path) => Some(path),
            Err(err) => {
                warn!("Could not capture {} screenshot: {}", phase, err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::testing::{MockBrowser, MockSite};

    #[test]
    fn names_follow_the_artifact_pattern() {
        assert_eq!(
            ScreenshotManager::artifact_name("homedemoqa", 3, ScreenshotPhase::Error, "chromium"),
            "homedemoqa-3-error-chromium.png"
        );
    }

    #[tokio::test]
    async fn capture_writes_into_screenshot_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.artifacts.screenshot_dir = dir.path().to_path_buf();
        let session = BrowserSession::new(MockBrowser::new(MockSite::new("about:blank")), config)
            .await
            .unwrap();

        let path = ScreenshotManager::capture(&session, "login", 0, ScreenshotPhase::Initial)
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("login-0-initial-chromium.png"));
        assert!(std::fs::read(&path).unwrap().starts_with(PNG_MAGIC));
    }
}
