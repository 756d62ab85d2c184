use crate::core::{BrowserTrait, Config};
use crate::errors::{PageError, Result};
use crate::selectors::Locator;
use crate::types::{Device, ElementSnapshot};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use super::navigation::UrlPattern;

/// One browser tab plus the timeouts every wait on it uses.
///
/// Sessions are built once per scenario and handed to page objects behind
/// an `Arc`; nothing in a session is shared with another scenario.
pub struct BrowserSession<B: BrowserTrait> {
    browser: B,
    tab: B::TabHandle,
    config: Config,
    session_id: String,
}

impl<B: BrowserTrait> BrowserSession<B> {
    pub async fn new(mut browser: B, config: Config) -> Result<Self> {
        browser.launch(&config).await?;
        let tab = browser.new_tab().await?;
        let session_id = uuid::Uuid::new_v4().to_string();

        info!(
            "Started {} session {} (headless: {})",
            config.browser.browser_type.name(),
            session_id,
            config.browser.headless
        );

        Ok(Self {
            browser,
            tab,
            config,
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn tab(&self) -> &B::TabHandle {
        &self.tab
    }

    pub fn browser_name(&self) -> &'static str {
        self.config.browser.browser_type.name()
    }

    pub fn default_timeout(&self) -> Duration {
        self.config.session.default_timeout()
    }

    pub async fn emulate(&self, device: Device) -> Result<()> {
        let profile = self.config.devices.profile(device);
        debug!(
            "Emulating {} ({}x{})",
            device, profile.viewport.width, profile.viewport.height
        );
        self.browser.emulate_device(&self.tab, profile).await
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        self.browser.navigate(&self.tab, url).await
    }

    pub async fn wait_for_network_idle(&self, timeout: Duration) -> Result<()> {
        self.browser
            .wait_for_load_state(&self.tab, self.config.session.network_idle(), timeout)
            .await
    }

    pub async fn snapshot(&self, locator: &Locator) -> Result<Option<ElementSnapshot>> {
        self.browser.query_element(&self.tab, locator).await
    }

    pub async fn count(&self, locator: &Locator) -> Result<usize> {
        self.browser.count_elements(&self.tab, locator).await
    }

    /// Polls until the locator's first match is visible.
    ///
    /// Query errors count as "not yet visible": a document being replaced
    /// mid-navigation fails the query until the new one is ready.
    pub async fn wait_for_visible(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<ElementSnapshot> {
        let start_time = Instant::now();
        let mut last_error = None;

        loop {
            match self.snapshot(locator).await {
                Ok(Some(snapshot)) if snapshot.visible => return Ok(snapshot),
                Ok(_) => {}
                Err(err) => {
                    debug!("Query for {} failed, retrying: {}", locator, err);
                    last_error = Some(err);
                }
            }

            if start_time.elapsed() >= timeout {
                let what = match last_error {
                    Some(err) => format!("{} to be visible (last error: {})", locator, err),
                    None => format!("{} to be visible", locator),
                };
                return Err(PageError::timeout(what, timeout.as_millis() as u64));
            }

            tokio::time::sleep(self.config.session.poll_interval()).await;
        }
    }

    pub async fn click(&self, locator: &Locator) -> Result<()> {
        debug!("Clicking {}", locator);
        self.browser.click(&self.tab, locator).await
    }

    pub async fn fill(&self, locator: &Locator, text: &str) -> Result<()> {
        debug!("Filling {}", locator);
        self.browser.fill(&self.tab, locator, text).await
    }

    pub async fn current_url(&self) -> Result<String> {
        self.browser.get_url(&self.tab).await
    }

    pub async fn title(&self) -> Result<String> {
        self.browser.get_title(&self.tab).await
    }

    pub async fn page_source(&self) -> Result<String> {
        self.browser.page_source(&self.tab).await
    }

    pub async fn execute_script(&self, script: &str) -> Result<serde_json::Value> {
        self.browser.execute_script(&self.tab, script).await
    }

    /// Polls the current URL until it matches; `Timeout` otherwise.
    pub async fn wait_for_url(&self, pattern: &UrlPattern, timeout: Duration) -> Result<String> {
        let start_time = Instant::now();

        loop {
            let url = self.current_url().await?;
            if pattern.matches(&url) {
                debug!("URL {} matched {}", url, pattern);
                return Ok(url);
            }

            if start_time.elapsed() >= timeout {
                return Err(PageError::timeout(
                    format!("url {} (last seen {})", pattern, url),
                    timeout.as_millis() as u64,
                ));
            }

            tokio::time::sleep(self.config.session.poll_interval()).await;
        }
    }

    pub async fn wait_for_timeout(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    pub async fn screenshot(&self, full_page: bool) -> Result<Vec<u8>> {
        self.browser.take_screenshot(&self.tab, full_page).await
    }

    /// Full-page screenshot written under the configured screenshot directory.
    pub async fn save_screenshot(&self, file_name: &str) -> Result<PathBuf> {
        let path = self.config.artifacts.screenshot_dir.join(file_name);
        self.save_screenshot_to(&path).await?;
        Ok(path)
    }

    pub async fn save_screenshot_to(&self, path: &Path) -> Result<()> {
        let bytes = self.screenshot(true).await?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        debug!("Saved screenshot {}", path.display());
        Ok(())
    }

    pub async fn close(mut self) -> Result<()> {
        info!("Closing session {}", self.session_id);
        self.browser.close().await
    }
}
