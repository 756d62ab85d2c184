use crate::core::Config;
use crate::errors::Result;
use crate::selectors::Locator;
use crate::types::{DeviceProfile, ElementSnapshot};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// The boundary into the browser engine.
///
/// Everything above this trait talks in locators and snapshots; how a
/// locator is resolved, how a click is delivered, and when the network is
/// considered idle are left to the implementation.
#[async_trait]
pub trait BrowserTrait: Send + Sync {
    type TabHandle: Send + Sync;

    /// Launch a new browser instance
    async fn launch(&mut self, config: &Config) -> Result<()>;

    /// Create a new tab/page
    async fn new_tab(&self) -> Result<Self::TabHandle>;

    /// Navigate to a URL and wait for the document to commit
    async fn navigate(&self, tab: &Self::TabHandle, url: &str) -> Result<()>;

    /// Wait until no network activity has been seen for `idle`
    async fn wait_for_load_state(
        &self,
        tab: &Self::TabHandle,
        idle: Duration,
        timeout: Duration,
    ) -> Result<()>;

    /// Snapshot of the first element the locator matches, `None` when nothing matches
    async fn query_element(
        &self,
        tab: &Self::TabHandle,
        locator: &Locator,
    ) -> Result<Option<ElementSnapshot>>;

    /// Number of elements the locator matches
    async fn count_elements(&self, tab: &Self::TabHandle, locator: &Locator) -> Result<usize>;

    async fn click(&self, tab: &Self::TabHandle, locator: &Locator) -> Result<()>;

    /// Replace the value of an input with `text`
    async fn fill(&self, tab: &Self::TabHandle, locator: &Locator, text: &str) -> Result<()>;

    /// Execute JavaScript in the browser
    async fn execute_script(&self, tab: &Self::TabHandle, script: &str) -> Result<Value>;

    /// Take a PNG screenshot
    async fn take_screenshot(&self, tab: &Self::TabHandle, full_page: bool) -> Result<Vec<u8>>;

    /// Get current URL
    async fn get_url(&self, tab: &Self::TabHandle) -> Result<String>;

    /// Get page title
    async fn get_title(&self, tab: &Self::TabHandle) -> Result<String>;

    /// Full HTML of the current document
    async fn page_source(&self, tab: &Self::TabHandle) -> Result<String>;

    /// Apply viewport and user agent of a device profile
    async fn emulate_device(&self, tab: &Self::TabHandle, profile: &DeviceProfile) -> Result<()>;

    /// Check if browser is still running
    fn is_running(&self) -> bool;

    /// Close the browser
    async fn close(&mut self) -> Result<()>;
}
