use crate::browser::{BrowserSession, NavigationManager, UrlPattern};
use crate::core::BrowserTrait;
use crate::errors::{PageError, Result};
use crate::selectors::{Locator, SelectorStore};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Capabilities every page object exposes, whatever page it models.
#[async_trait]
pub trait Page: Send + Sync {
    /// Short name, also used for the selector file lookup
    fn name(&self) -> &'static str;

    /// Address the page is opened at, if it has its own URL
    fn url(&self) -> Option<&str>;

    fn selectors(&self) -> &SelectorStore;

    /// Navigate to the page and wait until it is usable
    async fn open(&self) -> Result<()>;

    /// True when every element the page owns is visible
    async fn verify_loaded(&self) -> Result<bool>;
}

/// Navigation and interaction helpers shared by all page objects.
pub struct BasePage<B: BrowserTrait> {
    session: Arc<BrowserSession<B>>,
}

impl<B: BrowserTrait> Clone for BasePage<B> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl<B: BrowserTrait> BasePage<B> {
    pub fn new(session: Arc<BrowserSession<B>>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<BrowserSession<B>> {
        &self.session
    }

    pub fn default_timeout(&self) -> Duration {
        self.session.default_timeout()
    }

    pub fn element(&self, locator: &Locator) -> Element<'_, B> {
        Element {
            page: self,
            locator: locator.clone(),
        }
    }

    /// Navigate, then wait for the network to go quiet.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.session.goto(url).await?;
        self.wait_for_page_load().await
    }

    pub async fn wait_for_element(&self, locator: &Locator) -> Result<()> {
        self.wait_for_element_with_timeout(locator, self.default_timeout())
            .await
    }

    pub async fn wait_for_element_with_timeout(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<()> {
        self.session.wait_for_visible(locator, timeout).await?;
        Ok(())
    }

    pub async fn take_screenshot(&self, file_name: &str) -> Result<PathBuf> {
        self.session.save_screenshot(file_name).await
    }

    pub async fn wait_for_page_load(&self) -> Result<()> {
        self.session
            .wait_for_network_idle(self.default_timeout())
            .await
    }

    pub async fn page_title(&self) -> Result<String> {
        self.session.title().await
    }

    pub async fn current_url(&self) -> Result<String> {
        self.session.current_url().await
    }

    /// Never fails: a locator that errors, matches nothing or matches a
    /// hidden element all read as `false`.
    pub async fn is_element_visible(&self, locator: &Locator) -> bool {
        match self.session.snapshot(locator).await {
            Ok(Some(snapshot)) => snapshot.visible,
            Ok(None) => false,
            Err(err) => {
                debug!("Visibility check for {} failed: {}", locator, err);
                false
            }
        }
    }

    pub async fn click_element(&self, locator: &Locator) -> Result<()> {
        self.click_element_with_timeout(locator, self.default_timeout())
            .await
    }

    pub async fn click_element_with_timeout(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<()> {
        self.session.wait_for_visible(locator, timeout).await?;
        self.session.click(locator).await
    }

    pub async fn fill_field(&self, locator: &Locator, text: &str) -> Result<()> {
        self.fill_field_with_timeout(locator, text, self.default_timeout())
            .await
    }

    pub async fn fill_field_with_timeout(
        &self,
        locator: &Locator,
        text: &str,
        timeout: Duration,
    ) -> Result<()> {
        self.session.wait_for_visible(locator, timeout).await?;
        self.session.fill(locator, text).await
    }

    /// Leaves a checked box alone; otherwise clicks it and confirms it took.
    pub async fn check_element(&self, locator: &Locator) -> Result<()> {
        let snapshot = self
            .session
            .wait_for_visible(locator, self.default_timeout())
            .await?;
        match snapshot.checked {
            Some(true) => return Ok(()),
            Some(false) => {}
            None => {
                return Err(PageError::Assertion(format!(
                    "{} has no checked state",
                    locator
                )))
            }
        }

        self.session.click(locator).await?;
        match self.session.snapshot(locator).await? {
            Some(after) if after.checked == Some(true) => Ok(()),
            _ => Err(PageError::Assertion(format!(
                "{} did not become checked",
                locator
            ))),
        }
    }

    pub async fn element_text(&self, locator: &Locator) -> Result<Option<String>> {
        self.element_text_with_timeout(locator, self.default_timeout())
            .await
    }

    pub async fn element_text_with_timeout(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<String>> {
        let snapshot = self.session.wait_for_visible(locator, timeout).await?;
        Ok(snapshot.text_content)
    }

    /// `Ok(false)` when the URL never matched within `timeout`.
    pub async fn wait_for_url(&self, pattern: &UrlPattern, timeout: Duration) -> Result<bool> {
        let result = NavigationManager::confirm(&self.session, pattern, timeout).await?;
        if !result.reached {
            warn!(
                "Expected {} within {}ms, at {}",
                pattern, result.duration_ms, result.url
            );
        }
        Ok(result.reached)
    }

    /// Returns the trimmed text of the first visible candidate, polling
    /// until `timeout`; `None` when nothing became visible.
    pub async fn first_visible_text(
        &self,
        candidates: &[Locator],
        timeout: Duration,
    ) -> Result<Option<String>> {
        let start_time = tokio::time::Instant::now();
        let poll = self.session.config().session.poll_interval();

        loop {
            for candidate in candidates {
                if let Ok(Some(snapshot)) = self.session.snapshot(candidate).await {
                    if snapshot.visible {
                        let text = snapshot.text_content.unwrap_or_default();
                        return Ok(Some(text.trim().to_string()));
                    }
                }
            }

            if start_time.elapsed() >= timeout {
                return Ok(None);
            }
            tokio::time::sleep(poll).await;
        }
    }
}

/// A resolved locator bound to the live session.
///
/// Every call queries the current document, so an `Element` stays valid
/// across navigations.
pub struct Element<'a, B: BrowserTrait> {
    page: &'a BasePage<B>,
    locator: Locator,
}

impl<'a, B: BrowserTrait> Element<'a, B> {
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub async fn is_visible(&self) -> bool {
        self.page.is_element_visible(&self.locator).await
    }

    pub async fn is_enabled(&self) -> Result<bool> {
        let snapshot = self
            .page
            .session()
            .wait_for_visible(&self.locator, self.page.default_timeout())
            .await?;
        Ok(snapshot.enabled)
    }

    pub async fn click(&self) -> Result<()> {
        self.page.click_element(&self.locator).await
    }

    pub async fn fill(&self, text: &str) -> Result<()> {
        self.page.fill_field(&self.locator, text).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.page.fill_field(&self.locator, "").await
    }

    pub async fn text(&self) -> Result<Option<String>> {
        self.page.element_text(&self.locator).await
    }

    /// Current value of an input; empty when the element has none.
    pub async fn input_value(&self) -> Result<String> {
        let snapshot = self
            .page
            .session()
            .wait_for_visible(&self.locator, self.page.default_timeout())
            .await?;
        Ok(snapshot.value.unwrap_or_default())
    }

    pub async fn wait_visible(&self, timeout: Duration) -> Result<()> {
        self.page
            .wait_for_element_with_timeout(&self.locator, timeout)
            .await
    }
}
