//! An in-memory [`BrowserTrait`] for exercising page objects without Chrome.
//!
//! A [`MockSite`] is a set of pages keyed by URL. Each page is a flat list of
//! [`MockElement`]s addressed by their exact locator expression, and clicks
//! can navigate, reveal elements or check submitted form values.

use crate::core::{BrowserTrait, Config};
use crate::errors::{PageError, Result};
use crate::selectors::Locator;
use crate::types::{DeviceProfile, ElementSnapshot};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// First bytes of a PNG file; enough for screenshot consumers to sniff.
pub const FAKE_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

#[derive(Debug, Clone)]
pub enum ClickEffect {
    None,
    Navigate(String),
    Reveal {
        selectors: Vec<String>,
        after: Duration,
    },
    Hide(Vec<String>),
    /// Copies the value of one input into the text of another element.
    CopyValue { from: String, to: String },
    /// Compares input values and runs one of two effects.
    Submit {
        expected: Vec<(String, String)>,
        on_match: Box<ClickEffect>,
        on_mismatch: Box<ClickEffect>,
    },
    Many(Vec<ClickEffect>),
}

#[derive(Debug, Clone)]
pub struct MockElement {
    selector: String,
    tag_name: String,
    visible: bool,
    enabled: bool,
    broken: bool,
    text: Option<String>,
    value: Option<String>,
    checked: Option<bool>,
    on_click: ClickEffect,
    visible_from: Option<Instant>,
}

impl MockElement {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            tag_name: "div".to_string(),
            visible: true,
            enabled: true,
            broken: false,
            text: None,
            value: None,
            checked: None,
            on_click: ClickEffect::None,
            visible_from: None,
        }
    }

    pub fn input(selector: impl Into<String>) -> Self {
        Self {
            tag_name: "input".to_string(),
            value: Some(String::new()),
            ..Self::new(selector)
        }
    }

    /// An unchecked checkbox; clicks toggle it.
    pub fn checkbox(selector: impl Into<String>) -> Self {
        Self {
            tag_name: "input".to_string(),
            checked: Some(false),
            ..Self::new(selector)
        }
    }

    pub fn checked(mut self) -> Self {
        self.checked = Some(true);
        self
    }

    pub fn button(selector: impl Into<String>, text: &str) -> Self {
        Self {
            tag_name: "button".to_string(),
            text: Some(text.to_string()),
            ..Self::new(selector)
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Querying this element fails as if the selector were invalid.
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    pub fn on_click(mut self, effect: ClickEffect) -> Self {
        self.on_click = effect;
        self
    }

    pub fn navigates_to(self, url: &str) -> Self {
        self.on_click(ClickEffect::Navigate(url.to_string()))
    }

    fn is_visible_now(&self) -> bool {
        self.visible && self.visible_from.map_or(true, |at| Instant::now() >= at)
    }

    fn snapshot(&self) -> ElementSnapshot {
        ElementSnapshot {
            tag_name: self.tag_name.clone(),
            visible: self.is_visible_now(),
            enabled: self.enabled,
            text_content: self.text.clone(),
            value: self.value.clone(),
            checked: self.checked,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct MockPage {
    title: String,
    html: Option<String>,
    elements: Vec<MockElement>,
}

#[derive(Debug, Clone, Default)]
pub struct MockSite {
    start_url: String,
    pages: HashMap<String, MockPage>,
}

impl MockSite {
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: start_url.to_string(),
            pages: HashMap::new(),
        }
    }

    pub fn page(mut self, url: &str, elements: Vec<MockElement>) -> Self {
        self.pages.entry(url.to_string()).or_default().elements = elements;
        self
    }

    pub fn title(mut self, url: &str, title: &str) -> Self {
        self.pages.entry(url.to_string()).or_default().title = title.to_string();
        self
    }

    pub fn html(mut self, url: &str, html: &str) -> Self {
        self.pages.entry(url.to_string()).or_default().html = Some(html.to_string());
        self
    }
}

#[derive(Debug, Default)]
pub struct MockTab {
    pub url: String,
    pub title: String,
    pub html: Option<String>,
    pub clicks: Vec<String>,
    pub scripts: Vec<String>,
    pub screenshots: usize,
    pub device: Option<DeviceProfile>,
    elements: Vec<MockElement>,
}

impl MockTab {
    fn find(&self, locator: &Locator) -> Result<Option<&MockElement>> {
        match self
            .elements
            .iter()
            .find(|e| e.selector == locator.expression())
        {
            Some(element) if element.broken => Err(PageError::JavaScriptFailed(format!(
                "{}: is not a valid selector",
                locator
            ))),
            found => Ok(found),
        }
    }

    fn find_mut(&mut self, selector: &str) -> Option<&mut MockElement> {
        self.elements.iter_mut().find(|e| e.selector == selector)
    }

    fn value_of(&self, selector: &str) -> String {
        self.elements
            .iter()
            .find(|e| e.selector == selector)
            .and_then(|e| e.value.clone())
            .unwrap_or_default()
    }

    fn load(&mut self, url: &str, page: &MockPage) {
        self.url = url.to_string();
        self.title = page.title.clone();
        self.html = page.html.clone();
        self.elements = page.elements.clone();
    }
}

pub type MockTabHandle = Arc<RwLock<MockTab>>;

/// Every tab a browser opened, kept alive after the browser is dropped.
pub type TabLog = Arc<Mutex<Vec<MockTabHandle>>>;

pub struct MockBrowser {
    site: Arc<MockSite>,
    launched: bool,
    launch_config: Option<Config>,
    tab_log: Option<TabLog>,
}

impl MockBrowser {
    pub fn new(site: MockSite) -> Self {
        Self {
            site: Arc::new(site),
            launched: false,
            launch_config: None,
            tab_log: None,
        }
    }

    pub fn with_tab_log(mut self, log: TabLog) -> Self {
        self.tab_log = Some(log);
        self
    }

    pub fn launch_config(&self) -> Option<&Config> {
        self.launch_config.as_ref()
    }

    fn load_page(&self, tab: &mut MockTab, url: &str) -> Result<()> {
        let page = self
            .site
            .pages
            .get(url)
            .ok_or_else(|| PageError::NavigationFailed(format!("net::ERR_NAME_NOT_RESOLVED at {}", url)))?;
        tab.load(url, page);
        Ok(())
    }

    fn apply(&self, tab: &mut MockTab, effect: &ClickEffect) -> Result<()> {
        match effect {
            ClickEffect::None => {}
            ClickEffect::Navigate(url) => self.load_page(tab, url)?,
            ClickEffect::Reveal { selectors, after } => {
                let at = Instant::now() + *after;
                for selector in selectors {
                    if let Some(element) = tab.find_mut(selector) {
                        element.visible = true;
                        element.visible_from = Some(at);
                    }
                }
            }
            ClickEffect::Hide(selectors) => {
                for selector in selectors {
                    if let Some(element) = tab.find_mut(selector) {
                        element.visible = false;
                    }
                }
            }
            ClickEffect::CopyValue { from, to } => {
                let value = tab.value_of(from);
                if let Some(element) = tab.find_mut(to) {
                    element.text = Some(value);
                }
            }
            ClickEffect::Submit {
                expected,
                on_match,
                on_mismatch,
            } => {
                let matched = expected
                    .iter()
                    .all(|(selector, value)| tab.value_of(selector) == *value);
                let next = if matched { on_match } else { on_mismatch };
                self.apply(tab, next)?;
            }
            ClickEffect::Many(effects) => {
                for effect in effects {
                    self.apply(tab, effect)?;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserTrait for MockBrowser {
    type TabHandle = MockTabHandle;

    async fn launch(&mut self, config: &Config) -> Result<()> {
        self.launched = true;
        self.launch_config = Some(config.clone());
        Ok(())
    }

    async fn new_tab(&self) -> Result<Self::TabHandle> {
        if !self.launched {
            return Err(PageError::BrowserNotLaunched);
        }
        let mut tab = MockTab {
            url: "about:blank".to_string(),
            ..MockTab::default()
        };
        if let Some(page) = self.site.pages.get(&self.site.start_url) {
            tab.load(&self.site.start_url, page);
        }
        let handle = Arc::new(RwLock::new(tab));
        if let Some(log) = &self.tab_log {
            log.lock()
                .map_err(|_| PageError::TabCreationFailed("tab log poisoned".to_string()))?
                .push(Arc::clone(&handle));
        }
        Ok(handle)
    }

    async fn navigate(&self, tab: &Self::TabHandle, url: &str) -> Result<()> {
        let mut tab = tab.write().await;
        self.load_page(&mut tab, url)
    }

    async fn wait_for_load_state(
        &self,
        _tab: &Self::TabHandle,
        _idle: Duration,
        _timeout: Duration,
    ) -> Result<()> {
        Ok(())
    }

    async fn query_element(
        &self,
        tab: &Self::TabHandle,
        locator: &Locator,
    ) -> Result<Option<ElementSnapshot>> {
        let tab = tab.read().await;
        Ok(tab.find(locator)?.map(MockElement::snapshot))
    }

    async fn count_elements(&self, tab: &Self::TabHandle, locator: &Locator) -> Result<usize> {
        let tab = tab.read().await;
        tab.find(locator)?;
        Ok(tab
            .elements
            .iter()
            .filter(|e| e.selector == locator.expression())
            .count())
    }

    async fn click(&self, tab: &Self::TabHandle, locator: &Locator) -> Result<()> {
        let mut tab = tab.write().await;
        let effect = match tab.find(locator)? {
            Some(element) if element.is_visible_now() && element.enabled => {
                element.on_click.clone()
            }
            Some(_) => {
                return Err(PageError::JavaScriptFailed(format!(
                    "{} is not clickable",
                    locator
                )))
            }
            None => return Err(PageError::ElementNotFound(locator.to_string())),
        };
        tab.clicks.push(locator.expression().to_string());
        if let Some(element) = tab.find_mut(locator.expression()) {
            element.checked = element.checked.map(|checked| !checked);
        }
        self.apply(&mut tab, &effect)
    }

    async fn fill(&self, tab: &Self::TabHandle, locator: &Locator, text: &str) -> Result<()> {
        let mut tab = tab.write().await;
        tab.find(locator)?;
        let element = tab
            .find_mut(locator.expression())
            .ok_or_else(|| PageError::ElementNotFound(locator.to_string()))?;
        if element.value.is_none() {
            return Err(PageError::JavaScriptFailed(format!(
                "{} is not an <input>",
                locator
            )));
        }
        element.value = Some(text.to_string());
        Ok(())
    }

    async fn execute_script(&self, tab: &Self::TabHandle, script: &str) -> Result<Value> {
        tab.write().await.scripts.push(script.to_string());
        Ok(Value::Null)
    }

    async fn take_screenshot(&self, tab: &Self::TabHandle, _full_page: bool) -> Result<Vec<u8>> {
        tab.write().await.screenshots += 1;
        Ok(FAKE_PNG.to_vec())
    }

    async fn get_url(&self, tab: &Self::TabHandle) -> Result<String> {
        Ok(tab.read().await.url.clone())
    }

    async fn get_title(&self, tab: &Self::TabHandle) -> Result<String> {
        Ok(tab.read().await.title.clone())
    }

    async fn page_source(&self, tab: &Self::TabHandle) -> Result<String> {
        let tab = tab.read().await;
        Ok(tab
            .html
            .clone()
            .unwrap_or_else(|| format!("<html><head><title>{}</title></head><body></body></html>", tab.title)))
    }

    async fn emulate_device(&self, tab: &Self::TabHandle, profile: &DeviceProfile) -> Result<()> {
        tab.write().await.device = Some(profile.clone());
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.launched
    }

    async fn close(&mut self) -> Result<()> {
        self.launched = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_site() -> MockSite {
        MockSite::new("https://app.test/login").page(
            "https://app.test/login",
            vec![
                MockElement::input("#email"),
                MockElement::button("#submit", "Enter").on_click(ClickEffect::Submit {
                    expected: vec![("#email".to_string(), "a@b.c".to_string())],
                    on_match: Box::new(ClickEffect::Navigate("https://app.test/home".to_string())),
                    on_mismatch: Box::new(ClickEffect::Reveal {
                        selectors: vec![".error".to_string()],
                        after: Duration::ZERO,
                    }),
                }),
                MockElement::new(".error").text("Bad credentials").hidden(),
            ],
        )
        .page("https://app.test/home", vec![])
    }

    #[tokio::test]
    async fn submit_branches_on_input_values() {
        let mut browser = MockBrowser::new(login_site());
        browser.launch(&Config::default()).await.unwrap();
        let tab = browser.new_tab().await.unwrap();

        let email = Locator::anonymous("#email");
        let submit = Locator::anonymous("#submit");
        let error = Locator::anonymous(".error");

        browser.fill(&tab, &email, "nope").await.unwrap();
        browser.click(&tab, &submit).await.unwrap();
        let snapshot = browser.query_element(&tab, &error).await.unwrap().unwrap();
        assert!(snapshot.visible);

        browser.fill(&tab, &email, "a@b.c").await.unwrap();
        browser.click(&tab, &submit).await.unwrap();
        assert_eq!(browser.get_url(&tab).await.unwrap(), "https://app.test/home");
        assert!(browser.query_element(&tab, &error).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn new_tab_requires_launch() {
        let browser = MockBrowser::new(login_site());
        assert!(matches!(
            browser.new_tab().await,
            Err(PageError::BrowserNotLaunched)
        ));
    }
}
