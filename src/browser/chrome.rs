use crate::core::{BrowserTrait, Config};
use crate::errors::{PageError, Result};
use crate::selectors::{Locator, LocatorKind};
use crate::types::{DeviceProfile, ElementSnapshot};
use async_trait::async_trait;
use headless_chrome::protocol::cdp::{Emulation, Page};
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Chrome browser implementation
pub struct ChromeBrowser {
    browser: Option<Browser>,
    accept_language: Option<String>,
}

/// Reply shape shared by the element scripts below. Scripts return it
/// JSON-encoded so objects survive `Runtime.evaluate` without a remote handle.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScriptReply {
    error: Option<String>,
    found: bool,
    count: usize,
    element: Option<ElementSnapshot>,
}

#[derive(Debug, Deserialize)]
struct LoadProbe {
    ready: bool,
    resources: usize,
}

#[derive(Debug, Deserialize)]
struct DocumentSize {
    width: f64,
    height: f64,
}

impl ChromeBrowser {
    pub fn new() -> Self {
        Self {
            browser: None,
            accept_language: None,
        }
    }

    /// JavaScript expression evaluating to the array of nodes a locator matches.
    fn resolve_nodes(locator: &Locator) -> Result<String> {
        let quoted = serde_json::to_string(locator.expression())?;
        Ok(match locator.kind() {
            LocatorKind::Css => format!("Array.from(document.querySelectorAll({}))", quoted),
            LocatorKind::XPath => format!(
                r#"(function() {{
                    const snapshot = document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
                    const nodes = [];
                    for (let i = 0; i < snapshot.snapshotLength; i++) {{
                        nodes.push(snapshot.snapshotItem(i));
                    }}
                    return nodes;
                }})()"#,
                quoted
            ),
        })
    }

    fn element_script(locator: &Locator, body: &str) -> Result<String> {
        Ok(format!(
            r#"
            (function() {{
                let nodes;
                try {{
                    nodes = {};
                }} catch (e) {{
                    return JSON.stringify({{ error: e.message }});
                }}
                if (nodes.length === 0) {{
                    return JSON.stringify({{ found: false, count: 0 }});
                }}
                const element = nodes[0];
                {}
            }})()
            "#,
            Self::resolve_nodes(locator)?,
            body
        ))
    }

    fn tab_element<'a>(tab: &'a Arc<Tab>, locator: &Locator) -> Result<Element<'a>> {
        let found = match locator.kind() {
            LocatorKind::Css => tab.find_element(locator.expression()),
            LocatorKind::XPath => tab.find_element_by_xpath(locator.expression()),
        };
        found.map_err(|e| PageError::ElementNotFound(format!("{}: {}", locator, e)))
    }

    async fn evaluate_json<T: DeserializeOwned>(&self, tab: &Arc<Tab>, script: &str) -> Result<T> {
        let value = self.execute_script(tab, script).await?;
        let raw = value.as_str().ok_or_else(|| {
            PageError::JavaScriptFailed(format!("expected a JSON string, got {}", value))
        })?;
        Ok(serde_json::from_str(raw)?)
    }

    async fn run_element_script(
        &self,
        tab: &Arc<Tab>,
        locator: &Locator,
        body: &str,
    ) -> Result<ScriptReply> {
        let script = Self::element_script(locator, body)?;
        let reply: ScriptReply = self.evaluate_json(tab, &script).await?;
        if let Some(error) = reply.error {
            return Err(PageError::JavaScriptFailed(format!("{}: {}", locator, error)));
        }
        Ok(reply)
    }
}

impl Default for ChromeBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserTrait for ChromeBrowser {
    type TabHandle = Arc<Tab>;

    async fn launch(&mut self, config: &Config) -> Result<()> {
        let window_size_arg = format!(
            "--window-size={},{}",
            config.browser.viewport.width, config.browser.viewport.height
        );

        let user_agent_arg = config
            .browser
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let lang_arg = config
            .browser
            .accept_language
            .as_ref()
            .and_then(|langs| langs.split(',').next())
            .map(|lang| format!("--lang={}", lang.trim()));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&window_size_arg),
        ];

        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }

        if let Some(ref lang_arg) = lang_arg {
            args.push(OsStr::new(lang_arg));
        }

        if config.browser.disable_images {
            args.push(OsStr::new("--blink-settings=imagesEnabled=false"));
        }

        for arg in &config.browser.args {
            args.push(OsStr::new(arg));
        }

        // The engine kills an idle browser after 30s by default, shorter than one scenario.
        let idle_timeout = Duration::from_millis(config.session.default_timeout_ms * 10);

        let launch_options = LaunchOptions::default_builder()
            .headless(config.browser.headless)
            .idle_browser_timeout(idle_timeout)
            .args(args)
            .build()
            .map_err(|e| PageError::LaunchFailed(e.to_string()))?;

        let browser =
            Browser::new(launch_options).map_err(|e| PageError::LaunchFailed(e.to_string()))?;

        self.browser = Some(browser);
        self.accept_language = config.browser.accept_language.clone();
        Ok(())
    }

    async fn new_tab(&self) -> Result<Self::TabHandle> {
        let browser = self
            .browser
            .as_ref()
            .ok_or(PageError::BrowserNotLaunched)?;

        browser
            .new_tab()
            .map_err(|e| PageError::TabCreationFailed(e.to_string()))
    }

    async fn navigate(&self, tab: &Self::TabHandle, url: &str) -> Result<()> {
        tab.navigate_to(url)
            .map_err(|e| PageError::NavigationFailed(e.to_string()))?;

        tab.wait_until_navigated()
            .map_err(|e| PageError::NavigationFailed(e.to_string()))?;

        Ok(())
    }

    async fn wait_for_load_state(
        &self,
        tab: &Self::TabHandle,
        idle: Duration,
        timeout: Duration,
    ) -> Result<()> {
        let probe = r#"
            (function() {
                return JSON.stringify({
                    ready: document.readyState === 'complete',
                    resources: performance.getEntriesByType('resource').length
                });
            })()
        "#;

        let start_time = Instant::now();
        let mut last_count = usize::MAX;
        let mut quiet_since = Instant::now();

        while start_time.elapsed() < timeout {
            let state: LoadProbe = self.evaluate_json(tab, probe).await?;

            if state.resources != last_count {
                last_count = state.resources;
                quiet_since = Instant::now();
            } else if state.ready && quiet_since.elapsed() >= idle {
                debug!(
                    "Network idle after {}ms ({} resources)",
                    start_time.elapsed().as_millis(),
                    state.resources
                );
                return Ok(());
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        Err(PageError::timeout(
            "network idle",
            timeout.as_millis() as u64,
        ))
    }

    async fn query_element(
        &self,
        tab: &Self::TabHandle,
        locator: &Locator,
    ) -> Result<Option<ElementSnapshot>> {
        let body = r#"
                const rect = element.getBoundingClientRect();
                const style = window.getComputedStyle(element);
                return JSON.stringify({
                    found: true,
                    count: nodes.length,
                    element: {
                        tag_name: element.tagName.toLowerCase(),
                        visible: rect.width > 0 &&
                                 rect.height > 0 &&
                                 style.visibility !== 'hidden' &&
                                 style.display !== 'none' &&
                                 parseFloat(style.opacity) > 0,
                        enabled: !element.disabled,
                        text_content: element.textContent,
                        value: ('value' in element) ? String(element.value) : null,
                        checked: (element.type === 'checkbox' || element.type === 'radio')
                            ? element.checked : null
                    }
                });
        "#;

        let reply = self.run_element_script(tab, locator, body).await?;
        Ok(if reply.found { reply.element } else { None })
    }

    async fn count_elements(&self, tab: &Self::TabHandle, locator: &Locator) -> Result<usize> {
        let body = "return JSON.stringify({ found: true, count: nodes.length });";
        let reply = self.run_element_script(tab, locator, body).await?;
        Ok(reply.count)
    }

    async fn click(&self, tab: &Self::TabHandle, locator: &Locator) -> Result<()> {
        let element = Self::tab_element(tab, locator)?;
        element
            .scroll_into_view()
            .map_err(|e| PageError::JavaScriptFailed(e.to_string()))?;
        element
            .click()
            .map_err(|e| PageError::JavaScriptFailed(e.to_string()))?;
        Ok(())
    }

    async fn fill(&self, tab: &Self::TabHandle, locator: &Locator, text: &str) -> Result<()> {
        // Native setter keeps framework-managed inputs in sync with the cleared value.
        let clear_body = r#"
                const proto = Object.getPrototypeOf(element);
                const setter = Object.getOwnPropertyDescriptor(proto, 'value');
                if (setter && setter.set) {
                    setter.set.call(element, '');
                } else {
                    element.value = '';
                }
                element.dispatchEvent(new Event('input', { bubbles: true }));
                element.dispatchEvent(new Event('change', { bubbles: true }));
                return JSON.stringify({ found: true, count: nodes.length });
        "#;

        let reply = self.run_element_script(tab, locator, clear_body).await?;
        if !reply.found {
            return Err(PageError::ElementNotFound(locator.to_string()));
        }

        if text.is_empty() {
            return Ok(());
        }

        let element = Self::tab_element(tab, locator)?;
        element
            .click()
            .map_err(|e| PageError::JavaScriptFailed(e.to_string()))?;
        element
            .type_into(text)
            .map_err(|e| PageError::JavaScriptFailed(e.to_string()))?;
        Ok(())
    }

    async fn execute_script(&self, tab: &Self::TabHandle, script: &str) -> Result<Value> {
        let result = tab
            .evaluate(script, false)
            .map_err(|e| PageError::JavaScriptFailed(e.to_string()))?;

        Ok(result.value.unwrap_or(Value::Null))
    }

    async fn take_screenshot(&self, tab: &Self::TabHandle, full_page: bool) -> Result<Vec<u8>> {
        let clip = if full_page {
            let size: DocumentSize = self
                .evaluate_json(
                    tab,
                    r#"JSON.stringify({
                        width: document.documentElement.scrollWidth,
                        height: document.documentElement.scrollHeight
                    })"#,
                )
                .await?;
            Some(Page::Viewport {
                x: 0.0,
                y: 0.0,
                width: size.width,
                height: size.height,
                scale: 1.0,
            })
        } else {
            None
        };

        tab.capture_screenshot(
            Page::CaptureScreenshotFormatOption::Png,
            None,
            clip,
            true,
        )
        .map_err(|e| PageError::ScreenshotFailed(e.to_string()))
    }

    async fn get_url(&self, tab: &Self::TabHandle) -> Result<String> {
        Ok(tab.get_url())
    }

    async fn get_title(&self, tab: &Self::TabHandle) -> Result<String> {
        let result = self.execute_script(tab, "document.title").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }

    async fn page_source(&self, tab: &Self::TabHandle) -> Result<String> {
        let result = self
            .execute_script(tab, "document.documentElement.outerHTML")
            .await?;
        result
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| PageError::JavaScriptFailed("Failed to get page source".to_string()))
    }

    async fn emulate_device(&self, tab: &Self::TabHandle, profile: &DeviceProfile) -> Result<()> {
        if let Some(ua) = &profile.user_agent {
            tab.set_user_agent(ua, self.accept_language.as_deref(), None)
                .map_err(|e| PageError::EmulationFailed(e.to_string()))?;
        }

        // Metrics overrides are bound to the tab, so they outlive navigation.
        tab.call_method(device_metrics(profile))
            .map_err(|e| PageError::EmulationFailed(e.to_string()))?;
        tab.call_method(Emulation::SetTouchEmulationEnabled {
            enabled: profile.has_touch,
            max_touch_points: profile.has_touch.then_some(5),
        })
        .map_err(|e| PageError::EmulationFailed(e.to_string()))?;

        debug!(
            "Emulating {}x{} (mobile: {})",
            profile.viewport.width, profile.viewport.height, profile.is_mobile
        );
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.browser.is_some()
    }

    async fn close(&mut self) -> Result<()> {
        self.browser = None;
        Ok(())
    }
}

fn device_metrics(profile: &DeviceProfile) -> Emulation::SetDeviceMetricsOverride {
    Emulation::SetDeviceMetricsOverride {
        width: profile.viewport.width,
        height: profile.viewport.height,
        device_scale_factor: if profile.is_mobile { 2.0 } else { 1.0 },
        mobile: profile.is_mobile,
        scale: None,
        screen_width: Some(profile.viewport.width),
        screen_height: Some(profile.viewport.height),
        position_x: None,
        position_y: None,
        dont_set_visible_size: None,
        screen_orientation: None,
        viewport: None,
        display_feature: None,
        device_posture: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_locators_are_quoted_as_json() {
        let locator = Locator::new("inputEmail", r#"input[type="email"]"#);
        let js = ChromeBrowser::resolve_nodes(&locator).unwrap();
        assert_eq!(
            js,
            r#"Array.from(document.querySelectorAll("input[type=\"email\"]"))"#
        );
    }

    #[test]
    fn xpath_locators_use_document_evaluate() {
        let locator = Locator::new("buttonElementos", r#"//h5[normalize-space(text())="Elements"]"#);
        let js = ChromeBrowser::resolve_nodes(&locator).unwrap();
        assert!(js.contains("document.evaluate("));
        assert!(js.contains(r#""//h5[normalize-space(text())=\"Elements\"]""#));
    }

    #[test]
    fn script_reply_defaults_missing_fields() {
        let reply: ScriptReply = serde_json::from_str(r#"{ "found": false, "count": 0 }"#).unwrap();
        assert!(!reply.found);
        assert!(reply.element.is_none());
        assert!(reply.error.is_none());
    }

    #[test]
    fn mobile_profile_overrides_device_metrics() {
        let metrics = device_metrics(&DeviceProfile::mobile());
        assert_eq!((metrics.width, metrics.height), (375, 667));
        assert!(metrics.mobile);
        assert_eq!(metrics.screen_width, Some(375));

        let desktop = device_metrics(&DeviceProfile::desktop());
        assert!(!desktop.mobile);
        assert_eq!(desktop.device_scale_factor, 1.0);
    }
}
