use crate::errors::{PageError, Result};
use crate::types::{Device, DeviceProfile, Viewport};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserConfig,
    pub session: SessionConfig,
    pub pages: PagesConfig,
    pub targets: TargetConfig,
    pub artifacts: ArtifactConfig,
    pub devices: DeviceProfiles,
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub browser_type: BrowserType,
    pub headless: bool,
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    pub accept_language: Option<String>,
    pub disable_images: bool,
    pub args: Vec<String>,
}

/// Timeouts used by the session primitives, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub default_timeout_ms: u64,
    pub navigation_timeout_ms: u64,
    pub error_probe_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub network_idle_ms: u64,
    pub menu_settle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PagesConfig {
    pub selectors_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub base_url: String,
    pub demo_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub screenshot_dir: PathBuf,
    pub report_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProfiles {
    pub desktop: DeviceProfile,
    pub mobile: DeviceProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub ci: bool,
    pub workers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserType {
    Chromium,
}

impl BrowserType {
    pub fn name(&self) -> &'static str {
        match self {
            BrowserType::Chromium => "chromium",
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PageError::ConfigurationError(format!("{}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `BASE_URL`, `CI`, `HEADLESS`, `SCREENSHOT_DIR` and `SELECTORS_DIR`.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup("BASE_URL").filter(|v| !v.is_empty()) {
            self.targets.base_url = base_url;
        }

        if let Some(ci) = lookup("CI") {
            self.run.ci = is_truthy(&ci);
            if self.run.ci {
                self.browser.headless = true;
                self.run.workers = 2;
            }
        }

        if let Some(headless) = lookup("HEADLESS") {
            self.browser.headless = is_truthy(&headless);
        }

        if let Some(dir) = lookup("SCREENSHOT_DIR") {
            self.artifacts.screenshot_dir = PathBuf::from(dir);
        }

        if let Some(dir) = lookup("SELECTORS_DIR") {
            self.pages.selectors_dir = PathBuf::from(dir);
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.targets.base_url)?;
        Url::parse(&self.targets.demo_url)?;

        if self.session.poll_interval_ms == 0 {
            return Err(PageError::ConfigurationError(
                "session.poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.run.workers == 0 {
            return Err(PageError::ConfigurationError(
                "run.workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl SessionConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn error_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.error_probe_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn network_idle(&self) -> Duration {
        Duration::from_millis(self.network_idle_ms)
    }

    pub fn menu_settle(&self) -> Duration {
        Duration::from_millis(self.menu_settle_ms)
    }
}

impl TargetConfig {
    pub fn login_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.base_url)?.join("login")?)
    }

    pub fn demo_home_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.demo_url)?)
    }

    pub fn demo_section_url(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&self.demo_url)?.join(path)?)
    }
}

impl DeviceProfiles {
    pub fn profile(&self, device: Device) -> &DeviceProfile {
        match device {
            Device::Desktop => &self.desktop,
            Device::Mobile => &self.mobile,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            browser_type: BrowserType::Chromium,
            headless: false,
            viewport: Viewport {
                width: 1280,
                height: 720,
            },
            user_agent: None,
            accept_language: Some("en-US,en;q=0.9".to_string()),
            disable_images: false,
            args: vec![],
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30000,
            navigation_timeout_ms: 10000,
            error_probe_timeout_ms: 5000,
            poll_interval_ms: 100,
            network_idle_ms: 500,
            menu_settle_ms: 500,
        }
    }
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            selectors_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/selectors")),
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dev.paisabombas.app/".to_string(),
            demo_url: "https://demoqa.com/".to_string(),
        }
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            report_path: PathBuf::from("test-results/results.json"),
        }
    }
}

impl Default for DeviceProfiles {
    fn default() -> Self {
        Self {
            desktop: DeviceProfile::desktop(),
            mobile: DeviceProfile::mobile(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ci: false,
            workers: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_suite_timeouts() {
        let config = Config::default();
        assert_eq!(config.session.default_timeout(), Duration::from_secs(30));
        assert_eq!(config.session.navigation_timeout(), Duration::from_secs(10));
        assert_eq!(config.session.error_probe_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn login_url_is_joined_onto_base_url() {
        let targets = TargetConfig::default();
        assert_eq!(
            targets.login_url().unwrap().as_str(),
            "https://dev.paisabombas.app/login"
        );
        assert_eq!(
            targets.demo_section_url("books").unwrap().as_str(),
            "https://demoqa.com/books"
        );
    }

    #[test]
    fn ci_forces_headless_and_two_workers() {
        let config = Config::default()
            .with_overrides(lookup(&[("CI", "true")]))
            .unwrap();
        assert!(config.run.ci);
        assert!(config.browser.headless);
        assert_eq!(config.run.workers, 2);
    }

    #[test]
    fn base_url_override_is_validated() {
        let config = Config::default()
            .with_overrides(lookup(&[("BASE_URL", "http://localhost:3000/")]))
            .unwrap();
        assert_eq!(config.targets.base_url, "http://localhost:3000/");

        let err = Config::default()
            .with_overrides(lookup(&[("BASE_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, PageError::InvalidUrl(_)));
    }

    #[test]
    fn partial_config_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "session": { "navigation_timeout_ms": 2500 } }"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.session.navigation_timeout_ms, 2500);
        assert_eq!(config.session.default_timeout_ms, 30000);
        assert_eq!(config.devices.mobile.viewport.width, 375);
    }

    #[test]
    fn desktop_profile_keeps_the_browser_user_agent() {
        let config = Config::default();
        let desktop = config.devices.profile(Device::Desktop);
        assert_eq!(desktop.viewport.width, 1920);
        assert!(desktop.user_agent.is_none());
        assert!(!desktop.is_mobile);
        assert!(config.devices.profile(Device::Mobile).user_agent.is_some());
    }
}
