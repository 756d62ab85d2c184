use crate::browser::{BrowserSession, UrlPattern};
use crate::core::config::Config;
use crate::core::BrowserTrait;
use crate::errors::Result;
use crate::pages::base::{BasePage, Element, Page};
use crate::selectors::{Locator, SelectorStore};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const SELECTOR_FILE: &str = "login.json";

/// Generic error containers probed when the page has no dedicated modal.
pub const ERROR_CANDIDATES: &[&str] = &[
    ".error",
    ".alert-danger",
    ".text-danger",
    "[data-testid=\"error\"]",
    ".form-error",
];

/// Login form of the staging app.
pub struct LoginPage<B: BrowserTrait> {
    base: BasePage<B>,
    selectors: SelectorStore,
    url: String,
    input_email: Locator,
    input_password: Locator,
    button_sign_in: Locator,
    link_forgot_password: Locator,
    modal_error: Option<Locator>,
    error_candidates: Vec<Locator>,
    navigation_timeout: Duration,
    error_probe_timeout: Duration,
}

impl<B: BrowserTrait> LoginPage<B> {
    pub fn new(session: Arc<BrowserSession<B>>) -> Result<Self> {
        let config = session.config().clone();
        let selectors = SelectorStore::load(
            "login",
            config.pages.selectors_dir.join(SELECTOR_FILE),
        )?;
        Self::with_selectors(session, selectors, &config)
    }

    pub fn with_selectors(
        session: Arc<BrowserSession<B>>,
        selectors: SelectorStore,
        config: &Config,
    ) -> Result<Self> {
        let modal_error = selectors.get_optional("modalError");
        let mut error_candidates: Vec<Locator> = modal_error.iter().cloned().collect();
        error_candidates.extend(ERROR_CANDIDATES.iter().map(|s| Locator::anonymous(*s)));

        Ok(Self {
            input_email: selectors.get("inputEmail")?,
            input_password: selectors.get("inputPassword")?,
            button_sign_in: selectors.get("buttonIniciarSesion")?,
            link_forgot_password: selectors.get("linkOlvidarPassword")?,
            modal_error,
            url: config.targets.login_url()?.to_string(),
            navigation_timeout: config.session.navigation_timeout(),
            error_probe_timeout: config.session.error_probe_timeout(),
            error_candidates,
            selectors,
            base: BasePage::new(session),
        })
    }

    pub fn base(&self) -> &BasePage<B> {
        &self.base
    }

    /// Dedicated error modal, when the selector file declares one.
    pub fn modal_error(&self) -> Option<Element<'_, B>> {
        self.modal_error.as_ref().map(|l| self.base.element(l))
    }

    pub fn input_email(&self) -> Element<'_, B> {
        self.base.element(&self.input_email)
    }

    pub fn input_password(&self) -> Element<'_, B> {
        self.base.element(&self.input_password)
    }

    pub fn button_sign_in(&self) -> Element<'_, B> {
        self.base.element(&self.button_sign_in)
    }

    pub fn link_forgot_password(&self) -> Element<'_, B> {
        self.base.element(&self.link_forgot_password)
    }

    pub async fn navigate_to_login(&self) -> Result<()> {
        self.base.goto(&self.url).await?;
        self.input_email().wait_visible(self.navigation_timeout).await
    }

    pub async fn fill_email(&self, email: &str) -> Result<()> {
        self.input_email().fill(email).await
    }

    pub async fn fill_password(&self, password: &str) -> Result<()> {
        self.input_password().fill(password).await
    }

    pub async fn click_sign_in(&self) -> Result<()> {
        self.button_sign_in().click().await
    }

    pub async fn click_forgot_password(&self) -> Result<()> {
        self.link_forgot_password().click().await
    }

    pub async fn clear_email(&self) -> Result<()> {
        self.input_email().clear().await
    }

    pub async fn clear_password(&self) -> Result<()> {
        self.input_password().clear().await
    }

    pub async fn clear_form(&self) -> Result<()> {
        self.clear_email().await?;
        self.clear_password().await
    }

    pub async fn perform_login(
        &self,
        email: &str,
        password: &str,
        wait_for_navigation: bool,
    ) -> Result<()> {
        info!("Logging in as {}", email);
        self.fill_email(email).await?;
        self.fill_password(password).await?;
        self.click_sign_in().await?;

        if wait_for_navigation {
            self.base.wait_for_page_load().await?;
        }
        Ok(())
    }

    pub async fn perform_full_login(
        &self,
        email: &str,
        password: &str,
        wait_for_navigation: bool,
    ) -> Result<()> {
        self.navigate_to_login().await?;
        self.perform_login(email, password, wait_for_navigation)
            .await
    }

    pub async fn perform_login_with_validation(
        &self,
        email: &str,
        password: &str,
        expected_url: &str,
    ) -> Result<bool> {
        self.perform_login(email, password, false).await?;
        self.validate_successful_login(expected_url).await
    }

    pub async fn is_input_email_visible(&self) -> bool {
        self.input_email().is_visible().await
    }

    pub async fn is_input_password_visible(&self) -> bool {
        self.input_password().is_visible().await
    }

    pub async fn is_button_sign_in_visible(&self) -> bool {
        self.button_sign_in().is_visible().await
    }

    pub async fn is_link_forgot_password_visible(&self) -> bool {
        self.link_forgot_password().is_visible().await
    }

    pub async fn are_all_elements_visible(&self) -> bool {
        self.is_input_email_visible().await
            && self.is_input_password_visible().await
            && self.is_button_sign_in_visible().await
            && self.is_link_forgot_password_visible().await
    }

    pub async fn is_sign_in_enabled(&self) -> Result<bool> {
        self.button_sign_in().is_enabled().await
    }

    /// Both fields hold something other than whitespace.
    pub async fn is_form_complete(&self) -> Result<bool> {
        let email = self.email_value().await?;
        let password = self.password_value().await?;
        Ok(!email.trim().is_empty() && !password.trim().is_empty())
    }

    pub async fn email_value(&self) -> Result<String> {
        self.input_email().input_value().await
    }

    pub async fn password_value(&self) -> Result<String> {
        self.input_password().input_value().await
    }

    /// `Ok(false)` when the redirect did not happen within the navigation timeout.
    pub async fn validate_successful_login(&self, expected_url: &str) -> Result<bool> {
        let pattern = UrlPattern::parse(expected_url)?;
        if !self.base.wait_for_url(&pattern, self.navigation_timeout).await? {
            return Ok(false);
        }

        if !matches!(pattern, UrlPattern::Exact(_)) {
            return Ok(true);
        }

        let current = self.base.current_url().await?;
        let host_and_path = expected_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        Ok(current.contains(host_and_path))
    }

    /// Immediate check, no waiting.
    pub async fn has_error_messages(&self) -> bool {
        for candidate in &self.error_candidates {
            if self.base.is_element_visible(candidate).await {
                debug!("Error indicator visible: {}", candidate);
                return true;
            }
        }
        false
    }

    /// Text of the first error indicator that shows up within the probe timeout.
    pub async fn error_message(&self) -> Result<Option<String>> {
        self.base
            .first_visible_text(&self.error_candidates, self.error_probe_timeout)
            .await
    }
}

#[async_trait]
impl<B: BrowserTrait> Page for LoginPage<B> {
    fn name(&self) -> &'static str {
        "login"
    }

    fn url(&self) -> Option<&str> {
        Some(&self.url)
    }

    fn selectors(&self) -> &SelectorStore {
        &self.selectors
    }

    async fn open(&self) -> Result<()> {
        self.navigate_to_login().await
    }

    async fn verify_loaded(&self) -> Result<bool> {
        Ok(self.are_all_elements_visible().await)
    }
}
