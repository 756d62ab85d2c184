use crate::core::BrowserTrait;
use crate::errors::{PageError, Result};
use crate::pages::LoginPage;
use crate::utils::{ScreenshotManager, ScreenshotPhase};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Staging account the success scenario signs in with.
    pub fn staging_valid() -> Self {
        Self::new("apollostudiogt@gmail.com", "wQt2x7@zI10*")
    }

    pub fn staging_invalid() -> Self {
        Self::new("incorrect@email.com", "wrongpassword")
    }
}

/// Where a successful staging login lands.
pub const DASHBOARD_URL: &str = "https://dev.paisabombas.app/dashboard";

pub struct LoginScenarios<'a, B: BrowserTrait> {
    page: &'a LoginPage<B>,
    error_settle: Duration,
}

impl<'a, B: BrowserTrait> LoginScenarios<'a, B> {
    pub fn new(page: &'a LoginPage<B>) -> Self {
        Self {
            page,
            error_settle: Duration::from_secs(2),
        }
    }

    /// How long to give the error modal after a rejected submit.
    pub fn with_error_settle(mut self, settle: Duration) -> Self {
        self.error_settle = settle;
        self
    }

    /// Valid credentials leave the login page with no error shown.
    pub async fn login_succeeds(&self, credentials: &Credentials, expected_url: &str) -> Result<()> {
        let result = self.check_login_succeeds(credentials, expected_url).await;
        self.capture_on_error("login-success", result).await
    }

    /// Invalid credentials keep the user on the login page and show an error.
    pub async fn login_fails(&self, credentials: &Credentials) -> Result<String> {
        let result = self.check_login_fails(credentials).await;
        self.capture_on_error("login-failure", result).await
    }

    async fn capture_on_error<T>(&self, prefix: &str, result: Result<T>) -> Result<T> {
        if result.is_err() {
            ScreenshotManager::capture_quietly(
                self.page.base().session(),
                prefix,
                1,
                ScreenshotPhase::Error,
            )
            .await;
        }
        result
    }

    async fn check_login_succeeds(&self, credentials: &Credentials, expected_url: &str) -> Result<()> {
        info!("Login success scenario for {}", credentials.email);
        self.page.navigate_to_login().await?;

        if !self
            .page
            .perform_login_with_validation(&credentials.email, &credentials.password, expected_url)
            .await?
        {
            return Err(PageError::Assertion(format!(
                "login did not redirect to {}",
                expected_url
            )));
        }

        if self.page.has_error_messages().await {
            return Err(PageError::Assertion(
                "an error indicator is visible after a valid login".to_string(),
            ));
        }

        let url = self.page.base().current_url().await?;
        if url.contains("/login") {
            return Err(PageError::Assertion(format!("still on the login page: {}", url)));
        }
        Ok(())
    }

    async fn check_login_fails(&self, credentials: &Credentials) -> Result<String> {
        info!("Login failure scenario for {}", credentials.email);
        self.page.navigate_to_login().await?;
        self.page
            .perform_login(&credentials.email, &credentials.password, false)
            .await?;
        self.page
            .base()
            .session()
            .wait_for_timeout(self.error_settle)
            .await;

        if !self.page.has_error_messages().await {
            return Err(PageError::Assertion(
                "no error indicator after an invalid login".to_string(),
            ));
        }

        let url = self.page.base().current_url().await?;
        if !url.contains("/login") {
            return Err(PageError::Assertion(format!(
                "left the login page after an invalid login: {}",
                url
            )));
        }

        match self.page.error_message().await? {
            Some(message) if !message.is_empty() => Ok(message),
            _ => Err(PageError::Assertion("error message is empty".to_string())),
        }
    }
}
