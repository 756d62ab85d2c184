use crate::browser::BrowserSession;
use crate::core::config::Config;
use crate::core::BrowserTrait;
use crate::errors::Result;
use crate::pages::base::{BasePage, Element, Page};
use crate::selectors::{Locator, SelectorStore};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const SELECTOR_FILE: &str = "navbar.json";

/// Purchases ("Compras") menu of the staging app's side navigation.
///
/// The navbar has no URL of its own; it is present on every page after login.
pub struct NavbarPage<B: BrowserTrait> {
    base: BasePage<B>,
    selectors: SelectorStore,
    purchases_menu: Locator,
    purchase_orders: Locator,
    purchases: Locator,
    process_orders: Locator,
    menu_settle: Duration,
}

impl<B: BrowserTrait> NavbarPage<B> {
    pub fn new(session: Arc<BrowserSession<B>>) -> Result<Self> {
        let config = session.config().clone();
        let selectors = SelectorStore::load(
            "navbar",
            config.pages.selectors_dir.join(SELECTOR_FILE),
        )?;
        Self::with_selectors(session, selectors, &config)
    }

    pub fn with_selectors(
        session: Arc<BrowserSession<B>>,
        selectors: SelectorStore,
        config: &Config,
    ) -> Result<Self> {
        Ok(Self {
            purchases_menu: selectors.get("comprasNavBar")?,
            purchase_orders: selectors.get("OrdenesCompraSubmodule")?,
            purchases: selectors.get("comprasSubmodule")?,
            process_orders: selectors.get("procesarOrdenesSubmodule")?,
            menu_settle: config.session.menu_settle(),
            selectors,
            base: BasePage::new(session),
        })
    }

    pub fn purchases_menu(&self) -> Element<'_, B> {
        self.base.element(&self.purchases_menu)
    }

    pub fn purchase_orders(&self) -> Element<'_, B> {
        self.base.element(&self.purchase_orders)
    }

    pub fn purchases(&self) -> Element<'_, B> {
        self.base.element(&self.purchases)
    }

    pub fn process_orders(&self) -> Element<'_, B> {
        self.base.element(&self.process_orders)
    }

    pub async fn click_purchases_menu(&self) -> Result<()> {
        self.purchases_menu().click().await
    }

    pub async fn click_purchase_orders(&self) -> Result<()> {
        self.purchase_orders().click().await
    }

    pub async fn click_purchases(&self) -> Result<()> {
        self.purchases().click().await
    }

    pub async fn click_process_orders(&self) -> Result<()> {
        self.process_orders().click().await
    }

    pub async fn is_purchases_menu_visible(&self) -> bool {
        self.purchases_menu().is_visible().await
    }

    pub async fn is_purchase_orders_visible(&self) -> bool {
        self.purchase_orders().is_visible().await
    }

    pub async fn is_purchases_visible(&self) -> bool {
        self.purchases().is_visible().await
    }

    pub async fn is_process_orders_visible(&self) -> bool {
        self.process_orders().is_visible().await
    }

    pub async fn are_all_elements_visible(&self) -> bool {
        self.is_purchases_menu_visible().await && self.are_submenu_elements_visible().await
    }

    pub async fn are_submenu_elements_visible(&self) -> bool {
        self.is_purchase_orders_visible().await
            && self.is_purchases_visible().await
            && self.is_process_orders_visible().await
    }

    /// Opens the menu unless its entries are already showing.
    pub async fn expand_purchases_menu(&self) -> Result<()> {
        if self.are_submenu_elements_visible().await {
            debug!("Purchases menu already expanded");
            return Ok(());
        }
        self.click_purchases_menu().await?;
        self.base.session().wait_for_timeout(self.menu_settle).await;
        Ok(())
    }

    pub async fn navigate_to_purchase_orders(&self) -> Result<()> {
        self.expand_purchases_menu().await?;
        self.click_purchase_orders().await
    }

    pub async fn navigate_to_purchases(&self) -> Result<()> {
        self.expand_purchases_menu().await?;
        self.click_purchases().await
    }

    pub async fn navigate_to_process_orders(&self) -> Result<()> {
        self.expand_purchases_menu().await?;
        self.click_process_orders().await
    }

    pub async fn purchases_menu_text(&self) -> Result<Option<String>> {
        self.purchases_menu().text().await
    }

    pub async fn purchase_orders_text(&self) -> Result<Option<String>> {
        self.purchase_orders().text().await
    }

    pub async fn purchases_text(&self) -> Result<Option<String>> {
        self.purchases().text().await
    }

    pub async fn process_orders_text(&self) -> Result<Option<String>> {
        self.process_orders().text().await
    }
}

#[async_trait]
impl<B: BrowserTrait> Page for NavbarPage<B> {
    fn name(&self) -> &'static str {
        "navbar"
    }

    fn url(&self) -> Option<&str> {
        None
    }

    fn selectors(&self) -> &SelectorStore {
        &self.selectors
    }

    async fn open(&self) -> Result<()> {
        self.purchases_menu()
            .wait_visible(self.base.default_timeout())
            .await
    }

    async fn verify_loaded(&self) -> Result<bool> {
        Ok(self.is_purchases_menu_visible().await)
    }
}
