use crate::browser::{BrowserSession, UrlPattern};
use crate::core::config::Config;
use crate::core::BrowserTrait;
use crate::errors::Result;
use crate::pages::base::{BasePage, Element, Page};
use crate::selectors::{Locator, SelectorStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const SELECTOR_FILE: &str = "home_demoqa.json";

/// The six entry points on the demo site's landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HomeSection {
    Elements,
    Forms,
    AlertsWindows,
    Widgets,
    Interactions,
    BookStore,
}

impl HomeSection {
    pub const ALL: [HomeSection; 6] = [
        HomeSection::Elements,
        HomeSection::Forms,
        HomeSection::AlertsWindows,
        HomeSection::Widgets,
        HomeSection::Interactions,
        HomeSection::BookStore,
    ];

    pub fn button_selector(&self) -> &'static str {
        match self {
            HomeSection::Elements => "buttonElementos",
            HomeSection::Forms => "buttonFormularios",
            HomeSection::AlertsWindows => "buttonAlertas",
            HomeSection::Widgets => "labelWidget",
            HomeSection::Interactions => "buttonInteraccion",
            HomeSection::BookStore => "buttonBiblioteca",
        }
    }

    pub fn card_selector(&self) -> &'static str {
        match self {
            HomeSection::Elements => "cardElementos",
            HomeSection::Forms => "cardFormularios",
            HomeSection::AlertsWindows => "cardAlertas",
            HomeSection::Widgets => "cardWidget",
            HomeSection::Interactions => "cardInteraccion",
            HomeSection::BookStore => "cardBiblioteca",
        }
    }

    /// Path the section lives at, relative to the site root.
    pub fn path(&self) -> &'static str {
        match self {
            HomeSection::Elements => "elements",
            HomeSection::Forms => "forms",
            HomeSection::AlertsWindows => "alertsWindows",
            HomeSection::Widgets => "widgets",
            HomeSection::Interactions => "interaction",
            HomeSection::BookStore => "books",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            HomeSection::Elements => "Elements",
            HomeSection::Forms => "Forms",
            HomeSection::AlertsWindows => "Alerts, Frame & Windows",
            HomeSection::Widgets => "Widgets",
            HomeSection::Interactions => "Interactions",
            HomeSection::BookStore => "Book Store Application",
        }
    }
}

impl fmt::Display for HomeSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

struct SectionLocators {
    button: Locator,
    card: Locator,
}

/// Landing page of the demo site.
pub struct HomePage<B: BrowserTrait> {
    base: BasePage<B>,
    selectors: SelectorStore,
    url: String,
    sections: HashMap<HomeSection, SectionLocators>,
    navigation_timeout: Duration,
}

impl<B: BrowserTrait> HomePage<B> {
    pub fn new(session: Arc<BrowserSession<B>>) -> Result<Self> {
        let config = session.config().clone();
        let selectors = SelectorStore::load(
            "home_demoqa",
            config.pages.selectors_dir.join(SELECTOR_FILE),
        )?;
        Self::with_selectors(session, selectors, &config)
    }

    pub fn with_selectors(
        session: Arc<BrowserSession<B>>,
        selectors: SelectorStore,
        config: &Config,
    ) -> Result<Self> {
        let mut sections = HashMap::new();
        for section in HomeSection::ALL {
            sections.insert(
                section,
                SectionLocators {
                    button: selectors.get(section.button_selector())?,
                    card: selectors.get(section.card_selector())?,
                },
            );
        }

        Ok(Self {
            url: config.targets.demo_home_url()?.to_string(),
            navigation_timeout: config.session.navigation_timeout(),
            sections,
            selectors,
            base: BasePage::new(session),
        })
    }

    pub fn base(&self) -> &BasePage<B> {
        &self.base
    }

    fn locators(&self, section: HomeSection) -> &SectionLocators {
        // every section is resolved in with_selectors
        &self.sections[&section]
    }

    pub fn button(&self, section: HomeSection) -> Element<'_, B> {
        self.base.element(&self.locators(section).button)
    }

    pub fn card(&self, section: HomeSection) -> Element<'_, B> {
        self.base.element(&self.locators(section).card)
    }

    pub async fn navigate_to_home(&self) -> Result<()> {
        self.base.goto(&self.url).await?;
        self.button(HomeSection::Elements)
            .wait_visible(self.navigation_timeout)
            .await
    }

    pub async fn click_section(&self, section: HomeSection) -> Result<()> {
        info!("Opening section {}", section);
        self.button(section).click().await
    }

    pub async fn is_section_visible(&self, section: HomeSection) -> bool {
        self.button(section).is_visible().await
    }

    pub async fn is_card_visible(&self, section: HomeSection) -> bool {
        self.card(section).is_visible().await
    }

    pub async fn are_all_cards_visible(&self) -> bool {
        for section in HomeSection::ALL {
            if !self.is_card_visible(section).await {
                debug!("Card {} not visible", section);
                return false;
            }
        }
        true
    }

    /// `Ok(false)` when the section's URL was not reached within the
    /// navigation timeout.
    pub async fn validate_section_navigation(&self, section: HomeSection) -> Result<bool> {
        let target = self.section_url(section)?;
        let pattern = UrlPattern::exact(target);
        if !self
            .base
            .wait_for_url(&pattern, self.navigation_timeout)
            .await?
        {
            return Ok(false);
        }
        let current = self.base.current_url().await?;
        Ok(current.contains(section.path()))
    }

    pub fn section_url(&self, section: HomeSection) -> Result<String> {
        let targets = &self.base.session().config().targets;
        Ok(targets.demo_section_url(section.path())?.to_string())
    }

    /// Heading text inside the section's card, trimmed.
    pub async fn card_title(&self, section: HomeSection) -> Result<Option<String>> {
        let heading = self.locators(section).card.descendant("h5");
        let text = self.base.element_text(&heading).await?;
        Ok(text.map(|t| t.trim().to_string()))
    }
}

#[async_trait]
impl<B: BrowserTrait> Page for HomePage<B> {
    fn name(&self) -> &'static str {
        "home_demoqa"
    }

    fn url(&self) -> Option<&str> {
        Some(&self.url)
    }

    fn selectors(&self) -> &SelectorStore {
        &self.selectors
    }

    async fn open(&self) -> Result<()> {
        self.navigate_to_home().await
    }

    async fn verify_loaded(&self) -> Result<bool> {
        for section in HomeSection::ALL {
            if !self.is_section_visible(section).await {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBrowser, MockElement, MockSite};

    const HOME: &str = "https://demoqa.com/";

    fn store() -> SelectorStore {
        let mut entries = Vec::new();
        for (i, section) in HomeSection::ALL.iter().enumerate() {
            entries.push(format!(
                r##"{{ "name": "{}", "locator": "#btn-{}" }}"##,
                section.button_selector(),
                section.path()
            ));
            entries.push(format!(
                r##"{{ "name": "{}", "locator": "#card-{}" }}"##,
                section.card_selector(),
                i + 1
            ));
        }
        SelectorStore::from_json_str(
            "home_demoqa",
            &format!(r#"{{ "locator": [{}] }}"#, entries.join(",")),
        )
        .unwrap()
    }

    fn site(hide_widgets_card: bool) -> MockSite {
        let mut elements = Vec::new();
        let mut site = MockSite::new(HOME);
        for (i, section) in HomeSection::ALL.iter().enumerate() {
            let url = format!("{}{}", HOME, section.path());
            elements.push(
                MockElement::new(format!("#btn-{}", section.path()))
                    .text(section.title())
                    .navigates_to(&url),
            );
            let card = MockElement::new(format!("#card-{}", i + 1));
            elements.push(if hide_widgets_card && *section == HomeSection::Widgets {
                card.hidden()
            } else {
                card
            });
            elements.push(
                MockElement::new(format!("#card-{} h5", i + 1)).text(&format!(" {} ", section.title())),
            );
            site = site.page(&url, vec![]);
        }
        site.page(HOME, elements)
    }

    async fn home(site: MockSite) -> HomePage<MockBrowser> {
        let mut config = Config::default();
        config.session.poll_interval_ms = 10;
        config.session.default_timeout_ms = 200;
        config.session.navigation_timeout_ms = 200;
        let session = BrowserSession::new(MockBrowser::new(site), config.clone())
            .await
            .unwrap();
        HomePage::with_selectors(Arc::new(session), store(), &config).unwrap()
    }

    #[tokio::test]
    async fn every_section_reaches_its_url() {
        let page = home(site(false)).await;
        for section in HomeSection::ALL {
            page.navigate_to_home().await.unwrap();
            assert!(page.is_section_visible(section).await);
            page.click_section(section).await.unwrap();
            assert!(page.validate_section_navigation(section).await.unwrap());
        }
    }

    #[tokio::test]
    async fn staying_home_is_not_a_navigation() {
        let page = home(site(false)).await;
        page.navigate_to_home().await.unwrap();
        assert!(!page
            .validate_section_navigation(HomeSection::Forms)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn card_titles_are_trimmed() {
        let page = home(site(false)).await;
        page.navigate_to_home().await.unwrap();
        assert_eq!(
            page.card_title(HomeSection::AlertsWindows).await.unwrap().as_deref(),
            Some("Alerts, Frame & Windows")
        );
    }

    #[tokio::test]
    async fn hidden_card_fails_the_cards_check() {
        let page = home(site(true)).await;
        page.navigate_to_home().await.unwrap();
        assert!(!page.are_all_cards_visible().await);

        let page = home(site(false)).await;
        page.navigate_to_home().await.unwrap();
        assert!(page.are_all_cards_visible().await);
        assert!(page.verify_loaded().await.unwrap());
    }

    #[test]
    fn section_paths_are_distinct() {
        let mut paths: Vec<_> = HomeSection::ALL.iter().map(|s| s.path()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 6);
    }
}
