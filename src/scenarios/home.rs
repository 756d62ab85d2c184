use crate::core::BrowserTrait;
use crate::errors::{PageError, Result};
use crate::pages::{HomePage, HomeSection};
use crate::scenarios::fixture::ScenarioKind;
use tracing::info;

pub const EXPECTED_TITLE: &str = "DEMOQA";

/// Scenarios against the demo site's landing page.
pub struct HomeScenarios<'a, B: BrowserTrait> {
    page: &'a HomePage<B>,
}

impl<'a, B: BrowserTrait> HomeScenarios<'a, B> {
    pub fn new(page: &'a HomePage<B>) -> Self {
        Self { page }
    }

    pub async fn run(&self, kind: ScenarioKind) -> Result<()> {
        info!("Running scenario {}", kind);
        match kind {
            ScenarioKind::ElementsButton => self.validate_section(HomeSection::Elements).await,
            ScenarioKind::FormsButton => self.validate_section(HomeSection::Forms).await,
            ScenarioKind::AlertsButton => self.validate_section(HomeSection::AlertsWindows).await,
            ScenarioKind::WidgetsLabel => self.validate_section(HomeSection::Widgets).await,
            ScenarioKind::InteractionsButton => {
                self.validate_section(HomeSection::Interactions).await
            }
            ScenarioKind::BookStoreButton => self.validate_section(HomeSection::BookStore).await,
            ScenarioKind::AllCardsVisible => self.validate_all_cards_visible().await,
            ScenarioKind::CardTitles => self.validate_card_titles().await,
            ScenarioKind::CompleteNavigation => self.validate_complete_navigation().await,
        }
    }

    /// Home, entry visible, click, section URL reached.
    pub async fn validate_section(&self, section: HomeSection) -> Result<()> {
        self.page.navigate_to_home().await?;

        if !self.page.is_section_visible(section).await {
            return Err(PageError::Assertion(format!(
                "the {} entry is not visible",
                section
            )));
        }

        self.page.click_section(section).await?;
        if !self.page.validate_section_navigation(section).await? {
            return Err(PageError::Assertion(format!(
                "navigation to {} did not reach {}",
                section,
                self.page.section_url(section)?
            )));
        }
        Ok(())
    }

    pub async fn validate_all_cards_visible(&self) -> Result<()> {
        self.page.navigate_to_home().await?;
        if !self.page.are_all_cards_visible().await {
            return Err(PageError::Assertion(
                "not every card is visible on the home page".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn validate_card_titles(&self) -> Result<()> {
        self.page.navigate_to_home().await?;
        for section in HomeSection::ALL {
            let actual = self.page.card_title(section).await?;
            if actual.as_deref() != Some(section.title()) {
                return Err(PageError::Assertion(format!(
                    "card title mismatch: expected {:?}, found {:?}",
                    section.title(),
                    actual
                )));
            }
        }
        Ok(())
    }

    pub async fn validate_complete_navigation(&self) -> Result<()> {
        for section in HomeSection::ALL {
            self.validate_section(section).await?;
        }
        Ok(())
    }

    pub async fn validate_page_title(&self) -> Result<()> {
        self.page.navigate_to_home().await?;
        let title = self.page.base().page_title().await?;
        if title != EXPECTED_TITLE {
            return Err(PageError::Assertion(format!(
                "expected page title {:?}, found {:?}",
                EXPECTED_TITLE, title
            )));
        }
        Ok(())
    }
}
