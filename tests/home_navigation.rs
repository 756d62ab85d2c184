mod common;

use common::{demo_site, fast_config};
use pom_e2e::browser::BrowserSession;
use pom_e2e::errors::PageError;
use pom_e2e::pages::{HomePage, HomeSection, Page};
use pom_e2e::scenarios::{HomeScenarios, ScenarioKind};
use pom_e2e::testing::MockBrowser;
use std::sync::Arc;
use test_case::test_case;
use tokio_test::assert_ok;

async fn home(broken: &[HomeSection]) -> (tempfile::TempDir, HomePage<MockBrowser>) {
    let dir = tempfile::tempdir().unwrap();
    let session = BrowserSession::new(MockBrowser::new(demo_site(broken)), fast_config(dir.path()))
        .await
        .unwrap();
    let page = HomePage::new(Arc::new(session)).unwrap();
    (dir, page)
}

#[test_case(HomeSection::Elements, "https://demoqa.com/elements")]
#[test_case(HomeSection::Forms, "https://demoqa.com/forms")]
#[test_case(HomeSection::AlertsWindows, "https://demoqa.com/alertsWindows")]
#[test_case(HomeSection::Widgets, "https://demoqa.com/widgets")]
#[test_case(HomeSection::Interactions, "https://demoqa.com/interaction")]
#[test_case(HomeSection::BookStore, "https://demoqa.com/books")]
#[tokio::test]
async fn entry_point_reaches_its_section(section: HomeSection, expected: &str) {
    let (_dir, page) = home(&[]).await;
    assert_ok!(HomeScenarios::new(&page).validate_section(section).await);
    assert_eq!(page.base().current_url().await.unwrap(), expected);
}

#[tokio::test]
async fn dead_entry_point_fails_with_the_target_url() {
    let (_dir, page) = home(&[HomeSection::Widgets]).await;
    let err = HomeScenarios::new(&page)
        .validate_section(HomeSection::Widgets)
        .await
        .unwrap_err();

    match err {
        PageError::Assertion(message) => assert!(message.contains("https://demoqa.com/widgets")),
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn landing_page_checks() {
    let (_dir, page) = home(&[]).await;
    let scenarios = HomeScenarios::new(&page);

    assert_ok!(scenarios.run(ScenarioKind::AllCardsVisible).await);
    assert_ok!(scenarios.run(ScenarioKind::CardTitles).await);
    assert_ok!(scenarios.validate_page_title().await);
    assert!(page.verify_loaded().await.unwrap());
}

#[tokio::test]
async fn complete_navigation_ends_on_the_book_store() {
    let (_dir, page) = home(&[]).await;
    assert_ok!(HomeScenarios::new(&page).run(ScenarioKind::CompleteNavigation).await);
    assert_eq!(
        page.base().current_url().await.unwrap(),
        "https://demoqa.com/books"
    );
}

#[tokio::test]
async fn complete_navigation_stops_at_the_first_dead_entry() {
    let (_dir, page) = home(&[HomeSection::Forms]).await;
    assert!(HomeScenarios::new(&page)
        .run(ScenarioKind::CompleteNavigation)
        .await
        .is_err());
    assert_eq!(page.base().current_url().await.unwrap(), "https://demoqa.com/");
}
