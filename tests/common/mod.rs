//! In-memory copies of the staging app and the demo site, built from the
//! bundled selector files so the page objects resolve exactly what they
//! would against the real pages.

#![allow(dead_code)]

use pom_e2e::core::Config;
use pom_e2e::pages::HomeSection;
use pom_e2e::selectors::SelectorStore;
use pom_e2e::testing::{ClickEffect, MockElement, MockSite};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const LOGIN_URL: &str = "https://dev.paisabombas.app/login";
pub const DASHBOARD_URL: &str = "https://dev.paisabombas.app/dashboard";
pub const DEMO_HOME: &str = "https://demoqa.com/";
pub const LOGIN_ERROR: &str = "Credenciales inválidas";

pub fn selectors_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("selectors")
}

pub fn store(page: &str, file: &str) -> SelectorStore {
    SelectorStore::load(page, selectors_dir().join(file)).unwrap()
}

fn expr(store: &SelectorStore, name: &str) -> String {
    store.get(name).unwrap().expression().to_string()
}

/// Short timeouts so failure paths finish quickly.
pub fn fast_config(artifacts: &Path) -> Config {
    let mut config = Config::default();
    config.session.poll_interval_ms = 10;
    config.session.default_timeout_ms = 300;
    config.session.navigation_timeout_ms = 300;
    config.session.error_probe_timeout_ms = 100;
    config.session.menu_settle_ms = 0;
    config.session.network_idle_ms = 0;
    config.artifacts.screenshot_dir = artifacts.join("screenshots");
    config.artifacts.report_path = artifacts.join("results.json");
    config
}

/// Login page that accepts one account, plus a dashboard with the purchases menu.
pub fn staging_site() -> MockSite {
    let login = store("login", "login.json");
    let navbar = store("navbar", "navbar.json");

    let email = expr(&login, "inputEmail");
    let password = expr(&login, "inputPassword");
    let modal = expr(&login, "modalError");

    let submit = ClickEffect::Submit {
        expected: vec![
            (email.clone(), "apollostudiogt@gmail.com".to_string()),
            (password.clone(), "wQt2x7@zI10*".to_string()),
        ],
        on_match: Box::new(ClickEffect::Navigate(DASHBOARD_URL.to_string())),
        on_mismatch: Box::new(ClickEffect::Reveal {
            selectors: vec![modal.clone()],
            after: Duration::from_millis(20),
        }),
    };

    let submenu = [
        ("OrdenesCompraSubmodule", "Órdenes de compra", "compras/ordenes"),
        ("comprasSubmodule", "Compras", "compras/listado"),
        ("procesarOrdenesSubmodule", "Procesar órdenes", "compras/procesar"),
    ];

    let mut dashboard = vec![MockElement::new(expr(&navbar, "comprasNavBar"))
        .text("Compras")
        .on_click(ClickEffect::Reveal {
            selectors: submenu.iter().map(|(name, _, _)| expr(&navbar, name)).collect(),
            after: Duration::ZERO,
        })];
    let mut site = MockSite::new("about:blank");
    for (name, text, path) in submenu {
        let url = format!("https://dev.paisabombas.app/{}", path);
        dashboard.push(
            MockElement::new(expr(&navbar, name))
                .text(text)
                .hidden()
                .navigates_to(&url),
        );
        site = site.page(&url, vec![]);
    }

    site.page(
        LOGIN_URL,
        vec![
            MockElement::input(email),
            MockElement::input(password),
            MockElement::button(expr(&login, "buttonIniciarSesion"), "Iniciar sesión").on_click(submit),
            MockElement::new(expr(&login, "linkOlvidarPassword")).text("¿Olvidaste tu contraseña?"),
            MockElement::new(modal).text(&format!("  {}  ", LOGIN_ERROR)).hidden(),
        ],
    )
    .title(LOGIN_URL, "Paisa Bombas")
    .page(DASHBOARD_URL, dashboard)
    .title(DASHBOARD_URL, "Dashboard")
}

/// Demo landing page with six entries and cards; `broken` sections
/// have a button that goes nowhere.
pub fn demo_site(broken: &[HomeSection]) -> MockSite {
    let home = store("home_demoqa", "home_demoqa.json");
    let mut elements = Vec::new();
    let mut site = MockSite::new("about:blank");

    for section in HomeSection::ALL {
        let url = format!("{}{}", DEMO_HOME, section.path());
        let button = MockElement::new(expr(&home, section.button_selector())).text(section.title());
        elements.push(if broken.contains(&section) {
            button
        } else {
            button.navigates_to(&url)
        });

        let card = home.get(section.card_selector()).unwrap();
        elements.push(MockElement::new(card.expression()));
        elements.push(MockElement::new(card.descendant("h5").expression()).text(section.title()));

        site = site.page(&url, vec![]).title(&url, "DEMOQA");
    }

    site.page(DEMO_HOME, elements).title(DEMO_HOME, "DEMOQA")
}
