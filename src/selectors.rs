//! Per-page selector files.
//!
//! Each page object reads a JSON document shaped like
//! `{ "locator": [ { "name": "...", "locator": "..." } ] }` and resolves the
//! symbolic names it needs into [`Locator`] values when it is constructed.

use crate::errors::{PageError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocatorKind {
    Css,
    XPath,
}

/// A symbolic name bound to a locator expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    name: String,
    expression: String,
    kind: LocatorKind,
}

impl Locator {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        let expression = expression.into();
        let (kind, expression) = match expression.strip_prefix("xpath=") {
            Some(rest) => (LocatorKind::XPath, rest.to_string()),
            None if expression.starts_with('/') || expression.starts_with('(') => {
                (LocatorKind::XPath, expression)
            }
            None => (LocatorKind::Css, expression),
        };

        Self {
            name: name.into(),
            expression,
            kind,
        }
    }

    /// An unnamed locator, for probes that never live in a selector file.
    pub fn anonymous(expression: impl Into<String>) -> Self {
        let expression = expression.into();
        Self::new(expression.clone(), expression)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn kind(&self) -> LocatorKind {
        self.kind
    }

    /// Locator for a descendant, e.g. the `h5` title inside a card.
    pub fn descendant(&self, child: &str) -> Locator {
        let expression = match self.kind {
            LocatorKind::Css => format!("{} {}", self.expression, child),
            LocatorKind::XPath => format!("{}//{}", self.expression, child),
        };
        Locator {
            name: format!("{}/{}", self.name, child),
            expression,
            kind: self.kind,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.expression)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorEntry {
    pub name: String,
    pub locator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorDocument {
    pub locator: Vec<SelectorEntry>,
}

#[derive(Debug, Clone)]
pub struct SelectorStore {
    page: String,
    entries: HashMap<String, String>,
}

impl SelectorStore {
    pub fn load(page: &str, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| PageError::SelectorLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_json_str(page, &raw)?;
        debug!(
            "Loaded {} selectors for page '{}' from {}",
            store.len(),
            page,
            path.display()
        );
        Ok(store)
    }

    pub fn from_json_str(page: &str, raw: &str) -> Result<Self> {
        let document: SelectorDocument =
            serde_json::from_str(raw).map_err(|source| PageError::SelectorParse {
                page: page.to_string(),
                source,
            })?;
        Self::from_entries(page, document.locator)
    }

    pub fn from_entries(page: &str, entries: Vec<SelectorEntry>) -> Result<Self> {
        let mut map = HashMap::with_capacity(entries.len());
        for entry in entries {
            if map.contains_key(&entry.name) {
                return Err(PageError::DuplicateSelector {
                    page: page.to_string(),
                    name: entry.name,
                });
            }
            map.insert(entry.name, entry.locator);
        }

        Ok(Self {
            page: page.to_string(),
            entries: map,
        })
    }

    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn get(&self, name: &str) -> Result<Locator> {
        self.entries
            .get(name)
            .map(|expression| Locator::new(name, expression.as_str()))
            .ok_or_else(|| PageError::UnknownSelector {
                page: self.page.clone(),
                name: name.to_string(),
            })
    }

    pub fn get_optional(&self, name: &str) -> Option<Locator> {
        self.get(name).ok()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN: &str = r#"{
        "locator": [
            { "name": "inputEmail", "locator": "input[type=\"email\"]" },
            { "name": "inputPassword", "locator": "input[type=\"password\"]" },
            { "name": "buttonIniciarSesion", "locator": "//button[normalize-space()=\"Iniciar sesión\"]" }
        ]
    }"#;

    #[test]
    fn one_entry_per_record() {
        let store = SelectorStore::from_json_str("login", LOGIN).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(
            store.names(),
            vec!["buttonIniciarSesion", "inputEmail", "inputPassword"]
        );
    }

    #[test]
    fn locator_kind_is_detected() {
        let store = SelectorStore::from_json_str("login", LOGIN).unwrap();
        assert_eq!(store.get("inputEmail").unwrap().kind(), LocatorKind::Css);
        assert_eq!(
            store.get("buttonIniciarSesion").unwrap().kind(),
            LocatorKind::XPath
        );

        let prefixed = Locator::new("card", "xpath=(//div[@class='card'])[1]");
        assert_eq!(prefixed.kind(), LocatorKind::XPath);
        assert_eq!(prefixed.expression(), "(//div[@class='card'])[1]");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let raw = r##"{ "locator": [
            { "name": "inputEmail", "locator": "#email" },
            { "name": "inputEmail", "locator": "#other" }
        ] }"##;
        let err = SelectorStore::from_json_str("login", raw).unwrap_err();
        assert!(matches!(
            err,
            PageError::DuplicateSelector { ref name, .. } if name == "inputEmail"
        ));
    }

    #[test]
    fn unknown_name_is_an_error() {
        let store = SelectorStore::from_json_str("login", LOGIN).unwrap();
        let err = store.get("linkOlvidarPassword").unwrap_err();
        assert!(matches!(err, PageError::UnknownSelector { .. }));
        assert!(store.get_optional("linkOlvidarPassword").is_none());
    }

    #[test]
    fn malformed_and_missing_files_fail_to_load() {
        let err = SelectorStore::from_json_str("login", "{ \"locator\": 3 }").unwrap_err();
        assert!(matches!(err, PageError::SelectorParse { .. }));

        let dir = tempfile::tempdir().unwrap();
        let err = SelectorStore::load("login", dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, PageError::SelectorLoad { .. }));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("login.json");
        std::fs::write(&path, LOGIN).unwrap();

        let store = SelectorStore::load("login", &path).unwrap();
        assert_eq!(store.page(), "login");
        assert!(store.contains("inputPassword"));
    }

    #[test]
    fn descendant_locators_follow_the_parent_kind() {
        let css = Locator::new("cardElementos", ".card:nth-child(1)");
        assert_eq!(css.descendant("h5").expression(), ".card:nth-child(1) h5");

        let xpath = Locator::new("cardElementos", "(//div[contains(@class,'top-card')])[1]");
        assert_eq!(
            xpath.descendant("h5").expression(),
            "(//div[contains(@class,'top-card')])[1]//h5"
        );
    }
}
