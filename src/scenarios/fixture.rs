use crate::errors::{PageError, Result};
use crate::types::Device;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// One row of a data-provider fixture file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioCase {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "testType")]
    pub test_type: String,
    #[serde(default)]
    pub device: Device,
    #[serde(rename = "expectedUrl", default)]
    pub expected_url: Option<String>,
}

impl ScenarioCase {
    pub fn kind(&self) -> Result<ScenarioKind> {
        self.test_type.parse()
    }

    /// The expected URL, unless the fixture left it blank.
    pub fn expected_url(&self) -> Option<&str> {
        self.expected_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Scenario a fixture row dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    ElementsButton,
    FormsButton,
    AlertsButton,
    WidgetsLabel,
    InteractionsButton,
    BookStoreButton,
    AllCardsVisible,
    CardTitles,
    CompleteNavigation,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 9] = [
        ScenarioKind::ElementsButton,
        ScenarioKind::FormsButton,
        ScenarioKind::AlertsButton,
        ScenarioKind::WidgetsLabel,
        ScenarioKind::InteractionsButton,
        ScenarioKind::BookStoreButton,
        ScenarioKind::AllCardsVisible,
        ScenarioKind::CardTitles,
        ScenarioKind::CompleteNavigation,
    ];

    /// Identifier used in the `testType` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioKind::ElementsButton => "validarBotonElementos",
            ScenarioKind::FormsButton => "validarBotonFormularios",
            ScenarioKind::AlertsButton => "validarBotonAlertas",
            ScenarioKind::WidgetsLabel => "validarLabelWidget",
            ScenarioKind::InteractionsButton => "validarBotonInteraccion",
            ScenarioKind::BookStoreButton => "validarBotonBiblioteca",
            ScenarioKind::AllCardsVisible => "validarTodasLasCardsVisibles",
            ScenarioKind::CardTitles => "validarTitulosCards",
            ScenarioKind::CompleteNavigation => "validarNavegacionCompleta",
        }
    }
}

impl FromStr for ScenarioKind {
    type Err = PageError;

    fn from_str(s: &str) -> Result<Self> {
        ScenarioKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| PageError::UnknownScenario(s.to_string()))
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn parse_cases(raw: &str) -> Result<Vec<ScenarioCase>> {
    Ok(serde_json::from_str(raw)?)
}

pub fn load_cases(path: impl AsRef<Path>) -> Result<Vec<ScenarioCase>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        PageError::ConfigurationError(format!("cannot read fixture {}: {}", path.display(), e))
    })?;
    parse_cases(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use test_case::test_case;

    #[test_case("validarBotonElementos", ScenarioKind::ElementsButton)]
    #[test_case("validarLabelWidget", ScenarioKind::WidgetsLabel)]
    #[test_case("validarTitulosCards", ScenarioKind::CardTitles)]
    #[test_case("validarNavegacionCompleta", ScenarioKind::CompleteNavigation)]
    fn known_types_parse(raw: &str, expected: ScenarioKind) {
        assert_eq!(raw.parse::<ScenarioKind>().unwrap(), expected);
    }

    #[test]
    fn unknown_type_is_named_in_the_error() {
        let err = "validarAlgoRaro".parse::<ScenarioKind>().unwrap_err();
        assert!(err.to_string().contains("validarAlgoRaro"));
    }

    #[test]
    fn device_defaults_and_blank_url() {
        let cases = parse_cases(
            r#"[{ "nombre": "n", "testType": "validarTitulosCards", "expectedUrl": " " }]"#,
        )
        .unwrap();
        assert_eq!(cases[0].device, Device::Desktop);
        assert_eq!(cases[0].expected_url(), None);
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{ "nombre": "m", "description": "d", "testType": "validarBotonBiblioteca", "device": "mobile", "expectedUrl": "https://demoqa.com/books" }}]"#
        )
        .unwrap();

        let cases = load_cases(file.path()).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].device, Device::Mobile);
        assert_eq!(cases[0].kind().unwrap(), ScenarioKind::BookStoreButton);
        assert_eq!(cases[0].expected_url(), Some("https://demoqa.com/books"));
    }

    #[test]
    fn bundled_fixture_has_every_kind() {
        let cases = load_cases(concat!(env!("CARGO_MANIFEST_DIR"), "/data/homedemoqa.json")).unwrap();
        let kinds: Vec<_> = cases.iter().map(|c| c.kind().unwrap()).collect();
        for kind in ScenarioKind::ALL {
            assert!(kinds.contains(&kind), "{} missing", kind);
        }
    }
}
