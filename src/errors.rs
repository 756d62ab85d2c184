use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Browser not launched")]
    BrowserNotLaunched,

    #[error("Tab creation failed: {0}")]
    TabCreationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("Device emulation failed: {0}")]
    EmulationFailed(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotFailed(String),

    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("Failed to read selector file {}: {source}", .path.display())]
    SelectorLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed selector file for page '{page}': {source}")]
    SelectorParse {
        page: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Duplicate selector '{name}' in page '{page}'")]
    DuplicateSelector { page: String, name: String },

    #[error("Unknown selector '{name}' in page '{page}'")]
    UnknownSelector { page: String, name: String },

    #[error("Invalid URL pattern '{pattern}': {reason}")]
    InvalidUrlPattern { pattern: String, reason: String },

    #[error("Unrecognized scenario type: {0}")]
    UnknownScenario(String),

    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Instruction could not be interpreted: {0}")]
    Interpretation(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Anyhow error: {0}")]
    AnyhowError(String),
}

pub type Result<T> = std::result::Result<T, PageError>;

// Convert anyhow::Error to PageError
impl From<anyhow::Error> for PageError {
    fn from(err: anyhow::Error) -> Self {
        PageError::AnyhowError(err.to_string())
    }
}

impl PageError {
    pub fn timeout(what: impl Into<String>, timeout_ms: u64) -> Self {
        PageError::Timeout {
            what: what.into(),
            timeout_ms,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PageError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_the_wait() {
        let err = PageError::timeout("url **/elements", 10_000);
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "Timed out after 10000ms waiting for url **/elements"
        );
    }

    #[test]
    fn unknown_scenario_names_the_type() {
        let err = PageError::UnknownScenario("validarNada".to_string());
        assert!(err.to_string().contains("validarNada"));
        assert!(!err.is_timeout());
    }
}
