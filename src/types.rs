use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// What the browser reports about the first element a locator matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub tag_name: String,
    pub visible: bool,
    pub enabled: bool,
    pub text_content: Option<String>,
    pub value: Option<String>,
    /// `None` for elements without a checked state.
    #[serde(default)]
    pub checked: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Desktop,
    Mobile,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Desktop => write!(f, "desktop"),
            Device::Mobile => write!(f, "mobile"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    #[serde(default)]
    pub is_mobile: bool,
    #[serde(default)]
    pub has_touch: bool,
}

impl DeviceProfile {
    pub fn desktop() -> Self {
        Self {
            viewport: Viewport {
                width: 1920,
                height: 1080,
            },
            user_agent: None,
            is_mobile: false,
            has_touch: false,
        }
    }

    pub fn mobile() -> Self {
        Self {
            viewport: Viewport {
                width: 375,
                height: 667,
            },
            user_agent: Some(
                "Mozilla/5.0 (iPhone; CPU iPhone OS 14_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Mobile/15E148 Safari/604.1"
                    .to_string(),
            ),
            is_mobile: true,
            has_touch: true,
        }
    }
}
