pub mod assist;
pub mod browser;
pub mod core;
pub mod errors;
pub mod inspect;
pub mod pages;
pub mod scenarios;
pub mod selectors;
pub mod testing;
pub mod types;
pub mod utils;

pub use browser::{BrowserSession, UrlPattern};
#[cfg(feature = "chrome")]
pub use browser::ChromeBrowser;
pub use crate::core::{BrowserTrait, Config};
pub use errors::{PageError, Result};
pub use pages::{HomePage, HomeSection, LoginPage, NavbarPage, Page};
pub use selectors::{Locator, SelectorStore};
pub use types::*;
