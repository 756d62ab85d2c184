#[cfg(feature = "chrome")]
pub mod chrome;
pub mod navigation;
pub mod session;

#[cfg(feature = "chrome")]
pub use chrome::ChromeBrowser;
pub use navigation::{NavigationManager, NavigationResult, UrlPattern};
pub use session::BrowserSession;
