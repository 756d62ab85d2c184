pub mod base;
pub mod home;
pub mod login;
pub mod navbar;

pub use base::{BasePage, Element, Page};
pub use home::{HomePage, HomeSection};
pub use login::LoginPage;
pub use navbar::NavbarPage;
