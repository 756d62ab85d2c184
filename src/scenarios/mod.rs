//! Scenarios that drive the page objects, and the data-provider runner.

pub mod fixture;
pub mod home;
pub mod login;
pub mod runner;

pub use fixture::{load_cases, ScenarioCase, ScenarioKind};
pub use home::HomeScenarios;
pub use login::{Credentials, LoginScenarios};
pub use runner::{RunReport, ScenarioReport, ScenarioRunner, ScenarioStatus};
