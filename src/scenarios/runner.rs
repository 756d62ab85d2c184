use crate::browser::BrowserSession;
use crate::core::{BrowserTrait, Config};
use crate::errors::{PageError, Result};
use crate::pages::HomePage;
use crate::scenarios::fixture::{ScenarioCase, ScenarioKind};
use crate::scenarios::home::HomeScenarios;
use crate::types::Device;
use crate::utils::{ScreenshotManager, ScreenshotPhase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

pub const DEFAULT_PREFIX: &str = "homedemoqa";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Passed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub index: usize,
    pub name: String,
    pub test_type: String,
    pub device: Device,
    pub status: ScenarioStatus,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub screenshots: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: String,
    pub browser: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub scenarios: Vec<ScenarioReport>,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.scenarios
            .iter()
            .filter(|s| s.status == ScenarioStatus::Passed)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.scenarios.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub async fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, body).await?;
        info!("Wrote report {}", path.display());
        Ok(())
    }
}

/// Runs fixture cases against the demo site, one fresh browser per case.
///
/// At most `config.run.workers` cases run at a time. A failing case never
/// affects the others; its error and an `error` screenshot land in the report.
pub struct ScenarioRunner<B, F>
where
    B: BrowserTrait + 'static,
    F: Fn() -> B + Send + Sync + 'static,
{
    config: Arc<Config>,
    factory: Arc<F>,
    prefix: String,
}

impl<B, F> ScenarioRunner<B, F>
where
    B: BrowserTrait + 'static,
    F: Fn() -> B + Send + Sync + 'static,
{
    pub fn new(config: Config, factory: F) -> Self {
        Self {
            config: Arc::new(config),
            factory: Arc::new(factory),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    /// Screenshot file prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub async fn run(&self, cases: Vec<ScenarioCase>) -> RunReport {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let workers = self.config.run.workers.max(1);
        let semaphore = Arc::new(Semaphore::new(workers));
        info!(
            "Run {}: {} case(s) on {} worker(s)",
            run_id,
            cases.len(),
            workers
        );

        let mut handles = Vec::with_capacity(cases.len());
        for (i, case) in cases.into_iter().enumerate() {
            let index = i + 1;
            let semaphore = Arc::clone(&semaphore);
            let config = Arc::clone(&self.config);
            let factory = Arc::clone(&self.factory);
            let prefix = self.prefix.clone();
            let fallback = case.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                run_case(&config, factory(), &prefix, index, case).await
            });
            handles.push((index, fallback, handle));
        }

        let mut scenarios = Vec::with_capacity(handles.len());
        for (index, case, handle) in handles {
            let report = match handle.await {
                Ok(report) => report,
                Err(join_error) => {
                    error!("Case {} aborted: {}", index, join_error);
                    failed_report(index, &case, Utc::now(), 0, join_error.to_string(), Vec::new())
                }
            };
            scenarios.push(report);
        }

        let report = RunReport {
            run_id,
            browser: self.config.browser.browser_type.name().to_string(),
            started_at,
            finished_at: Utc::now(),
            scenarios,
        };
        info!("{} passed, {} failed", report.passed(), report.failed());
        report
    }
}

fn failed_report(
    index: usize,
    case: &ScenarioCase,
    started_at: DateTime<Utc>,
    duration_ms: u64,
    error: String,
    screenshots: Vec<PathBuf>,
) -> ScenarioReport {
    ScenarioReport {
        index,
        name: case.name.clone(),
        test_type: case.test_type.clone(),
        device: case.device,
        status: ScenarioStatus::Failed,
        started_at,
        duration_ms,
        error: Some(error),
        screenshots,
    }
}

/// Runs one case to completion and reports it.
pub async fn run_case<B: BrowserTrait>(
    config: &Config,
    browser: B,
    prefix: &str,
    index: usize,
    case: ScenarioCase,
) -> ScenarioReport {
    let started_at = Utc::now();
    let start_time = Instant::now();
    info!("{}. {} ({})", index, case.name, case.description);

    let mut screenshots = Vec::new();
    let result = execute_case(config, browser, prefix, index, &case, &mut screenshots).await;
    let duration_ms = start_time.elapsed().as_millis() as u64;

    match result {
        Ok(()) => ScenarioReport {
            index,
            name: case.name.clone(),
            test_type: case.test_type.clone(),
            device: case.device,
            status: ScenarioStatus::Passed,
            started_at,
            duration_ms,
            error: None,
            screenshots,
        },
        Err(err) => {
            error!("{}. {} failed: {}", index, case.name, err);
            failed_report(index, &case, started_at, duration_ms, err.to_string(), screenshots)
        }
    }
}

async fn execute_case<B: BrowserTrait>(
    config: &Config,
    browser: B,
    prefix: &str,
    index: usize,
    case: &ScenarioCase,
    screenshots: &mut Vec<PathBuf>,
) -> Result<()> {
    // unknown types fail before a browser is started
    let kind = case.kind()?;

    let session = Arc::new(BrowserSession::new(browser, config.clone()).await?);
    let result = drive_case(&session, prefix, index, case, kind, screenshots).await;

    if result.is_err() {
        if let Some(path) =
            ScreenshotManager::capture_quietly(&session, prefix, index, ScreenshotPhase::Error).await
        {
            screenshots.push(path);
        }
    }

    match Arc::try_unwrap(session) {
        Ok(session) => {
            if let Err(err) = session.close().await {
                warn!("Closing session failed: {}", err);
            }
        }
        Err(_) => warn!("Session still shared after case {}, not closed", index),
    }

    result
}

async fn drive_case<B: BrowserTrait>(
    session: &Arc<BrowserSession<B>>,
    prefix: &str,
    index: usize,
    case: &ScenarioCase,
    kind: ScenarioKind,
    screenshots: &mut Vec<PathBuf>,
) -> Result<()> {
    session.emulate(case.device).await?;

    let home = HomePage::new(Arc::clone(session))?;
    home.navigate_to_home().await?;
    screenshots
        .push(ScreenshotManager::capture(session, prefix, index, ScreenshotPhase::Initial).await?);

    HomeScenarios::new(&home).run(kind).await?;

    if let Some(expected) = case.expected_url() {
        let url = session.current_url().await?;
        if !url.contains(expected) {
            return Err(PageError::Assertion(format!(
                "expected url containing {}, at {}",
                expected, url
            )));
        }
    }

    screenshots
        .push(ScreenshotManager::capture(session, prefix, index, ScreenshotPhase::Final).await?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBrowser, MockSite};

    fn case(test_type: &str) -> ScenarioCase {
        ScenarioCase {
            name: "case".to_string(),
            description: String::new(),
            test_type: test_type.to_string(),
            device: Device::Desktop,
            expected_url: None,
        }
    }

    #[tokio::test]
    async fn unknown_type_fails_without_launching() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.artifacts.screenshot_dir = dir.path().to_path_buf();

        let runner = ScenarioRunner::new(config, || MockBrowser::new(MockSite::new("about:blank")));
        let report = runner.run(vec![case("validarAlgoRaro")]).await;

        assert_eq!(report.failed(), 1);
        let scenario = &report.scenarios[0];
        assert!(scenario.error.as_deref().unwrap().contains("validarAlgoRaro"));
        assert!(scenario.screenshots.is_empty());
    }

    #[tokio::test]
    async fn report_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let report = RunReport {
            run_id: "r".to_string(),
            browser: "chromium".to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            scenarios: vec![failed_report(
                1,
                &case("validarTitulosCards"),
                Utc::now(),
                12,
                "boom".to_string(),
                Vec::new(),
            )],
        };
        let path = dir.path().join("nested").join("results.json");
        tokio_test::assert_ok!(report.write_json(&path).await);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"testType\": \"validarTitulosCards\""));
        assert!(raw.contains("\"status\": \"failed\""));
        let parsed: RunReport = serde_json::from_str(&raw).unwrap();
        assert!(!parsed.all_passed());
    }
}
