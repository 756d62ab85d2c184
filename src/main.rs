use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pom_e2e::browser::{BrowserSession, ChromeBrowser};
use pom_e2e::core::Config;
use pom_e2e::inspect::PageInventory;
use pom_e2e::pages::LoginPage;
use pom_e2e::scenarios::login::DASHBOARD_URL;
use pom_e2e::scenarios::runner::DEFAULT_PREFIX;
use pom_e2e::scenarios::{load_cases, Credentials, LoginScenarios, ScenarioRunner};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pom-e2e")]
#[command(author, version, long_about = None)]
#[command(about = "Page object end-to-end checks for the Paisa Bombas staging app and DemoQA")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON config file; environment overrides apply on top
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Show the browser window
    #[arg(long, global = true)]
    headed: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the data-provider scenarios against the demo site
    Run {
        /// Fixture file with the cases to run
        #[arg(value_name = "FIXTURE", default_value = "data/homedemoqa.json")]
        fixture: PathBuf,

        /// Cases run at the same time
        #[arg(short, long)]
        workers: Option<usize>,

        /// Where to write the JSON report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Screenshot file prefix
        #[arg(long, default_value = DEFAULT_PREFIX)]
        prefix: String,
    },

    /// Sign in to the staging app
    Login {
        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        password: Option<String>,

        /// URL a successful login redirects to
        #[arg(long, default_value = DASHBOARD_URL)]
        expected_url: String,

        /// Expect the credentials to be rejected
        #[arg(long)]
        expect_failure: bool,
    },

    /// List the inputs, buttons and links of a page
    Inspect {
        /// Page to inspect (defaults to the staging login page)
        #[arg(value_name = "URL")]
        url: Option<String>,

        /// Extra wait after load for client-side rendering
        #[arg(long, default_value_t = 5000)]
        settle_ms: u64,

        /// Print the inventory as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    }
    .with_env_overrides()?;
    if cli.headed {
        config.browser.headless = false;
    }

    match cli.command {
        Commands::Run {
            fixture,
            workers,
            report,
            prefix,
        } => {
            if let Some(workers) = workers {
                config.run.workers = workers;
            }
            config.validate()?;
            run(config, fixture, report, prefix).await
        }
        Commands::Login {
            email,
            password,
            expected_url,
            expect_failure,
        } => login(config, email, password, expected_url, expect_failure).await,
        Commands::Inspect {
            url,
            settle_ms,
            json,
        } => inspect(config, url, settle_ms, json).await,
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("pom_e2e=debug")
        } else {
            EnvFilter::new("pom_e2e=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(
    config: Config,
    fixture: PathBuf,
    report: Option<PathBuf>,
    prefix: String,
) -> Result<()> {
    let cases = load_cases(&fixture)
        .with_context(|| format!("loading fixture {}", fixture.display()))?;
    let report_path = report.unwrap_or_else(|| config.artifacts.report_path.clone());

    let runner = ScenarioRunner::new(config, ChromeBrowser::new).with_prefix(prefix);
    let report = runner.run(cases).await;
    report.write_json(&report_path).await?;

    for scenario in &report.scenarios {
        match &scenario.error {
            None => println!("  ok    {}. {} ({}ms)", scenario.index, scenario.name, scenario.duration_ms),
            Some(err) => println!("  FAIL  {}. {}: {}", scenario.index, scenario.name, err),
        }
    }
    println!("{} passed, {} failed", report.passed(), report.failed());

    if !report.all_passed() {
        bail!("{} scenario(s) failed", report.failed());
    }
    Ok(())
}

async fn login(
    config: Config,
    email: Option<String>,
    password: Option<String>,
    expected_url: String,
    expect_failure: bool,
) -> Result<()> {
    let defaults = if expect_failure {
        Credentials::staging_invalid()
    } else {
        Credentials::staging_valid()
    };
    let credentials = Credentials::new(
        email.unwrap_or(defaults.email),
        password.unwrap_or(defaults.password),
    );

    let session = Arc::new(BrowserSession::new(ChromeBrowser::new(), config).await?);
    let page = LoginPage::new(Arc::clone(&session))?;
    let scenarios = LoginScenarios::new(&page);

    let outcome = if expect_failure {
        scenarios
            .login_fails(&credentials)
            .await
            .map(|message| info!("Login rejected as expected: {}", message))
    } else {
        scenarios
            .login_succeeds(&credentials, &expected_url)
            .await
            .map(|()| info!("Logged in as {}", credentials.email))
    };

    drop(page);
    close(session).await;
    Ok(outcome?)
}

async fn inspect(config: Config, url: Option<String>, settle_ms: u64, json: bool) -> Result<()> {
    let url = match url {
        Some(url) => url,
        None => config.targets.login_url()?.to_string(),
    };
    let timeout = config.session.default_timeout();

    let session = Arc::new(BrowserSession::new(ChromeBrowser::new(), config).await?);
    session.goto(&url).await?;
    session.wait_for_network_idle(timeout).await?;
    session.wait_for_timeout(Duration::from_millis(settle_ms)).await;

    let html = session.page_source().await;
    close(session).await;
    let inventory = PageInventory::from_html(&html?);

    if json {
        println!("{}", serde_json::to_string_pretty(&inventory)?);
        return Ok(());
    }

    println!("{} ({})", url, inventory.title.as_deref().unwrap_or("untitled"));
    println!("{} form(s)", inventory.forms);
    println!("Inputs:");
    for input in &inventory.inputs {
        println!(
            "  {:<40} type={} placeholder={}",
            input.suggested_locator,
            input.input_type.as_deref().unwrap_or("-"),
            input.placeholder.as_deref().unwrap_or("-")
        );
    }
    println!("Buttons:");
    for button in &inventory.buttons {
        println!(
            "  {:<40} {}",
            button.suggested_locator,
            button.text.as_deref().unwrap_or("-")
        );
    }
    println!("Links:");
    for link in &inventory.links {
        println!(
            "  {:<40} {}",
            link.href.as_deref().unwrap_or("-"),
            link.text.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

async fn close(session: Arc<BrowserSession<ChromeBrowser>>) {
    match Arc::try_unwrap(session) {
        Ok(session) => {
            if let Err(err) = session.close().await {
                warn!("Closing browser failed: {}", err);
            }
        }
        Err(_) => warn!("Browser session still in use, leaving it to drop"),
    }
}
