//! Natural-language instructions turned into page interactions.
//!
//! Interpretation sits behind [`InstructionInterpreter`] so a model-backed
//! implementation can be injected; [`ScriptedInterpreter`] is the
//! deterministic one used by the demo flow and the tests.

use crate::core::BrowserTrait;
use crate::errors::{PageError, Result};
use crate::pages::BasePage;
use crate::selectors::Locator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// One concrete interaction an instruction expands to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Navigate { url: String },
    Fill { locator: String, text: String },
    Click { locator: String },
    /// Toggles a checkbox by clicking it.
    Check { locator: String },
    ExpectText { locator: String, contains: String },
}

/// What the interpreter knows about the page when it is asked.
#[derive(Debug, Clone)]
pub struct InstructionContext {
    pub session_id: String,
    pub current_url: Option<String>,
    pub variables: HashMap<String, serde_json::Value>,
    pub timeout_ms: u64,
}

impl InstructionContext {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            current_url: None,
            variables: HashMap::new(),
            timeout_ms: 30000,
        }
    }

    pub fn with_url(mut self, url: String) -> Self {
        self.current_url = Some(url);
        self
    }

    pub fn with_variable(mut self, key: String, value: serde_json::Value) -> Self {
        self.variables.insert(key, value);
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpretOutcome {
    pub instruction: String,
    pub steps: Vec<Step>,
    pub executed: usize,
    pub execution_time_ms: u64,
}

impl InterpretOutcome {
    pub fn planned(instruction: &str, steps: Vec<Step>) -> Self {
        Self {
            instruction: instruction.to_string(),
            steps,
            executed: 0,
            execution_time_ms: 0,
        }
    }

    pub fn with_execution(mut self, executed: usize, time_ms: u64) -> Self {
        self.executed = executed;
        self.execution_time_ms = time_ms;
        self
    }
}

#[async_trait]
pub trait InstructionInterpreter: Send + Sync {
    fn name(&self) -> &str;

    /// Plans the steps for `instruction`; nothing is executed here.
    async fn interpret(
        &self,
        instruction: &str,
        context: &InstructionContext,
    ) -> Result<InterpretOutcome>;
}

/// Maps known instructions (case and surrounding whitespace ignored) to
/// fixed step lists.
#[derive(Debug, Default)]
pub struct ScriptedInterpreter {
    scripts: HashMap<String, Vec<Step>>,
}

impl ScriptedInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(instruction: &str) -> String {
        instruction.trim().to_lowercase()
    }

    pub fn register(&mut self, instruction: &str, steps: Vec<Step>) {
        self.scripts.insert(Self::key(instruction), steps);
    }

    pub fn with(mut self, instruction: &str, steps: Vec<Step>) -> Self {
        self.register(instruction, steps);
        self
    }

    pub fn instructions(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.scripts.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Instructions for the local demo form: type and submit, tick the
    /// completion checkbox, clear the form.
    pub fn demo() -> Self {
        Self::new()
            .with(
                "Escribe 'Probando tests-ai' en el campo de entrada y haz clic en el botón Enviar",
                vec![
                    Step::Fill {
                        locator: "#input-field".to_string(),
                        text: "Probando tests-ai".to_string(),
                    },
                    Step::Click {
                        locator: "#submit-btn".to_string(),
                    },
                ],
            )
            .with(
                "Marca el checkbox 'Marcar como completado'",
                vec![Step::Check {
                    locator: "#complete-checkbox".to_string(),
                }],
            )
            .with(
                "Haz clic en el botón Limpiar",
                vec![Step::Click {
                    locator: "#clear-btn".to_string(),
                }],
            )
    }
}

#[async_trait]
impl InstructionInterpreter for ScriptedInterpreter {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn interpret(
        &self,
        instruction: &str,
        context: &InstructionContext,
    ) -> Result<InterpretOutcome> {
        debug!(
            "Interpreting {:?} for session {}",
            instruction, context.session_id
        );
        let steps = self
            .scripts
            .get(&Self::key(instruction))
            .cloned()
            .ok_or_else(|| {
                PageError::Interpretation(format!("no script for instruction {:?}", instruction))
            })?;
        Ok(InterpretOutcome::planned(instruction, steps))
    }
}

/// Interprets `instruction` against the page's current state and runs the
/// resulting steps in order, stopping at the first failure.
pub async fn run_instruction<B, I>(
    page: &BasePage<B>,
    interpreter: &I,
    instruction: &str,
) -> Result<InterpretOutcome>
where
    B: BrowserTrait,
    I: InstructionInterpreter + ?Sized,
{
    let session = page.session();
    let context = InstructionContext::new(session.session_id().to_string())
        .with_url(page.current_url().await?)
        .with_timeout(page.default_timeout().as_millis() as u64);

    let outcome = interpreter.interpret(instruction, &context).await?;
    info!(
        "{} planned {} step(s) for {:?}",
        interpreter.name(),
        outcome.steps.len(),
        instruction
    );

    let start_time = std::time::Instant::now();
    let mut executed = 0;
    for step in &outcome.steps {
        execute_step(page, step).await?;
        executed += 1;
    }
    let execution_time = start_time.elapsed().as_millis() as u64;

    Ok(outcome.with_execution(executed, execution_time))
}

pub async fn execute_step<B: BrowserTrait>(page: &BasePage<B>, step: &Step) -> Result<()> {
    debug!("Executing {:?}", step);
    match step {
        Step::Navigate { url } => page.goto(url).await,
        Step::Fill { locator, text } => page.fill_field(&Locator::anonymous(locator), text).await,
        Step::Click { locator } => page.click_element(&Locator::anonymous(locator)).await,
        Step::Check { locator } => page.check_element(&Locator::anonymous(locator)).await,
        Step::ExpectText { locator, contains } => {
            let text = page
                .element_text(&Locator::anonymous(locator))
                .await?
                .unwrap_or_default();
            if text.contains(contains.as_str()) {
                Ok(())
            } else {
                Err(PageError::Assertion(format!(
                    "expected {} to contain {:?}, found {:?}",
                    locator, contains, text
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::BrowserSession;
    use crate::core::Config;
    use crate::testing::{ClickEffect, MockBrowser, MockElement, MockSite};
    use std::sync::Arc;

    const DEMO: &str = "file:///demo/index.html";

    async fn demo_page() -> BasePage<MockBrowser> {
        let site = MockSite::new(DEMO).page(
            DEMO,
            vec![
                MockElement::input("#input-field"),
                MockElement::button("#submit-btn", "Enviar").on_click(ClickEffect::CopyValue {
                    from: "#input-field".to_string(),
                    to: "#result".to_string(),
                }),
                MockElement::checkbox("#complete-checkbox"),
                MockElement::button("#clear-btn", "Limpiar"),
                MockElement::new("#result"),
            ],
        );
        let mut config = Config::default();
        config.session.poll_interval_ms = 10;
        config.session.default_timeout_ms = 100;
        let session = BrowserSession::new(MockBrowser::new(site), config)
            .await
            .unwrap();
        BasePage::new(Arc::new(session))
    }

    #[tokio::test]
    async fn lookup_ignores_case_and_padding() {
        let interpreter = ScriptedInterpreter::demo();
        let context = InstructionContext::new("s".to_string());
        let outcome = interpreter
            .interpret("  HAZ CLIC EN EL BOTÓN LIMPIAR ", &context)
            .await
            .unwrap();
        assert_eq!(outcome.steps.len(), 1);
    }

    #[tokio::test]
    async fn unknown_instruction_is_an_interpretation_error() {
        let interpreter = ScriptedInterpreter::new();
        let err = interpreter
            .interpret("do something", &InstructionContext::new("s".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::Interpretation(_)));
    }

    #[tokio::test]
    async fn type_and_submit_fills_the_result() {
        let page = demo_page().await;
        let interpreter = ScriptedInterpreter::demo().with(
            "check the result",
            vec![Step::ExpectText {
                locator: "#result".to_string(),
                contains: "Probando tests-ai".to_string(),
            }],
        );

        let outcome = run_instruction(
            &page,
            &interpreter,
            "Escribe 'Probando tests-ai' en el campo de entrada y haz clic en el botón Enviar",
        )
        .await
        .unwrap();
        assert_eq!(outcome.executed, 2);

        run_instruction(&page, &interpreter, "check the result")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn failing_step_stops_the_run() {
        let page = demo_page().await;
        let interpreter = ScriptedInterpreter::new().with(
            "press missing",
            vec![
                Step::Click {
                    locator: "#missing".to_string(),
                },
                Step::Click {
                    locator: "#clear-btn".to_string(),
                },
            ],
        );

        assert!(run_instruction(&page, &interpreter, "press missing")
            .await
            .is_err());
        let clicks = page.session().tab().read().await.clicks.clone();
        assert!(clicks.is_empty());
    }

    #[tokio::test]
    async fn check_step_leaves_a_checked_box_alone() {
        let page = demo_page().await;
        let interpreter = ScriptedInterpreter::demo();
        let instruction = "Marca el checkbox 'Marcar como completado'";

        run_instruction(&page, &interpreter, instruction).await.unwrap();
        run_instruction(&page, &interpreter, instruction).await.unwrap();

        let clicks = page.session().tab().read().await.clicks.clone();
        assert_eq!(clicks, vec!["#complete-checkbox".to_string()]);
        let snapshot = page
            .session()
            .snapshot(&Locator::anonymous("#complete-checkbox"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.checked, Some(true));
    }

    #[tokio::test]
    async fn check_step_rejects_elements_without_checked_state() {
        let page = demo_page().await;
        let interpreter = ScriptedInterpreter::new().with(
            "check result",
            vec![Step::Check {
                locator: "#result".to_string(),
            }],
        );
        let err = run_instruction(&page, &interpreter, "check result")
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::Assertion(_)));
    }

    #[test]
    fn steps_serialize_with_action_tag() {
        let step = Step::Click {
            locator: "#go".to_string(),
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["action"], "click");
        assert_eq!(json["locator"], "#go");
    }
}
