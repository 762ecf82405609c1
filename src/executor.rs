//! Dependent-step executor
//!
//! Runs a list of async steps strictly in order. A step may carry a skip
//! predicate that is evaluated right before it would run; the first failure
//! aborts everything after it.

use futures::future::BoxFuture;

use crate::error::Error;

type SkipFn<'a> = Box<dyn FnOnce() -> BoxFuture<'a, Result<bool, Error>> + Send + 'a>;
type RunFn<'a> = Box<dyn FnOnce() -> BoxFuture<'a, Result<(), Error>> + Send + 'a>;

struct Step<'a> {
    name: String,
    skip: Option<SkipFn<'a>>,
    run: RunFn<'a>,
}

/// What happened to one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Skipped,
    Failed(String),
    /// An earlier step failed
    NotRun,
}

/// Per-step outcomes plus the error that stopped the run, if any
#[derive(Debug)]
pub struct ExecutionReport {
    pub outcomes: Vec<(String, StepOutcome)>,
    pub error: Option<Error>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn outcome(&self, name: &str) -> Option<&StepOutcome> {
        self.outcomes
            .iter()
            .find(|(step, _)| step == name)
            .map(|(_, outcome)| outcome)
    }

    pub fn into_result(self) -> Result<(), Error> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct StepExecutor<'a> {
    steps: Vec<Step<'a>>,
}

impl<'a> StepExecutor<'a> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step that always runs
    pub fn step<R>(mut self, name: impl Into<String>, run: R) -> Self
    where
        R: FnOnce() -> BoxFuture<'a, Result<(), Error>> + Send + 'a,
    {
        self.steps.push(Step {
            name: name.into(),
            skip: None,
            run: Box::new(run),
        });
        self
    }

    /// Append a step that is skipped when `skip` resolves to `true`
    pub fn step_unless<S, R>(mut self, name: impl Into<String>, skip: S, run: R) -> Self
    where
        S: FnOnce() -> BoxFuture<'a, Result<bool, Error>> + Send + 'a,
        R: FnOnce() -> BoxFuture<'a, Result<(), Error>> + Send + 'a,
    {
        self.steps.push(Step {
            name: name.into(),
            skip: Some(Box::new(skip)),
            run: Box::new(run),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub async fn run(self) -> ExecutionReport {
        let mut outcomes = Vec::with_capacity(self.steps.len());
        let mut error = None;

        for step in self.steps {
            if error.is_some() {
                outcomes.push((step.name, StepOutcome::NotRun));
                continue;
            }

            let skipped = match step.skip {
                Some(skip) => skip().await,
                None => Ok(false),
            };

            let result = match skipped {
                Ok(true) => {
                    tracing::debug!("Step '{}' skipped", step.name);
                    outcomes.push((step.name, StepOutcome::Skipped));
                    continue;
                }
                Ok(false) => {
                    tracing::debug!("Step '{}' running", step.name);
                    (step.run)().await
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => outcomes.push((step.name, StepOutcome::Completed)),
                Err(e) => {
                    tracing::warn!("Step '{}' failed: {}", step.name, e);
                    outcomes.push((step.name, StepOutcome::Failed(e.reason())));
                    error = Some(e);
                }
            }
        }

        ExecutionReport { outcomes, error }
    }
}
