use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kw_core::errors::*;
use kw_core::prelude::*;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::diagnostics::DiagnosticHook;
use crate::outcome::WaitOutcome;

// One unit of scenario work: create something in the cluster, then wait for it to settle.  The
// step owns the choice of waiter and predicate; the orchestrator only sees the outcome.
#[async_trait]
pub trait ProvisioningStep: Send + Sync {
    fn name(&self) -> &str;
    fn timeout(&self) -> Duration;

    async fn create(&self) -> anyhow::Result<ResourceRef>;
    async fn wait(&self, rf: &ResourceRef, deadline: Instant, cancel: &CancellationToken) -> WaitOutcome;
}

#[derive(Debug, Error)]
pub enum StepError {
    #[error("step {step} could not create its resource: {error:#}")]
    Creation { step: String, error: anyhow::Error },

    #[error("step {step} failed: {resource} reported {reason}: {message}")]
    Failed {
        step: String,
        resource: ResourceRef,
        reason: String,
        message: String,
    },

    #[error("step {step} timed out: {resource} was not ready after {after:?}")]
    TimedOut { step: String, resource: ResourceRef, after: Duration },

    #[error("step {step} was cancelled")]
    Cancelled { step: String },
}

#[derive(Clone, Debug)]
pub struct StepReport {
    pub step: String,
    pub resource: ResourceRef,
    pub elapsed: Duration,
}

pub struct StepOrchestrator {
    diagnostics: Arc<dyn DiagnosticHook>,
    cancel: CancellationToken,
}

impl StepOrchestrator {
    pub fn new(diagnostics: Arc<dyn DiagnosticHook>, cancel: CancellationToken) -> StepOrchestrator {
        StepOrchestrator { diagnostics, cancel }
    }

    #[instrument(skip_all, fields(step = step.name()))]
    pub async fn run_step(&self, step: &dyn ProvisioningStep) -> Result<StepReport, StepError> {
        let name = step.name().to_string();
        let start = Instant::now();

        info!("creating resources");
        let created = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(StepError::Cancelled { step: name }),
            res = step.create() => res,
        };
        let rf = created.map_err(|error| StepError::Creation { step: name.clone(), error })?;

        let deadline = Instant::now() + step.timeout();
        info!("waiting up to {:?} for {rf}", step.timeout());
        let outcome = step.wait(&rf, deadline, &self.cancel).await;

        if outcome.wants_diagnostics() {
            self.diagnostics.collect(&rf, &outcome).await;
        }

        match outcome {
            WaitOutcome::Success => {
                let elapsed = start.elapsed();
                info!("{rf} is ready after {elapsed:?}");
                Ok(StepReport { step: name, resource: rf, elapsed })
            },
            WaitOutcome::Failure { reason, message } => Err(StepError::Failed { step: name, resource: rf, reason, message }),
            WaitOutcome::Timeout { after } => Err(StepError::TimedOut { step: name, resource: rf, after }),
            WaitOutcome::Cancelled => Err(StepError::Cancelled { step: name }),
        }
    }

    // Steps run strictly in order; the first one that doesn't succeed ends the scenario.
    pub async fn run_all(&self, steps: &[Box<dyn ProvisioningStep>]) -> Result<Vec<StepReport>, StepError> {
        let mut reports = Vec::with_capacity(steps.len());
        for step in steps {
            reports.push(self.run_step(step.as_ref()).await?);
        }
        Ok(reports)
    }
}
