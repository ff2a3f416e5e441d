mod diagnostics;
mod members;
mod orchestrator;
mod outcome;
mod poll_waiter;
mod predicate;
mod watch_waiter;

pub use crate::diagnostics::{
    DiagnosticChain,
    DiagnosticHook,
    NoDiagnostics,
    PodLogCollector,
};
pub use crate::members::{
    PodContainers,
    Quantifier,
    combine,
};
pub use crate::orchestrator::{
    ProvisioningStep,
    StepError,
    StepOrchestrator,
    StepReport,
};
pub use crate::outcome::{
    Verdict,
    WaitOutcome,
};
pub use crate::poll_waiter::PollWaiter;
pub use crate::predicate::{
    BuildPhasePredicate,
    ConditionPredicate,
    TerminalPredicate,
};
pub use crate::watch_waiter::WatchWaiter;

#[cfg(test)]
mod tests;
