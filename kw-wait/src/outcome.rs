use std::fmt;
use std::time::Duration;

// What a predicate says about a single observed snapshot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Verdict {
    Pending,
    Success,
    Failure { reason: String, message: String },
}

impl Verdict {
    pub fn failure(reason: &str, message: &str) -> Verdict {
        Verdict::Failure { reason: reason.into(), message: message.into() }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Verdict::Pending)
    }

    pub fn into_outcome(self) -> Option<WaitOutcome> {
        match self {
            Verdict::Pending => None,
            Verdict::Success => Some(WaitOutcome::Success),
            Verdict::Failure { reason, message } => Some(WaitOutcome::Failure { reason, message }),
        }
    }
}

// The single answer produced by one wait.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WaitOutcome {
    Success,
    Failure { reason: String, message: String },
    Timeout { after: Duration },
    Cancelled,
}

impl WaitOutcome {
    pub fn failure(reason: &str, message: &str) -> WaitOutcome {
        WaitOutcome::Failure { reason: reason.into(), message: message.into() }
    }

    // Cancellation is the caller's doing, so there's nothing worth collecting diagnostics for.
    pub fn wants_diagnostics(&self) -> bool {
        matches!(self, WaitOutcome::Failure { .. } | WaitOutcome::Timeout { .. })
    }
}

impl fmt::Display for WaitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WaitOutcome::Success => write!(f, "success"),
            WaitOutcome::Failure { reason, message } if message.is_empty() => write!(f, "failed: {reason}"),
            WaitOutcome::Failure { reason, message } => write!(f, "failed: {reason}: {message}"),
            WaitOutcome::Timeout { after } => write!(f, "timed out after {after:?}"),
            WaitOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}
