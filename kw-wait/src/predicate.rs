use std::collections::BTreeSet;

use kw_api::v1::{
    Build,
    BuildPhase,
};
use kw_core::k8s::HasConditions;
use kw_core::prelude::*;

use crate::outcome::Verdict;

// A TerminalPredicate decides, from an object's current state alone, whether the wait is over.
// Implementations must be pure: the waiters call `evaluate` once per observed snapshot and rely on
// getting the same answer for the same input.
pub trait TerminalPredicate<K>: Send + Sync {
    fn evaluate(&self, obj: &K) -> Verdict;

    fn on_deleted(&self, _obj: &K) -> Verdict {
        Verdict::failure(DELETED_REASON, "object was deleted before reaching a terminal state")
    }

    // Optional human-readable summary of a pending snapshot, for the logs
    fn describe(&self, _obj: &K) -> Option<String> {
        None
    }
}

impl<K, F> TerminalPredicate<K> for F
where
    F: Fn(&K) -> Verdict + Send + Sync,
{
    fn evaluate(&self, obj: &K) -> Verdict {
        self(obj)
    }
}

#[derive(Clone, Debug)]
pub struct ConditionPredicate {
    ready_type: String,
    failure_type: String,
    benign_reasons: BTreeSet<String>,
    tolerate_deletion: bool,
}

impl ConditionPredicate {
    pub fn new(ready_type: &str, failure_type: &str) -> ConditionPredicate {
        ConditionPredicate {
            ready_type: ready_type.into(),
            failure_type: failure_type.into(),
            benign_reasons: BTreeSet::from([ALREADY_EXISTS_REASON.into()]),
            tolerate_deletion: false,
        }
    }

    pub fn with_benign_reasons<I, S>(mut self, reasons: I) -> ConditionPredicate
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.benign_reasons = reasons.into_iter().map(Into::into).collect();
        self
    }

    pub fn tolerate_deletion(mut self) -> ConditionPredicate {
        self.tolerate_deletion = true;
        self
    }
}

impl<K: HasConditions> TerminalPredicate<K> for ConditionPredicate {
    fn evaluate(&self, obj: &K) -> Verdict {
        for cond in obj.conditions() {
            if !cond.is_true() {
                continue;
            }

            if cond.type_ == self.ready_type {
                return Verdict::Success;
            } else if cond.type_ == self.failure_type {
                let reason = cond.reason.as_deref().filter(|r| !r.is_empty()).unwrap_or(cond.type_.as_str());
                if self.benign_reasons.contains(reason) {
                    continue;
                }
                return Verdict::failure(reason, cond.message.as_deref().unwrap_or_default());
            }
        }
        Verdict::Pending
    }

    fn on_deleted(&self, _obj: &K) -> Verdict {
        if self.tolerate_deletion {
            Verdict::Pending
        } else {
            Verdict::failure(DELETED_REASON, "object was deleted before reaching a terminal state")
        }
    }

    fn describe(&self, obj: &K) -> Option<String> {
        let conds = obj.conditions();
        if conds.is_empty() {
            return None;
        }
        Some(
            conds
                .iter()
                .map(|c| format!("{}={}", c.type_, c.status))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BuildPhasePredicate;

impl TerminalPredicate<Build> for BuildPhasePredicate {
    fn evaluate(&self, build: &Build) -> Verdict {
        let Some(status) = build.status.as_ref() else {
            return Verdict::Pending;
        };

        let phase = status.phase();
        match phase {
            BuildPhase::Complete => Verdict::Success,
            BuildPhase::Failed | BuildPhase::Error | BuildPhase::Cancelled => {
                let reason = status
                    .reason
                    .clone()
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| phase.to_string());
                let message = status.message.as_ref().or(status.log_snippet.as_ref()).cloned().unwrap_or_default();
                Verdict::Failure { reason, message }
            },
            _ => Verdict::Pending,
        }
    }

    fn describe(&self, build: &Build) -> Option<String> {
        let phase = build.status.as_ref().map(|st| st.phase()).unwrap_or(BuildPhase::New);
        Some(format!("build phase {phase}"))
    }
}
