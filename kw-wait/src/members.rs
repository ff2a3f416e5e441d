use kw_core::k8s::ContainerStateExt;
use kw_core::prelude::*;

use crate::outcome::Verdict;
use crate::predicate::TerminalPredicate;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Quantifier {
    Any,
    All,
}

// Combine per-member verdicts into a single verdict for the whole object.  An object with no
// members yet (e.g., a pod the kubelet hasn't reported on) is always Pending.
pub fn combine(quantifier: Quantifier, verdicts: impl IntoIterator<Item = Verdict>) -> Verdict {
    let verdicts: Vec<_> = verdicts.into_iter().collect();
    if verdicts.is_empty() {
        return Verdict::Pending;
    }

    let first_failure = verdicts.iter().find(|v| matches!(v, Verdict::Failure { .. })).cloned();
    match quantifier {
        Quantifier::Any => {
            if verdicts.contains(&Verdict::Success) {
                Verdict::Success
            } else {
                first_failure.unwrap_or(Verdict::Pending)
            }
        },
        Quantifier::All => {
            if let Some(failure) = first_failure {
                failure
            } else if verdicts.iter().all(|v| *v == Verdict::Success) {
                Verdict::Success
            } else {
                Verdict::Pending
            }
        },
    }
}

// Member predicate "this container has terminated", applied across a pod's containers.
#[derive(Clone, Copy, Debug)]
pub struct PodContainers {
    quantifier: Quantifier,
}

impl PodContainers {
    pub fn terminated(quantifier: Quantifier) -> PodContainers {
        PodContainers { quantifier }
    }
}

fn container_statuses(pod: &corev1::Pod) -> &[corev1::ContainerStatus] {
    pod.status
        .as_ref()
        .and_then(|st| st.container_statuses.as_deref())
        .unwrap_or_default()
}

impl TerminalPredicate<corev1::Pod> for PodContainers {
    fn evaluate(&self, pod: &corev1::Pod) -> Verdict {
        let verdicts = container_statuses(pod).iter().map(|cs| match cs.state.as_ref() {
            Some(state) if state.is_terminated() => Verdict::Success,
            _ => Verdict::Pending,
        });
        combine(self.quantifier, verdicts)
    }

    fn describe(&self, pod: &corev1::Pod) -> Option<String> {
        let statuses = container_statuses(pod);
        if statuses.is_empty() {
            let phase = pod.status.as_ref().and_then(|st| st.phase.as_deref()).unwrap_or("Unknown");
            return Some(format!("pod phase {phase}, no container statuses yet"));
        }

        Some(
            statuses
                .iter()
                .map(|cs| {
                    let state = cs.state.as_ref().map(|s| s.describe()).unwrap_or_else(|| "unknown".into());
                    format!("{}: {state}", cs.name)
                })
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}
