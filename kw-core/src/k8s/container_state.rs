use crate::prelude::*;

// Per the Kubernetes spec at most one of `running`, `terminated`, or `waiting` is set on a
// ContainerState; a state with none of them set means the kubelet hasn't reported anything yet.
pub trait ContainerStateExt {
    fn is_terminated(&self) -> bool;
    fn describe(&self) -> String;
}

impl ContainerStateExt for corev1::ContainerState {
    fn is_terminated(&self) -> bool {
        self.terminated.is_some()
    }

    fn describe(&self) -> String {
        match self {
            corev1::ContainerState { terminated: Some(t), .. } => match t.reason.as_deref() {
                Some(reason) => format!("terminated ({reason}, exit code {})", t.exit_code),
                None => format!("terminated (exit code {})", t.exit_code),
            },
            corev1::ContainerState { waiting: Some(w), .. } => match w.reason.as_deref() {
                Some(reason) => format!("waiting ({reason})"),
                None => "waiting".into(),
            },
            corev1::ContainerState { running: Some(r), .. } => match r.started_at.as_ref() {
                Some(time) => format!("running since {}", time.0.to_rfc3339()),
                None => "running".into(),
            },
            _ => "unknown".into(),
        }
    }
}
