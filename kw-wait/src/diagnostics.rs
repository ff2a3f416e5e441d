use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use kw_core::k8s::PodLogSource;
use kw_core::prelude::*;
#[cfg(test)]
use mockall::automock;
use tracing::*;

use crate::outcome::WaitOutcome;

// Called by the orchestrator with the resource that failed (or timed out) and the outcome of its
// wait.  Collection is best-effort: a hook must never turn the original failure into something else.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DiagnosticHook: Send + Sync {
    async fn collect(&self, rf: &ResourceRef, outcome: &WaitOutcome);
}

pub struct NoDiagnostics;

#[async_trait]
impl DiagnosticHook for NoDiagnostics {
    async fn collect(&self, _rf: &ResourceRef, _outcome: &WaitOutcome) {}
}

// Runs each hook in turn.
pub struct DiagnosticChain {
    hooks: Vec<Arc<dyn DiagnosticHook>>,
}

impl DiagnosticChain {
    pub fn new(hooks: Vec<Arc<dyn DiagnosticHook>>) -> DiagnosticChain {
        DiagnosticChain { hooks }
    }
}

#[async_trait]
impl DiagnosticHook for DiagnosticChain {
    async fn collect(&self, rf: &ResourceRef, outcome: &WaitOutcome) {
        for hook in &self.hooks {
            hook.collect(rf, outcome).await;
        }
    }
}

pub struct PodLogCollector {
    logs: Arc<dyn PodLogSource>,
}

impl PodLogCollector {
    pub fn new(logs: Arc<dyn PodLogSource>) -> PodLogCollector {
        PodLogCollector { logs }
    }

    async fn dump_pod(&self, namespace: &str, pod: &corev1::Pod) {
        let pod_name = pod.name_any();
        let phase = pod.status.as_ref().and_then(|st| st.phase.as_deref()).unwrap_or("Unknown");
        info!("pod {namespace}/{pod_name} is in phase {phase}");

        let containers: Vec<String> = pod
            .spec
            .iter()
            .flat_map(|spec| spec.init_containers.iter().flatten().chain(spec.containers.iter()))
            .map(|c| c.name.clone())
            .collect();
        for container in &containers {
            self.dump_container(namespace, &pod_name, container).await;
        }
    }

    pub async fn dump_container(&self, namespace: &str, pod_name: &str, container: &str) {
        let mut lines = match self.logs.stream_logs(namespace, pod_name, container).await {
            Ok(lines) => lines,
            Err(err) => {
                warn!("could not get logs for {pod_name}/{container}: {err}");
                return;
            },
        };

        info!("---- logs for {pod_name}/{container} ----");
        while let Some(chunk) = lines.next().await {
            match chunk {
                Ok(bytes) => info!("[{pod_name}/{container}] {}", String::from_utf8_lossy(&bytes).trim_end()),
                Err(err) => {
                    warn!("log stream for {pod_name}/{container} broke: {err}");
                    break;
                },
            }
        }
        info!("---- end of logs for {pod_name}/{container} ----");
    }
}

#[async_trait]
impl DiagnosticHook for PodLogCollector {
    #[instrument(skip_all, fields(resource = %rf))]
    async fn collect(&self, rf: &ResourceRef, outcome: &WaitOutcome) {
        warn!("{rf} {outcome}; collecting pod logs from namespace {}", rf.namespace);
        let mut pods = match self.logs.list_pods(&rf.namespace).await {
            Ok(pods) => pods,
            Err(err) => {
                warn!("could not list pods in {}: {err}", rf.namespace);
                return;
            },
        };

        // Pods spawned on behalf of the failing resource (e.g., `<build>-build`) go first
        pods.sort_by_key(|pod| !pod.name_any().starts_with(&rf.name));
        for pod in &pods {
            self.dump_pod(&rf.namespace, pod).await;
        }
    }
}
