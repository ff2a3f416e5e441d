use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kw_core::k8s::ObjectClient;
use kw_core::prelude::*;
use kw_wait::{
    PodContainers,
    PollWaiter,
    ProvisioningStep,
    Quantifier,
    WaitOutcome,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::config::ExecPodStepConfig;

// A locked-down single-container pod that runs one shell command inside the scenario project and
// exits; it has to pass the restricted pod security admission profile.  Used for anything that has
// to reach Jenkins from inside the project: the exec pod step and the job log diagnostic.
pub fn exec_pod_spec(config: &ExecPodStepConfig, namespace: &str) -> corev1::Pod {
    corev1::Pod {
        metadata: metav1::ObjectMeta {
            name: Some(config.name.clone()),
            namespace: Some(namespace.into()),
            ..Default::default()
        },
        spec: Some(corev1::PodSpec {
            service_account_name: Some(config.service_account.clone()),
            containers: vec![corev1::Container {
                name: EXEC_POD_CONTAINER_NAME.into(),
                image: Some(config.image.clone()),
                image_pull_policy: Some("IfNotPresent".into()),
                command: Some(vec!["/bin/bash".into(), "-c".into(), config.command.clone()]),
                security_context: Some(corev1::SecurityContext {
                    allow_privilege_escalation: Some(false),
                    capabilities: Some(corev1::Capabilities {
                        drop: Some(vec!["ALL".into()]),
                        ..Default::default()
                    }),
                    run_as_non_root: Some(true),
                    run_as_user: Some(EXEC_POD_RUN_AS_USER),
                    seccomp_profile: Some(corev1::SeccompProfile {
                        type_: "RuntimeDefault".into(),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            host_network: Some(false),
            termination_grace_period_seconds: Some(0),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub async fn get_or_create_pod(pods: &dyn ObjectClient<corev1::Pod>, pod: &corev1::Pod) -> anyhow::Result<ResourceRef> {
    let rf = ResourceRef::from_obj(pod)?;
    match pods.get(&rf).await {
        Ok(_) => {
            info!("pod {rf} already exists, reusing it");
            return Ok(rf);
        },
        Err(err) => debug!("lookup of {rf} failed, creating it: {err}"),
    }

    pods.create(&rf.namespace, pod).await
}

pub struct ExecPodStep {
    pods: Arc<dyn ObjectClient<corev1::Pod>>,
    waiter: PollWaiter<corev1::Pod>,
    namespace: String,
    config: ExecPodStepConfig,
}

impl ExecPodStep {
    pub fn new(pods: Arc<dyn ObjectClient<corev1::Pod>>, namespace: &str, config: ExecPodStepConfig) -> ExecPodStep {
        ExecPodStep {
            waiter: PollWaiter::with_interval(pods.clone(), config.poll_interval),
            pods,
            namespace: namespace.into(),
            config,
        }
    }
}

#[async_trait]
impl ProvisioningStep for ExecPodStep {
    fn name(&self) -> &str {
        "exec-pod"
    }

    fn timeout(&self) -> Duration {
        self.config.timeout
    }

    async fn create(&self) -> anyhow::Result<ResourceRef> {
        get_or_create_pod(self.pods.as_ref(), &exec_pod_spec(&self.config, &self.namespace)).await
    }

    async fn wait(&self, rf: &ResourceRef, deadline: Instant, cancel: &CancellationToken) -> WaitOutcome {
        let predicate = PodContainers::terminated(Quantifier::Any);
        self.waiter.wait_cancellable(rf, &predicate, deadline, cancel).await
    }
}
