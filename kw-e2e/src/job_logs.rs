use std::sync::Arc;

use async_trait::async_trait;
use kube::Resource;
use kw_core::k8s::{
    ObjectClient,
    PodLogSource,
};
use kw_core::prelude::*;
use kw_wait::{
    DiagnosticHook,
    PodContainers,
    PodLogCollector,
    PollWaiter,
    Quantifier,
    WaitOutcome,
};
use tokio::time::Instant;
use tracing::*;

use crate::config::{
    ExecPodStepConfig,
    JobLogConfig,
};
use crate::steps::{
    exec_pod_spec,
    get_or_create_pod,
};

// The sync plugin mirrors each BuildConfig into a Jenkins job called `<namespace>-<bc>`, filed under
// a folder named after the namespace.  Jenkins accepts the pod's service account token as a bearer
// token.
pub fn job_log_command(jenkins_url: &str, namespace: &str, build_config: &str) -> String {
    format!(
        "curl -sS -H \"Authorization: Bearer $(cat {SERVICE_ACCOUNT_TOKEN_PATH})\" \
         {jenkins_url}/job/{namespace}/job/{namespace}-{build_config}/lastBuild/consoleText"
    )
}

// When the pipeline build fails, the interesting output lives in Jenkins rather than in any pod.
// This hook runs a curl pod against the job's console log, waits for it to finish and dumps what
// it printed.  Resources other than Builds are ignored.
pub struct JobLogCollector {
    pods: Arc<dyn ObjectClient<corev1::Pod>>,
    waiter: PollWaiter<corev1::Pod>,
    logs: PodLogCollector,
    build_config: String,
    config: JobLogConfig,
}

impl JobLogCollector {
    pub fn new(
        pods: Arc<dyn ObjectClient<corev1::Pod>>,
        logs: Arc<dyn PodLogSource>,
        build_config: &str,
        config: JobLogConfig,
    ) -> JobLogCollector {
        JobLogCollector {
            waiter: PollWaiter::with_interval(pods.clone(), config.poll_interval),
            pods,
            logs: PodLogCollector::new(logs),
            build_config: build_config.into(),
            config,
        }
    }

    fn pod_config(&self, namespace: &str) -> ExecPodStepConfig {
        ExecPodStepConfig {
            name: self.config.pod_name.clone(),
            command: job_log_command(&self.config.jenkins_url, namespace, &self.build_config),
            poll_interval: self.config.poll_interval,
            timeout: self.config.timeout,
            ..Default::default()
        }
    }
}

#[async_trait]
impl DiagnosticHook for JobLogCollector {
    #[instrument(skip_all, fields(resource = %rf))]
    async fn collect(&self, rf: &ResourceRef, _outcome: &WaitOutcome) {
        if rf.kind != Build::kind(&()) {
            return;
        }

        info!("fetching the Jenkins job log for build config {}", self.build_config);
        let pod = exec_pod_spec(&self.pod_config(&rf.namespace), &rf.namespace);
        let pod_rf = match get_or_create_pod(self.pods.as_ref(), &pod).await {
            Ok(pod_rf) => pod_rf,
            Err(err) => {
                warn!("could not start the job log pod: {err}");
                return;
            },
        };

        let predicate = PodContainers::terminated(Quantifier::Any);
        let deadline = Instant::now() + self.config.timeout;
        let outcome = self.waiter.wait_for_condition(&pod_rf, &predicate, deadline).await;
        if outcome != WaitOutcome::Success {
            warn!("job log pod {pod_rf} never finished: {outcome}");
            return;
        }

        self.logs
            .dump_container(&pod_rf.namespace, &pod_rf.name, EXEC_POD_CONTAINER_NAME)
            .await;
    }
}
