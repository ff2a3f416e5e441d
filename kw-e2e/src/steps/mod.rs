mod build;
mod exec_pod;
mod template;

use std::sync::Arc;

pub use build::BuildStep;
pub use exec_pod::{
    ExecPodStep,
    exec_pod_spec,
    get_or_create_pod,
};
use kw_core::k8s::KubeObjectClient;
use kw_core::prelude::*;
use kw_wait::ProvisioningStep;
pub use template::TemplateStep;

use crate::config::ScenarioConfig;

// The scenario, in order: bring Jenkins up from its template, run the pipeline build against it,
// and (optionally) run a one-shot pod in the same project.
pub fn scenario_steps(client: kube::Client, config: &ScenarioConfig, jenkinsfile: &str) -> Vec<Box<dyn ProvisioningStep>> {
    let mut steps: Vec<Box<dyn ProvisioningStep>> = vec![
        Box::new(TemplateStep::new(
            client.clone(),
            Arc::new(KubeObjectClient::<TemplateInstance>::new(client.clone())),
            &config.namespace,
            config.template.clone(),
        )),
        Box::new(BuildStep::new(
            client.clone(),
            Arc::new(KubeObjectClient::<Build>::new(client.clone())),
            &config.namespace,
            config.build.clone(),
            jenkinsfile,
        )),
    ];

    if let Some(exec_pod) = config.exec_pod.as_ref() {
        steps.push(Box::new(ExecPodStep::new(
            Arc::new(KubeObjectClient::<corev1::Pod>::new(client)),
            &config.namespace,
            exec_pod.clone(),
        )));
    }
    steps
}
