use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kube::api::{
    ApiResource,
    DynamicObject,
    GroupVersionKind,
    PostParams,
};
use kw_api::v1::{
    LocalObjectReference,
    TEMPLATE_INSTANCE_INSTANTIATE_FAILURE,
    TEMPLATE_INSTANCE_READY,
    TemplateInstanceSpec,
};
use kw_core::k8s::ObjectClient;
use kw_core::prelude::*;
use kw_wait::{
    ConditionPredicate,
    ProvisioningStep,
    WaitOutcome,
    WatchWaiter,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::config::TemplateStepConfig;
use crate::project::is_already_exists;

fn template_resource() -> ApiResource {
    let gvk = GroupVersionKind::gvk(TEMPLATE_API_GROUP, "v1", TEMPLATE_KIND);
    ApiResource::from_gvk_with_plural(&gvk, TEMPLATE_PLURAL)
}

// Instantiates a shared template (jenkins-ephemeral by default) into the scenario project.  The
// template parameters are handed over in a Secret, which is how the template service broker expects
// to receive overrides.
pub struct TemplateStep {
    client: kube::Client,
    instances: Arc<dyn ObjectClient<TemplateInstance>>,
    waiter: WatchWaiter<TemplateInstance>,
    predicate: ConditionPredicate,
    namespace: String,
    config: TemplateStepConfig,
}

impl TemplateStep {
    pub fn new(
        client: kube::Client,
        instances: Arc<dyn ObjectClient<TemplateInstance>>,
        namespace: &str,
        config: TemplateStepConfig,
    ) -> TemplateStep {
        let predicate = ConditionPredicate::new(TEMPLATE_INSTANCE_READY, TEMPLATE_INSTANCE_INSTANTIATE_FAILURE)
            .with_benign_reasons(config.benign_reasons.clone());
        TemplateStep {
            client,
            waiter: WatchWaiter::new(instances.clone()),
            instances,
            predicate,
            namespace: namespace.into(),
            config,
        }
    }

    async fn create_parameters_secret(&self) -> EmptyResult {
        let secret = corev1::Secret {
            metadata: metav1::ObjectMeta {
                name: Some(self.config.parameters_secret.clone()),
                namespace: Some(self.namespace.clone()),
                ..Default::default()
            },
            string_data: Some(self.config.parameters.clone()),
            ..Default::default()
        };

        let secret_api: kube::Api<corev1::Secret> = kube::Api::namespaced(self.client.clone(), &self.namespace);
        match secret_api.create(&PostParams::default(), &secret).await {
            Ok(_) => info!("created parameters secret {}", self.config.parameters_secret),
            Err(err) if is_already_exists(&err) => {
                warn!("parameters secret {} already exists, reusing it", self.config.parameters_secret)
            },
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }
}

#[async_trait]
impl ProvisioningStep for TemplateStep {
    fn name(&self) -> &str {
        "template"
    }

    fn timeout(&self) -> Duration {
        self.config.timeout
    }

    async fn create(&self) -> anyhow::Result<ResourceRef> {
        let template_api: kube::Api<DynamicObject> =
            kube::Api::namespaced_with(self.client.clone(), &self.config.template_namespace, &template_resource());
        let template = template_api.get(&self.config.template_name).await?;
        info!("fetched template {}/{}", self.config.template_namespace, self.config.template_name);

        self.create_parameters_secret().await?;

        let ti = TemplateInstance::new(
            &self.config.instance_name,
            TemplateInstanceSpec {
                template: serde_json::to_value(&template)?,
                secret: Some(LocalObjectReference { name: self.config.parameters_secret.clone() }),
            },
        );
        self.instances.create(&self.namespace, &ti).await
    }

    async fn wait(&self, rf: &ResourceRef, deadline: Instant, cancel: &CancellationToken) -> WaitOutcome {
        self.waiter.wait_cancellable(rf, &self.predicate, deadline, cancel).await
    }
}
