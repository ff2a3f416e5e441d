use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kube::api::PostParams;
use kw_api::v1::{
    BUILD_INSTANTIATE_SUBRESOURCE,
    BuildConfigSpec,
    BuildRequest,
    BuildStrategy,
};
use kw_core::k8s::ObjectClient;
use kw_core::prelude::*;
use kw_wait::{
    BuildPhasePredicate,
    ProvisioningStep,
    WaitOutcome,
    WatchWaiter,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::config::BuildStepConfig;
use crate::project::is_already_exists;

pub struct BuildStep {
    client: kube::Client,
    waiter: WatchWaiter<Build>,
    namespace: String,
    config: BuildStepConfig,
    jenkinsfile: String,
}

impl BuildStep {
    pub fn new(
        client: kube::Client,
        builds: Arc<dyn ObjectClient<Build>>,
        namespace: &str,
        config: BuildStepConfig,
        jenkinsfile: &str,
    ) -> BuildStep {
        BuildStep {
            client,
            waiter: WatchWaiter::new(builds),
            namespace: namespace.into(),
            config,
            jenkinsfile: jenkinsfile.into(),
        }
    }

    fn build_config(&self) -> BuildConfig {
        BuildConfig::new(
            &self.config.config_name,
            BuildConfigSpec {
                strategy: BuildStrategy::jenkins_pipeline(&self.jenkinsfile),
                ..Default::default()
            },
        )
    }
}

#[async_trait]
impl ProvisioningStep for BuildStep {
    fn name(&self) -> &str {
        "build"
    }

    fn timeout(&self) -> Duration {
        self.config.timeout
    }

    // Builds aren't created directly; we POST a BuildRequest to the BuildConfig's instantiate
    // subresource and the apiserver hands back the Build it started.
    async fn create(&self) -> anyhow::Result<ResourceRef> {
        let bc_name = &self.config.config_name;
        let bc_api: kube::Api<BuildConfig> = kube::Api::namespaced(self.client.clone(), &self.namespace);
        match bc_api.create(&PostParams::default(), &self.build_config()).await {
            Ok(_) => info!("created build config {bc_name}"),
            Err(err) if is_already_exists(&err) => warn!("build config {bc_name} already exists, reusing it"),
            Err(err) => return Err(err.into()),
        }

        let request = serde_json::to_vec(&BuildRequest::for_config(bc_name))?;
        let build: Build = bc_api
            .create_subresource(BUILD_INSTANTIATE_SUBRESOURCE, bc_name, &PostParams::default(), request)
            .await?;
        let rf = ResourceRef::from_obj(&build)?;
        info!("started build {rf}");
        Ok(rf)
    }

    async fn wait(&self, rf: &ResourceRef, deadline: Instant, cancel: &CancellationToken) -> WaitOutcome {
        self.waiter.wait_cancellable(rf, &BuildPhasePredicate, deadline, cancel).await
    }
}
