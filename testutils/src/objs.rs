use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use kw_api::v1::*;
use rstest::fixture;

use crate::constants::*;

fn test_meta(name: &str) -> metav1::ObjectMeta {
    metav1::ObjectMeta {
        namespace: Some(TEST_NAMESPACE.into()),
        name: Some(name.into()),
        resource_version: Some(TEST_RESOURCE_VERSION.into()),
        ..Default::default()
    }
}

#[fixture]
pub fn test_template_instance(#[default(TEST_TEMPLATE_INSTANCE)] name: &str) -> TemplateInstance {
    let mut ti = TemplateInstance::new(name, TemplateInstanceSpec::default());
    ti.metadata = test_meta(name);
    ti
}

pub fn template_instance_with_conditions(conditions: Vec<Condition>) -> TemplateInstance {
    let mut ti = test_template_instance(TEST_TEMPLATE_INSTANCE);
    ti.status = Some(TemplateInstanceStatus { conditions });
    ti
}

pub fn ready_template_instance() -> TemplateInstance {
    template_instance_with_conditions(vec![Condition::new(TEMPLATE_INSTANCE_READY, CONDITION_TRUE)])
}

pub fn failed_template_instance(reason: &str, message: &str) -> TemplateInstance {
    template_instance_with_conditions(vec![
        Condition::new(TEMPLATE_INSTANCE_INSTANTIATE_FAILURE, CONDITION_TRUE).with_reason(reason, message),
    ])
}

#[fixture]
pub fn test_build_config(#[default(TEST_BUILD_CONFIG)] name: &str) -> BuildConfig {
    let mut bc = BuildConfig::new(
        name,
        BuildConfigSpec {
            strategy: BuildStrategy::jenkins_pipeline("node { echo 'hello' }"),
            ..Default::default()
        },
    );
    bc.metadata = test_meta(name);
    bc
}

#[fixture]
pub fn test_build(#[default(TEST_BUILD)] name: &str) -> Build {
    let mut build = Build::new(name, BuildSpec::default());
    build.metadata = test_meta(name);
    build
}

pub fn build_with_phase(phase: &str) -> Build {
    let mut build = test_build(TEST_BUILD);
    build.status = Some(BuildStatus { phase: phase.into(), ..Default::default() });
    build
}

#[fixture]
pub fn test_pod(#[default(TEST_POD)] name: &str) -> corev1::Pod {
    corev1::Pod {
        metadata: test_meta(name),
        spec: Some(corev1::PodSpec::default()),
        status: Some(corev1::PodStatus { phase: Some("Pending".into()), ..Default::default() }),
    }
}

pub fn add_container_with_state(pod: &mut corev1::Pod, name: &str, state: corev1::ContainerState) {
    if let Some(spec) = pod.spec.as_mut() {
        spec.containers.push(corev1::Container { name: name.into(), ..Default::default() });
    }

    let status = pod.status.get_or_insert_with(Default::default);
    status.container_statuses.get_or_insert_with(Vec::new).push(corev1::ContainerStatus {
        name: name.into(),
        state: Some(state),
        ..Default::default()
    });
}

pub fn container_state_running() -> corev1::ContainerState {
    corev1::ContainerState {
        running: Some(corev1::ContainerStateRunning::default()),
        ..Default::default()
    }
}

pub fn container_state_waiting(reason: &str) -> corev1::ContainerState {
    corev1::ContainerState {
        waiting: Some(corev1::ContainerStateWaiting { reason: Some(reason.into()), ..Default::default() }),
        ..Default::default()
    }
}

pub fn container_state_terminated(exit_code: i32) -> corev1::ContainerState {
    corev1::ContainerState {
        terminated: Some(corev1::ContainerStateTerminated {
            exit_code,
            reason: Some(if exit_code == 0 { "Completed" } else { "Error" }.into()),
            ..Default::default()
        }),
        ..Default::default()
    }
}
