use std::fmt;

use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{
    Deserialize,
    Serialize,
};

use super::Condition;

pub const JENKINS_PIPELINE_STRATEGY_TYPE: &str = "JenkinsPipeline";
pub const BUILD_REQUEST_KIND: &str = "BuildRequest";
pub const BUILD_INSTANTIATE_SUBRESOURCE: &str = "instantiate";

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JenkinsPipelineBuildStrategy {
    pub jenkinsfile: Option<String>,
    pub jenkinsfile_path: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStrategy {
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub jenkins_pipeline_strategy: Option<JenkinsPipelineBuildStrategy>,
}

impl BuildStrategy {
    pub fn jenkins_pipeline(jenkinsfile: &str) -> BuildStrategy {
        BuildStrategy {
            type_: Some(JENKINS_PIPELINE_STRATEGY_TYPE.into()),
            jenkins_pipeline_strategy: Some(JenkinsPipelineBuildStrategy {
                jenkinsfile: Some(jenkinsfile.into()),
                ..Default::default()
            }),
        }
    }
}

#[derive(Clone, CustomResource, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(group = "build.openshift.io", version = "v1", kind = "BuildConfig", namespaced)]
#[kube(shortname = "bc")]
#[serde(rename_all = "camelCase")]
pub struct BuildConfigSpec {
    #[serde(default)]
    pub triggers: Vec<serde_json::Value>,
    pub strategy: BuildStrategy,
}

#[derive(Clone, CustomResource, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(group = "build.openshift.io", version = "v1", kind = "Build", namespaced)]
#[kube(status = "BuildStatus")]
#[serde(rename_all = "camelCase")]
pub struct BuildSpec {
    #[serde(default)]
    pub strategy: BuildStrategy,
}

// The build phase is kept as a raw string on the wire so that phases added by newer OpenShift
// versions still deserialize; use BuildStatus::phase() to get the parsed value.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStatus {
    #[serde(default)]
    pub phase: String,
    pub reason: Option<String>,
    pub message: Option<String>,
    pub log_snippet: Option<String>,

    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl BuildStatus {
    pub fn phase(&self) -> BuildPhase {
        BuildPhase::from(self.phase.as_str())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BuildPhase {
    New,
    Pending,
    Running,
    Complete,
    Failed,
    Error,
    Cancelled,
    Unknown(String),
}

impl From<&str> for BuildPhase {
    fn from(phase: &str) -> BuildPhase {
        match phase {
            "" | "New" => BuildPhase::New,
            "Pending" => BuildPhase::Pending,
            "Running" => BuildPhase::Running,
            "Complete" => BuildPhase::Complete,
            "Failed" => BuildPhase::Failed,
            "Error" => BuildPhase::Error,
            "Cancelled" => BuildPhase::Cancelled,
            other => BuildPhase::Unknown(other.into()),
        }
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BuildPhase::Unknown(phase) => write!(f, "{phase}"),
            phase => write!(f, "{phase:?}"),
        }
    }
}

// BuildRequest isn't a standalone resource; it's only ever POSTed to the `instantiate` subresource
// of a BuildConfig, so it doesn't get the CustomResource treatment.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    pub api_version: String,
    pub kind: String,
    pub metadata: metav1::ObjectMeta,
}

impl BuildRequest {
    pub fn for_config(name: &str) -> BuildRequest {
        BuildRequest {
            api_version: "build.openshift.io/v1".into(),
            kind: BUILD_REQUEST_KIND.into(),
            metadata: metav1::ObjectMeta { name: Some(name.into()), ..Default::default() },
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    #[rstest]
    #[case::empty("", BuildPhase::New)]
    #[case::complete("Complete", BuildPhase::Complete)]
    #[case::cancelled("Cancelled", BuildPhase::Cancelled)]
    #[case::unknown("Exploded", BuildPhase::Unknown("Exploded".into()))]
    fn test_build_phase_from_str(#[case] raw: &str, #[case] expected: BuildPhase) {
        let status = BuildStatus { phase: raw.into(), ..Default::default() };
        assert_eq!(status.phase(), expected);
    }

    #[rstest]
    fn test_build_status_deserialize_ignores_extra_fields() {
        let status: BuildStatus = serde_json::from_value(serde_json::json!({
            "phase": "Failed",
            "reason": "GenericBuildFailed",
            "message": "Generic Build failure - check logs for details.",
            "startTimestamp": "2024-01-01T00:00:00Z",
            "duration": 1234,
        }))
        .unwrap();
        assert_eq!(status.phase(), BuildPhase::Failed);
        assert_eq!(status.reason.as_deref(), Some("GenericBuildFailed"));
    }

    #[rstest]
    fn test_build_request_serialize() {
        let req = serde_json::to_value(BuildRequest::for_config("sample")).unwrap();
        assert_eq!(req["kind"], "BuildRequest");
        assert_eq!(req["apiVersion"], "build.openshift.io/v1");
        assert_eq!(req["metadata"]["name"], "sample");
    }
}
