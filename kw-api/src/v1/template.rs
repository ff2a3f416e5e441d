use kube::CustomResource;
use schemars::JsonSchema;
use serde::{
    Deserialize,
    Serialize,
};

use super::Condition;

pub const TEMPLATE_INSTANCE_READY: &str = "Ready";
pub const TEMPLATE_INSTANCE_INSTANTIATE_FAILURE: &str = "InstantiateFailure";

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct LocalObjectReference {
    pub name: String,
}

// A TemplateInstance embeds the full Template object it was created from; we never look inside it,
// we just pass through whatever the apiserver handed us when we fetched the template.
#[derive(Clone, CustomResource, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(group = "template.openshift.io", version = "v1", kind = "TemplateInstance", namespaced)]
#[kube(status = "TemplateInstanceStatus")]
#[serde(rename_all = "camelCase")]
pub struct TemplateInstanceSpec {
    pub template: serde_json::Value,
    pub secret: Option<LocalObjectReference>,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInstanceStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}
