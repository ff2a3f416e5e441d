use schemars::JsonSchema;
use serde::{
    Deserialize,
    Serialize,
};

use super::CONDITION_TRUE;

// The OpenShift status condition shape.  TemplateInstance and Build both use this layout (plus some
// timestamp fields we don't care about, which are dropped on deserialization).
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    pub reason: Option<String>,
    pub message: Option<String>,
}

impl Condition {
    pub fn new(type_: &str, status: &str) -> Condition {
        Condition {
            type_: type_.into(),
            status: status.into(),
            ..Default::default()
        }
    }

    pub fn with_reason(mut self, reason: &str, message: &str) -> Condition {
        self.reason = Some(reason.into());
        self.message = Some(message.into());
        self
    }

    pub fn is_true(&self) -> bool {
        self.status == CONDITION_TRUE
    }
}
