use kw_api::v1::{
    Build,
    Condition,
    TemplateInstance,
};

// Anything whose status carries a list of OpenShift-style conditions.  An object without a status
// (e.g., one the controller hasn't touched yet) just has no conditions.
pub trait HasConditions {
    fn conditions(&self) -> &[Condition];
}

impl HasConditions for TemplateInstance {
    fn conditions(&self) -> &[Condition] {
        self.status.as_ref().map(|st| st.conditions.as_slice()).unwrap_or_default()
    }
}

impl HasConditions for Build {
    fn conditions(&self) -> &[Condition] {
        self.status.as_ref().map(|st| st.conditions.as_slice()).unwrap_or_default()
    }
}
