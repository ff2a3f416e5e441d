mod build;
mod condition;
mod template;

pub use build::*;
pub use condition::*;
pub use template::*;

// Condition status values are strings in the OpenShift APIs, not booleans
pub const CONDITION_TRUE: &str = "True";
pub const CONDITION_FALSE: &str = "False";
pub const CONDITION_UNKNOWN: &str = "Unknown";
