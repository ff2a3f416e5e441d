mod client;
mod conditions;
mod container_state;
mod kube_client;
mod resource_ref;
mod subscription;

pub use client::*;
pub use conditions::HasConditions;
pub use container_state::ContainerStateExt;
pub use kube_client::{
    KubeObjectClient,
    KubePodLogSource,
    single_object_watch_params,
};
pub use resource_ref::ResourceRef;
pub use subscription::{
    EventEnvelope,
    EnvelopeStream,
    Subscription,
};

use crate::errors::*;

err_impl! {KubernetesError,
    #[error("object has no name: {0}")]
    MissingName(String),

    #[error("object has no namespace: {0}")]
    MissingNamespace(String),
}

#[cfg(test)]
mod tests;
