use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
#[cfg(feature = "mock")]
use mockall::automock;

use super::{
    ResourceRef,
    Subscription,
};
use crate::prelude::*;

pub type LogStream = BoxStream<'static, anyhow::Result<Bytes>>;

// The narrow view of the cluster that the waiters need.  Everything that talks to an apiserver on
// behalf of a wait goes through here, so the waiters themselves never touch kube::Api directly.
#[cfg_attr(feature = "mock", automock)]
#[async_trait]
pub trait ObjectClient<K: Send + Sync + 'static>: Send + Sync {
    async fn get(&self, rf: &ResourceRef) -> anyhow::Result<K>;
    async fn subscribe(&self, rf: &ResourceRef) -> anyhow::Result<Subscription<K>>;
    async fn create(&self, namespace: &str, obj: &K) -> anyhow::Result<ResourceRef>;
}

// Only used when collecting diagnostics after a failed or timed-out wait.
#[cfg_attr(feature = "mock", automock)]
#[async_trait]
pub trait PodLogSource: Send + Sync {
    async fn list_pods(&self, namespace: &str) -> anyhow::Result<Vec<corev1::Pod>>;
    async fn stream_logs(&self, namespace: &str, pod: &str, container: &str) -> anyhow::Result<LogStream>;
}
