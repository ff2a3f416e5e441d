use std::fmt::Debug;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::io::AsyncBufReadExt;
use futures::stream::{
    self,
    BoxStream,
};
use futures::{
    StreamExt,
    TryStreamExt,
};
use k8s_openapi::NamespaceResourceScope;
use kube::Resource;
use kube::api::{
    ListParams,
    LogParams,
    PostParams,
    WatchEvent,
    WatchParams,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::*;

use super::*;
use crate::prelude::*;

fn clamp_watch_window(window: Duration) -> Duration {
    window.clamp(MIN_WATCH_WINDOW, MAX_WATCH_WINDOW)
}

pub fn single_object_watch_params(name: &str, window: Duration) -> WatchParams {
    // Clamped to a few hundred seconds, so the conversion can't fail
    let secs = u32::try_from(clamp_watch_window(window).as_secs()).unwrap_or_default();
    WatchParams::default().fields(&format!("metadata.name={name}")).timeout(secs)
}

// Talks to a real apiserver for one namespaced resource type.  The watch side of this is slightly
// more involved than a plain `Api::watch`: the apiserver closes every watch once its timeout window
// is up, and a long-running wait (e.g., a twenty minute pipeline build) will outlive several of
// those windows.  A window that closes on schedule is quietly re-opened from the last resource
// version we saw; anything that closes early is reported to the waiter as an Error envelope.
pub struct KubeObjectClient<K> {
    client: kube::Client,
    window: Duration,
    _kind: PhantomData<fn() -> K>,
}

impl<K> KubeObjectClient<K> {
    pub fn new(client: kube::Client) -> KubeObjectClient<K> {
        KubeObjectClient::with_watch_window(client, DEFAULT_WATCH_WINDOW)
    }

    pub fn with_watch_window(client: kube::Client, window: Duration) -> KubeObjectClient<K> {
        KubeObjectClient { client, window: clamp_watch_window(window), _kind: PhantomData }
    }
}

impl<K> KubeObjectClient<K>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
{
    fn api(&self, namespace: &str) -> kube::Api<K> {
        kube::Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl<K> ObjectClient<K> for KubeObjectClient<K>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + DeserializeOwned
        + Serialize
        + Debug
        + Send
        + Sync
        + 'static,
{
    async fn get(&self, rf: &ResourceRef) -> anyhow::Result<K> {
        Ok(self.api(&rf.namespace).get(&rf.name).await?)
    }

    async fn subscribe(&self, rf: &ResourceRef) -> anyhow::Result<Subscription<K>> {
        let api = self.api(&rf.namespace);
        let wp = single_object_watch_params(&rf.name, self.window);
        let events = api.watch(&wp, FRESH_RESOURCE_VERSION).await?.boxed();
        debug!("opened watch for {rf}");

        let window = WatchWindow {
            api,
            wp,
            window: self.window,
            events,
            opened_at: Instant::now(),
            last_resource_version: None,
        };
        let label = rf.to_string();
        let envelopes = stream::unfold(Some(window), |maybe_window| async move {
            let mut window = maybe_window?;
            let envelope = window.next_envelope().await;
            match envelope {
                EventEnvelope::Error(_) => Some((envelope, None)),
                _ => Some((envelope, Some(window))),
            }
        })
        .boxed();

        Ok(Subscription::new(envelopes).with_stop_hook(move || debug!("closed watch for {label}")))
    }

    async fn create(&self, namespace: &str, obj: &K) -> anyhow::Result<ResourceRef> {
        let created = self.api(namespace).create(&PostParams::default(), obj).await?;
        ResourceRef::from_obj(&created)
    }
}

struct WatchWindow<K> {
    api: kube::Api<K>,
    wp: WatchParams,
    window: Duration,
    events: BoxStream<'static, kube::Result<WatchEvent<K>>>,
    opened_at: Instant,
    last_resource_version: Option<String>,
}

impl<K> WatchWindow<K>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + 'static,
{
    async fn next_envelope(&mut self) -> EventEnvelope<K> {
        loop {
            match self.events.next().await {
                Some(Ok(WatchEvent::Added(obj))) => {
                    self.remember(&obj);
                    return EventEnvelope::Added(obj);
                },
                Some(Ok(WatchEvent::Modified(obj))) => {
                    self.remember(&obj);
                    return EventEnvelope::Modified(obj);
                },
                Some(Ok(WatchEvent::Deleted(obj))) => {
                    self.remember(&obj);
                    return EventEnvelope::Deleted(obj);
                },
                Some(Ok(WatchEvent::Bookmark(bm))) => {
                    self.last_resource_version = Some(bm.metadata.resource_version);
                },
                Some(Ok(WatchEvent::Error(resp))) => {
                    return EventEnvelope::Error(format!("{} ({}): {}", resp.reason, resp.code, resp.message));
                },
                Some(Err(err)) => return EventEnvelope::Error(format!("watch stream error: {err}")),
                None => {
                    if self.opened_at.elapsed() + WATCH_WINDOW_SLACK < self.window {
                        return EventEnvelope::Error("watch stream closed by the apiserver".into());
                    }
                    if let Err(err) = self.reopen().await {
                        return EventEnvelope::Error(format!("could not renew watch: {err}"));
                    }
                },
            }
        }
    }

    fn remember(&mut self, obj: &K) {
        if let Some(rv) = obj.meta().resource_version.as_ref() {
            self.last_resource_version = Some(rv.clone());
        }
    }

    async fn reopen(&mut self) -> kube::Result<()> {
        let version = self.last_resource_version.as_deref().unwrap_or(FRESH_RESOURCE_VERSION);
        debug!("watch window expired, renewing from resource version {version}");
        self.events = self.api.watch(&self.wp, version).await?.boxed();
        self.opened_at = Instant::now();
        Ok(())
    }
}

pub struct KubePodLogSource {
    client: kube::Client,
}

impl KubePodLogSource {
    pub fn new(client: kube::Client) -> KubePodLogSource {
        KubePodLogSource { client }
    }
}

#[async_trait]
impl PodLogSource for KubePodLogSource {
    async fn list_pods(&self, namespace: &str) -> anyhow::Result<Vec<corev1::Pod>> {
        let pod_api: kube::Api<corev1::Pod> = kube::Api::namespaced(self.client.clone(), namespace);
        Ok(pod_api.list(&ListParams::default()).await?.items)
    }

    async fn stream_logs(&self, namespace: &str, pod: &str, container: &str) -> anyhow::Result<LogStream> {
        let pod_api: kube::Api<corev1::Pod> = kube::Api::namespaced(self.client.clone(), namespace);
        let lp = LogParams { container: Some(container.into()), ..Default::default() };
        let reader = pod_api.log_stream(pod, &lp).await?;
        Ok(reader
            .lines()
            .map_ok(|line| Bytes::from(format!("{line}\n")))
            .map_err(anyhow::Error::from)
            .boxed())
    }
}
