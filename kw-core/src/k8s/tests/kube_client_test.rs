use std::time::Duration;

use assertables::*;
use futures::TryStreamExt;
use httpmock::Method::*;
use serde_json::json;

use super::*;

const TI_PATH: &str = "/apis/template.openshift.io/v1/namespaces/test-namespace/templateinstances";

fn ti_ref() -> ResourceRef {
    ResourceRef::of::<TemplateInstance>(TEST_NAMESPACE, TEST_TEMPLATE_INSTANCE)
}

#[rstest]
fn test_single_object_watch_params() {
    let wp = single_object_watch_params("foo", DEFAULT_WATCH_WINDOW);
    assert_eq!(wp.field_selector.as_deref(), Some("metadata.name=foo"));
    assert_eq!(wp.timeout, Some(290));
}

#[rstest]
#[case::too_short(Duration::from_millis(200), 1)]
#[case::in_range(Duration::from_secs(60), 60)]
#[case::too_long(Duration::from_secs(3600), 294)]
#[case::huge(Duration::from_secs(u64::MAX), 294)]
fn test_single_object_watch_params_clamps_window(#[case] window: Duration, #[case] expected: u32) {
    let wp = single_object_watch_params("foo", window);
    assert_eq!(wp.timeout, Some(expected));
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_get(test_template_instance: TemplateInstance) {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let ti = test_template_instance.clone();
    fake_apiserver
        .handle(move |when, then| {
            when.method(GET).path(format!("{TI_PATH}/{TEST_TEMPLATE_INSTANCE}"));
            then.json_body_obj(&ti);
        })
        .build();

    let objs = KubeObjectClient::<TemplateInstance>::new(client);
    let res = objs.get(&ti_ref()).await.unwrap();
    fake_apiserver.assert();
    assert_eq!(res.metadata.name, test_template_instance.metadata.name);
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_get_not_found() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver
        .handle_not_found(format!("{TI_PATH}/{TEST_TEMPLATE_INSTANCE}"))
        .build();

    let objs = KubeObjectClient::<TemplateInstance>::new(client);
    let err = objs.get(&ti_ref()).await.unwrap_err();
    fake_apiserver.assert();
    assert!(matches!(err.downcast_ref::<kube::Error>(), Some(kube::Error::Api(resp)) if resp.code == 404));
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_create(test_template_instance: TemplateInstance) {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let ti = test_template_instance.clone();
    fake_apiserver
        .handle(move |when, then| {
            when.method(POST).path(TI_PATH);
            then.status(201).json_body_obj(&ti);
        })
        .build();

    let objs = KubeObjectClient::<TemplateInstance>::new(client);
    let rf = objs.create(TEST_NAMESPACE, &test_template_instance).await.unwrap();
    fake_apiserver.assert();
    assert_eq!(rf, ti_ref());
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_subscribe_early_close_is_an_error(test_template_instance: TemplateInstance) {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver
        .handle_watch(TI_PATH.into(), FRESH_RESOURCE_VERSION, vec![watch_event("ADDED", &test_template_instance)])
        .build();

    let objs = KubeObjectClient::<TemplateInstance>::new(client);
    let mut sub = objs.subscribe(&ti_ref()).await.unwrap();
    assert!(matches!(sub.next().await, Some(EventEnvelope::Added(_))));
    let Some(EventEnvelope::Error(msg)) = sub.next().await else {
        panic!("expected an error envelope");
    };
    assert_contains!(msg, "closed by the apiserver");
    assert!(sub.next().await.is_none());
    fake_apiserver.assert();
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_subscribe_renews_expired_window(test_template_instance: TemplateInstance) {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let mut ready = ready_template_instance();
    ready.metadata.resource_version = Some("12346".into());
    fake_apiserver
        .handle_watch(TI_PATH.into(), FRESH_RESOURCE_VERSION, vec![watch_event("ADDED", &test_template_instance)])
        .handle_watch(TI_PATH.into(), TEST_RESOURCE_VERSION, vec![watch_event("MODIFIED", &ready)])
        .build();

    // A one-second window is always "expired" once the slack is added on, so the client reopens
    // from the last resource version it saw instead of reporting an error.
    let objs = KubeObjectClient::<TemplateInstance>::with_watch_window(client, Duration::from_secs(1));
    let mut sub = objs.subscribe(&ti_ref()).await.unwrap();
    assert!(matches!(sub.next().await, Some(EventEnvelope::Added(_))));
    let Some(EventEnvelope::Modified(obj)) = sub.next().await else {
        panic!("expected a modified envelope");
    };
    assert!(obj.conditions()[0].is_true());
    sub.stop();
    fake_apiserver.assert();
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_subscribe_watch_error_ends_stream() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver
        .handle_watch(TI_PATH.into(), FRESH_RESOURCE_VERSION, vec![watch_error(410, "Expired", "too old resource version")])
        .build();

    let objs = KubeObjectClient::<TemplateInstance>::new(client);
    let mut sub = objs.subscribe(&ti_ref()).await.unwrap();
    let Some(EventEnvelope::Error(msg)) = sub.next().await else {
        panic!("expected an error envelope");
    };
    assert_contains!(msg, "Expired (410)");
    assert!(sub.next().await.is_none());
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_list_pods(test_pod: corev1::Pod) {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let pod = test_pod.clone();
    fake_apiserver
        .handle(move |when, then| {
            when.method(GET).path("/api/v1/namespaces/test-namespace/pods");
            then.json_body(json!({"apiVersion": "v1", "kind": "PodList", "metadata": {}, "items": [pod]}));
        })
        .build();

    let logs = KubePodLogSource::new(client);
    let pods = logs.list_pods(TEST_NAMESPACE).await.unwrap();
    fake_apiserver.assert();
    assert_eq!(pods, vec![test_pod]);
}

#[rstest]
#[traced_test]
#[tokio::test]
async fn test_stream_logs() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver
        .handle(move |when, then| {
            when.method(GET)
                .path(format!("/api/v1/namespaces/test-namespace/pods/{TEST_POD}/log"))
                .query_param("container", TEST_CONTAINER);
            then.body("first line\nsecond line\n");
        })
        .build();

    let logs = KubePodLogSource::new(client);
    let lines: Vec<_> = logs
        .stream_logs(TEST_NAMESPACE, TEST_POD, TEST_CONTAINER)
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    fake_apiserver.assert();
    assert_eq!(lines, vec![bytes::Bytes::from("first line\n"), bytes::Bytes::from("second line\n")]);
}
