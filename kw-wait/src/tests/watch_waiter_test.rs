use kw_core::errors::anyhow;
use mockall::Sequence;

use super::*;

fn waiter_with(client: MockObjectClient<TemplateInstance>) -> WatchWaiter<TemplateInstance> {
    WatchWaiter::new(Arc::new(client))
}

#[rstest]
#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_first_success_wins() {
    let (sub, stops) = open_subscription(vec![
        EventEnvelope::Added(pending_template_instance()),
        EventEnvelope::Modified(ready_template_instance()),
        EventEnvelope::Modified(failed_template_instance("Boom", "should never be looked at")),
    ]);
    let mut client = MockObjectClient::new();
    client.expect_subscribe().times(1).return_once(move |_| Ok(sub));

    let evals = AtomicUsize::new(0);
    let inner = template_predicate();
    let predicate = |ti: &TemplateInstance| {
        evals.fetch_add(1, Ordering::SeqCst);
        inner.evaluate(ti)
    };

    let deadline = Instant::now() + Duration::from_secs(60);
    let outcome = waiter_with(client).wait_for_condition(&ti_ref(), &predicate, deadline).await;
    assert_eq!(outcome, WaitOutcome::Success);
    assert_eq!(evals.load(Ordering::SeqCst), 2);
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}

#[rstest]
#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_timeout_stops_subscription() {
    let (sub, stops) = open_subscription(vec![EventEnvelope::Added(pending_template_instance())]);
    let mut client = MockObjectClient::new();
    client.expect_subscribe().times(1).return_once(move |_| Ok(sub));

    let evals = AtomicUsize::new(0);
    let inner = template_predicate();
    let predicate = |ti: &TemplateInstance| {
        evals.fetch_add(1, Ordering::SeqCst);
        inner.evaluate(ti)
    };

    let start = Instant::now();
    let outcome = waiter_with(client)
        .wait_for_condition(&ti_ref(), &predicate, start + Duration::from_secs(10))
        .await;
    assert_eq!(outcome, WaitOutcome::Timeout { after: Duration::from_secs(10) });
    assert_eq!(start.elapsed(), Duration::from_secs(10));
    assert_eq!(evals.load(Ordering::SeqCst), 1);
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}

#[rstest]
#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_already_exists_keeps_waiting() {
    let (sub, _) = open_subscription(vec![
        EventEnvelope::Added(failed_template_instance(ALREADY_EXISTS_REASON, "secret already exists")),
        EventEnvelope::Modified(ready_template_instance()),
    ]);
    let mut client = MockObjectClient::new();
    client.expect_subscribe().times(1).return_once(move |_| Ok(sub));

    let deadline = Instant::now() + Duration::from_secs(60);
    let outcome = waiter_with(client)
        .wait_for_condition(&ti_ref(), &template_predicate(), deadline)
        .await;
    assert_eq!(outcome, WaitOutcome::Success);
}

#[rstest]
#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_failure_condition_is_reported_verbatim() {
    let (sub, stops) = open_subscription(vec![EventEnvelope::Modified(failed_template_instance(
        "TemplateInstantiationFailed",
        "quota exceeded",
    ))]);
    let mut client = MockObjectClient::new();
    client.expect_subscribe().times(1).return_once(move |_| Ok(sub));

    let deadline = Instant::now() + Duration::from_secs(60);
    let outcome = waiter_with(client)
        .wait_for_condition(&ti_ref(), &template_predicate(), deadline)
        .await;
    assert_eq!(outcome, WaitOutcome::failure("TemplateInstantiationFailed", "quota exceeded"));
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}

#[rstest]
#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_one_stream_error_resubscribes() {
    let (broken, broken_stops) = open_subscription(vec![EventEnvelope::Error("connection reset".into())]);
    let (healthy, _) = open_subscription(vec![EventEnvelope::Added(ready_template_instance())]);

    let mut seq = Sequence::new();
    let mut client = MockObjectClient::new();
    client
        .expect_subscribe()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(broken));
    client
        .expect_subscribe()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(healthy));

    let deadline = Instant::now() + Duration::from_secs(60);
    let outcome = waiter_with(client)
        .wait_for_condition(&ti_ref(), &template_predicate(), deadline)
        .await;
    assert_eq!(outcome, WaitOutcome::Success);
    assert_eq!(broken_stops.load(Ordering::SeqCst), 1);
    assert!(logs_contain("resubscribing"));
}

#[rstest]
#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_second_stream_error_is_a_failure() {
    let (first, _) = open_subscription(vec![EventEnvelope::Error("connection reset".into())]);
    let (second, _) = open_subscription(vec![EventEnvelope::Error("forbidden".into())]);

    // No third expectation: a third subscribe call panics the mock
    let mut seq = Sequence::new();
    let mut client = MockObjectClient::new();
    client
        .expect_subscribe()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(first));
    client
        .expect_subscribe()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(second));

    let deadline = Instant::now() + Duration::from_secs(60);
    let outcome = waiter_with(client)
        .wait_for_condition(&ti_ref(), &template_predicate(), deadline)
        .await;
    assert_eq!(outcome, WaitOutcome::failure(WATCH_ERROR_REASON, "forbidden"));
}

#[rstest]
#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_subscribe_failure_counts_as_stream_error() {
    let (healthy, _) = open_subscription(vec![EventEnvelope::Added(ready_template_instance())]);

    let mut seq = Sequence::new();
    let mut client = MockObjectClient::new();
    client
        .expect_subscribe()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Err(anyhow!("apiserver unavailable")));
    client
        .expect_subscribe()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(healthy));

    let deadline = Instant::now() + Duration::from_secs(60);
    let outcome = waiter_with(client)
        .wait_for_condition(&ti_ref(), &template_predicate(), deadline)
        .await;
    assert_eq!(outcome, WaitOutcome::Success);
    assert!(logs_contain("apiserver unavailable"));
}

#[rstest]
#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_closed_stream_counts_as_stream_error() {
    let mut client = MockObjectClient::new();
    client
        .expect_subscribe()
        .times(2)
        .returning(|_| Ok(Subscription::new(stream::iter(vec![]).boxed())));

    let deadline = Instant::now() + Duration::from_secs(60);
    let outcome = waiter_with(client)
        .wait_for_condition(&ti_ref(), &template_predicate(), deadline)
        .await;
    assert!(matches!(outcome, WaitOutcome::Failure { reason, .. } if reason == WATCH_ERROR_REASON));
}

#[rstest]
#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_deleted_before_ready() {
    let (sub, stops) = open_subscription(vec![
        EventEnvelope::Added(pending_template_instance()),
        EventEnvelope::Deleted(pending_template_instance()),
    ]);
    let mut client = MockObjectClient::new();
    client.expect_subscribe().times(1).return_once(move |_| Ok(sub));

    let deadline = Instant::now() + Duration::from_secs(60);
    let outcome = waiter_with(client)
        .wait_for_condition(&ti_ref(), &template_predicate(), deadline)
        .await;
    assert!(matches!(outcome, WaitOutcome::Failure { reason, .. } if reason == DELETED_REASON));
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}

#[rstest]
#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_deleted_tolerated() {
    let (sub, _) = open_subscription(vec![
        EventEnvelope::Deleted(pending_template_instance()),
        EventEnvelope::Added(ready_template_instance()),
    ]);
    let mut client = MockObjectClient::new();
    client.expect_subscribe().times(1).return_once(move |_| Ok(sub));

    let deadline = Instant::now() + Duration::from_secs(60);
    let predicate = template_predicate().tolerate_deletion();
    let outcome = waiter_with(client).wait_for_condition(&ti_ref(), &predicate, deadline).await;
    assert_eq!(outcome, WaitOutcome::Success);
}

#[rstest]
#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_cancelled_wait_stops_subscription() {
    let (sub, stops) = open_subscription(vec![EventEnvelope::Added(pending_template_instance())]);
    let mut client = MockObjectClient::new();
    client.expect_subscribe().times(1).return_once(move |_| Ok(sub));

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        canceller.cancel();
    });

    let deadline = Instant::now() + Duration::from_secs(60);
    let outcome = waiter_with(client)
        .wait_cancellable(&ti_ref(), &template_predicate(), deadline, &cancel)
        .await;
    assert_eq!(outcome, WaitOutcome::Cancelled);
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}

#[rstest]
#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_build_watch_reports_build_failure() {
    let mut failed = build_with_phase("Failed");
    if let Some(status) = failed.status.as_mut() {
        status.reason = Some("GenericBuildFailed".into());
        status.message = Some("Generic Build failure - check logs for details.".into());
    }
    let (sub, _) = open_subscription(vec![
        EventEnvelope::Added(build_with_phase("New")),
        EventEnvelope::Modified(build_with_phase("Running")),
        EventEnvelope::Modified(failed),
    ]);
    let mut client = MockObjectClient::<Build>::new();
    client.expect_subscribe().times(1).return_once(move |_| Ok(sub));

    let rf = ResourceRef::of::<Build>(TEST_NAMESPACE, TEST_BUILD);
    let deadline = Instant::now() + Duration::from_secs(60);
    let outcome = WatchWaiter::new(Arc::new(client))
        .wait_for_condition(&rf, &BuildPhasePredicate, deadline)
        .await;
    assert_eq!(
        outcome,
        WaitOutcome::failure("GenericBuildFailed", "Generic Build failure - check logs for details.")
    );
}

#[rstest]
#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_envelope_after_deadline_is_not_evaluated() {
    let stops = Arc::new(AtomicUsize::new(0));
    let counter = stops.clone();
    let late_ready = stream::once(async {
        tokio::time::sleep(Duration::from_secs(20)).await;
        EventEnvelope::Modified(ready_template_instance())
    });
    let stream = stream::iter([EventEnvelope::Added(pending_template_instance())])
        .chain(late_ready)
        .chain(stream::pending())
        .boxed();
    let sub = Subscription::new(stream).with_stop_hook(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let mut client = MockObjectClient::new();
    client.expect_subscribe().times(1).return_once(move |_| Ok(sub));

    let evals = AtomicUsize::new(0);
    let inner = template_predicate();
    let predicate = |ti: &TemplateInstance| {
        evals.fetch_add(1, Ordering::SeqCst);
        inner.evaluate(ti)
    };

    let start = Instant::now();
    let outcome = waiter_with(client)
        .wait_for_condition(&ti_ref(), &predicate, start + Duration::from_secs(10))
        .await;
    assert_eq!(outcome, WaitOutcome::Timeout { after: Duration::from_secs(10) });
    assert_eq!(evals.load(Ordering::SeqCst), 1);
    assert_eq!(stops.load(Ordering::SeqCst), 1);

    // Give the late envelope a chance to arrive; nothing should look at it
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(evals.load(Ordering::SeqCst), 1);
}
