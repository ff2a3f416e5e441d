mod watch_waiter_test;

use std::sync::Arc;
use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};
use std::time::Duration;

use futures::{
    StreamExt,
    stream,
};
use kw_api::v1::*;
use kw_core::k8s::*;
use kw_core::prelude::*;
use kw_testutils::*;
use rstest::*;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

use super::*;

fn ti_ref() -> ResourceRef {
    ResourceRef::of::<TemplateInstance>(TEST_NAMESPACE, TEST_TEMPLATE_INSTANCE)
}

fn pod_ref() -> ResourceRef {
    ResourceRef::of::<corev1::Pod>(TEST_NAMESPACE, TEST_POD)
}

fn template_predicate() -> ConditionPredicate {
    ConditionPredicate::new(TEMPLATE_INSTANCE_READY, TEMPLATE_INSTANCE_INSTANTIATE_FAILURE)
}

fn pending_template_instance() -> TemplateInstance {
    template_instance_with_conditions(vec![Condition::new(TEMPLATE_INSTANCE_READY, CONDITION_FALSE)])
}

// Builds a subscription that delivers `events` and then stays open forever, along with a counter
// of how many times the subscription was stopped.
fn open_subscription<K: Send + 'static>(events: Vec<EventEnvelope<K>>) -> (Subscription<K>, Arc<AtomicUsize>) {
    let stops = Arc::new(AtomicUsize::new(0));
    let counter = stops.clone();
    let stream = stream::iter(events).chain(stream::pending()).boxed();
    let sub = Subscription::new(stream).with_stop_hook(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (sub, stops)
}
