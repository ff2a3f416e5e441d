use std::sync::Arc;

use kw_core::k8s::{
    EventEnvelope,
    ObjectClient,
    Subscription,
};
use kw_core::prelude::*;
use tokio::time::{
    Instant,
    sleep_until,
};
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::outcome::{
    Verdict,
    WaitOutcome,
};
use crate::predicate::TerminalPredicate;

// How many times a single wait will tolerate its event stream breaking; the first break gets a
// fresh subscription, the second one ends the wait.
const MAX_STREAM_ERRORS: usize = 2;

enum Drained {
    Done(WaitOutcome),
    StreamError(String),
}

pub struct WatchWaiter<K: Send + Sync + 'static> {
    client: Arc<dyn ObjectClient<K>>,
}

impl<K: Send + Sync + 'static> WatchWaiter<K> {
    pub fn new(client: Arc<dyn ObjectClient<K>>) -> WatchWaiter<K> {
        WatchWaiter { client }
    }

    pub async fn wait_for_condition(
        &self,
        rf: &ResourceRef,
        predicate: &dyn TerminalPredicate<K>,
        deadline: Instant,
    ) -> WaitOutcome {
        self.wait_cancellable(rf, predicate, deadline, &CancellationToken::new()).await
    }

    #[instrument(skip_all, fields(resource = %rf))]
    pub async fn wait_cancellable(
        &self,
        rf: &ResourceRef,
        predicate: &dyn TerminalPredicate<K>,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> WaitOutcome {
        let started = Instant::now();
        let mut stream_errors = 0;

        loop {
            let opened = tokio::select! {
                biased;
                _ = cancel.cancelled() => return WaitOutcome::Cancelled,
                _ = sleep_until(deadline) => return timed_out(started, deadline),
                res = self.client.subscribe(rf) => res,
            };

            let msg = match opened {
                Ok(mut sub) => {
                    let drained = drain(&mut sub, predicate, started, deadline, cancel).await;
                    sub.stop();
                    match drained {
                        Drained::Done(outcome) => {
                            info!("wait finished: {outcome}");
                            return outcome;
                        },
                        Drained::StreamError(msg) => msg,
                    }
                },
                Err(err) => format!("could not open watch: {err}"),
            };

            stream_errors += 1;
            if stream_errors >= MAX_STREAM_ERRORS {
                warn!("watch failed again, giving up: {msg}");
                return WaitOutcome::failure(WATCH_ERROR_REASON, &msg);
            }
            warn!("watch failed, resubscribing: {msg}");
        }
    }
}

async fn drain<K>(
    sub: &mut Subscription<K>,
    predicate: &dyn TerminalPredicate<K>,
    started: Instant,
    deadline: Instant,
    cancel: &CancellationToken,
) -> Drained {
    loop {
        let envelope = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Drained::Done(WaitOutcome::Cancelled),
            _ = sleep_until(deadline) => return Drained::Done(timed_out(started, deadline)),
            maybe_envelope = sub.next() => maybe_envelope,
        };

        let (kind, verdict) = match envelope {
            Some(EventEnvelope::Added(obj)) => ("Added", evaluate(predicate, &obj)),
            Some(EventEnvelope::Modified(obj)) => ("Modified", evaluate(predicate, &obj)),
            Some(EventEnvelope::Deleted(obj)) => ("Deleted", predicate.on_deleted(&obj)),
            Some(EventEnvelope::Error(msg)) => return Drained::StreamError(msg),
            None => return Drained::StreamError("watch stream ended unexpectedly".into()),
        };

        if let Some(outcome) = verdict.into_outcome() {
            debug!("{kind} event is terminal");
            return Drained::Done(outcome);
        }
    }
}

fn evaluate<K>(predicate: &dyn TerminalPredicate<K>, obj: &K) -> Verdict {
    let verdict = predicate.evaluate(obj);
    if !verdict.is_terminal() {
        match predicate.describe(obj) {
            Some(desc) => info!("still waiting: {desc}"),
            None => debug!("still waiting"),
        }
    }
    verdict
}

pub(crate) fn timed_out(started: Instant, deadline: Instant) -> WaitOutcome {
    WaitOutcome::Timeout { after: deadline.saturating_duration_since(started) }
}
