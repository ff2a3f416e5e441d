use std::sync::Arc;
use std::time::Duration;

use kw_core::k8s::ObjectClient;
use kw_core::prelude::*;
use tokio::time::{
    Instant,
    MissedTickBehavior,
    interval_at,
    sleep_until,
};
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::outcome::WaitOutcome;
use crate::predicate::TerminalPredicate;
use crate::watch_waiter::timed_out;

// The poll waiter is for objects where we need to look at per-member state (e.g., the containers
// of a pod) and an event per change would just be noise.  The first fetch happens immediately; a
// slow fetch pushes every later tick back rather than letting them pile up.
pub struct PollWaiter<K: Send + Sync + 'static> {
    client: Arc<dyn ObjectClient<K>>,
    interval: Duration,
}

impl<K: Send + Sync + 'static> PollWaiter<K> {
    pub fn new(client: Arc<dyn ObjectClient<K>>) -> PollWaiter<K> {
        PollWaiter::with_interval(client, DEFAULT_POLL_INTERVAL)
    }

    // Intervals below MIN_POLL_INTERVAL (including zero) are raised to it
    pub fn with_interval(client: Arc<dyn ObjectClient<K>>, interval: Duration) -> PollWaiter<K> {
        if interval < MIN_POLL_INTERVAL {
            warn!("poll interval {interval:?} is too short, using {MIN_POLL_INTERVAL:?}");
        }
        PollWaiter { client, interval: interval.max(MIN_POLL_INTERVAL) }
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
        let mut ticker = interval_at(started, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return WaitOutcome::Cancelled,
                _ = sleep_until(deadline) => return timed_out(started, deadline),
                _ = ticker.tick() => (),
            }

            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return WaitOutcome::Cancelled,
                _ = sleep_until(deadline) => return timed_out(started, deadline),
                res = self.client.get(rf) => res,
            };

            let obj = match fetched {
                Ok(obj) => obj,
                Err(err) => {
                    warn!("could not fetch {rf}, retrying on the next tick: {err}");
                    continue;
                },
            };

            if let Some(outcome) = predicate.evaluate(&obj).into_outcome() {
                info!("wait finished: {outcome}");
                return outcome;
            }
            match predicate.describe(&obj) {
                Some(desc) => info!("still waiting: {desc}"),
                None => debug!("still waiting"),
            }
        }
    }
}
