use std::fmt;

use futures::StreamExt;
use futures::stream::BoxStream;

// One delivered unit from a watch stream.  Every variant except Error carries the full object as it
// was at the time of the event; there's no merging with previously-seen state.
#[derive(Clone, Debug, PartialEq)]
pub enum EventEnvelope<K> {
    Added(K),
    Modified(K),
    Deleted(K),
    Error(String),
}

impl<K> EventEnvelope<K> {
    pub fn kind_str(&self) -> &'static str {
        match self {
            EventEnvelope::Added(_) => "Added",
            EventEnvelope::Modified(_) => "Modified",
            EventEnvelope::Deleted(_) => "Deleted",
            EventEnvelope::Error(_) => "Error",
        }
    }
}

pub type EnvelopeStream<K> = BoxStream<'static, EventEnvelope<K>>;

type StopHook = Box<dyn FnOnce() + Send>;

// A Subscription owns the underlying event stream for exactly one wait.  The stream is released
// the first time `stop` is called or when the subscription is dropped, whichever comes first, so
// every exit path out of a wait (including the wait future itself being dropped) tears it down
// exactly once.
pub struct Subscription<K> {
    stream: Option<EnvelopeStream<K>>,
    on_stop: Option<StopHook>,
}

impl<K> Subscription<K> {
    pub fn new(stream: EnvelopeStream<K>) -> Subscription<K> {
        Subscription { stream: Some(stream), on_stop: None }
    }

    // The hook runs once, right after the stream has been dropped.
    pub fn with_stop_hook(mut self, hook: impl FnOnce() + Send + 'static) -> Subscription<K> {
        self.on_stop = Some(Box::new(hook));
        self
    }

    // Returns None once the subscription is stopped or the producer has closed the stream.
    pub async fn next(&mut self) -> Option<EventEnvelope<K>> {
        match self.stream.as_mut() {
            Some(stream) => stream.next().await,
            None => None,
        }
    }

    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            if let Some(hook) = self.on_stop.take() {
                hook();
            }
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stream.is_none()
    }
}

impl<K> Drop for Subscription<K> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<K> fmt::Debug for Subscription<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Subscription").field("stopped", &self.is_stopped()).finish()
    }
}
