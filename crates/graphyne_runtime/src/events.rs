//! Event streams feeding subscriptions.
//!
//! A source stream yields raw event payloads; the subscription layer
//! maps each one through execution. Streams are pull-based: `next`
//! resolves to `None` once the source is exhausted or closed.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tracing::warn;

/// Future returned by [`EventStream::next`].
pub type EventFuture<'a> = Pin<Box<dyn Future<Output = Option<Value>> + Send + 'a>>;

/// Future returned by [`EventStream::close`].
pub type CloseFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// A pull-based stream of event payloads.
pub trait EventStream: Send {
    /// Waits for the next event. `None` means the stream ended.
    fn next(&mut self) -> EventFuture<'_>;

    /// Stops the stream; subsequent `next` calls return `None`.
    fn close(&mut self) -> CloseFuture<'_>;
}

/// A boxed event stream.
pub type BoxEventStream = Box<dyn EventStream>;

/// Events drawn from a broadcast channel, as handed out by the
/// pub/sub layer. A slow consumer may lag; lagged events are dropped
/// with a warning and consumption continues.
pub struct BroadcastEvents {
    receiver: broadcast::Receiver<Value>,
    closed: bool,
}

impl BroadcastEvents {
    /// Wraps a broadcast receiver.
    #[must_use]
    pub fn new(receiver: broadcast::Receiver<Value>) -> Self {
        Self {
            receiver,
            closed: false,
        }
    }
}

impl EventStream for BroadcastEvents {
    fn next(&mut self) -> EventFuture<'_> {
        Box::pin(async move {
            if self.closed {
                return None;
            }
            loop {
                match self.receiver.recv().await {
                    Ok(event) => return Some(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "subscription receiver lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
    }

    fn close(&mut self) -> CloseFuture<'_> {
        Box::pin(async move {
            self.closed = true;
        })
    }
}

/// Events drawn from an mpsc channel, for sources that push to a
/// single subscriber.
pub struct ChannelEvents {
    receiver: mpsc::Receiver<Value>,
}

impl ChannelEvents {
    /// Wraps an mpsc receiver.
    #[must_use]
    pub fn new(receiver: mpsc::Receiver<Value>) -> Self {
        Self { receiver }
    }
}

impl EventStream for ChannelEvents {
    fn next(&mut self) -> EventFuture<'_> {
        Box::pin(async move { self.receiver.recv().await })
    }

    fn close(&mut self) -> CloseFuture<'_> {
        Box::pin(async move {
            self.receiver.close();
        })
    }
}

/// A fixed sequence of events, mainly for tests and demos.
pub struct IterEvents {
    items: VecDeque<Value>,
}

impl IterEvents {
    /// Creates a stream over the given events.
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = Value>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }
}

impl EventStream for IterEvents {
    fn next(&mut self) -> EventFuture<'_> {
        Box::pin(async move { self.items.pop_front() })
    }

    fn close(&mut self) -> CloseFuture<'_> {
        Box::pin(async move {
            self.items.clear();
        })
    }
}
