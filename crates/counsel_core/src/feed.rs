//! crates/counsel_core/src/feed.rs
//!
//! A small in-process change feed. Stores publish every successful write here;
//! views subscribe with a predicate and receive matching events as a `Stream`.
//!
//! A subscription is released when its handle is closed or dropped, whichever
//! comes first, so a view that exits early on an error still tears its listener down.

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};
use tracing::debug;

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

struct Subscriber<T> {
    id: u64,
    predicate: Predicate<T>,
    tx: UnboundedSender<T>,
}

struct Registry<T> {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<Subscriber<T>>>,
}

impl<T> Registry<T> {
    fn lock(&self) -> MutexGuard<'_, Vec<Subscriber<T>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: u64) {
        self.lock().retain(|s| s.id != id);
    }
}

/// Fan-out of change events to live subscribers.
pub struct ChangeFeed<T> {
    registry: Arc<Registry<T>>,
}

impl<T> Clone for ChangeFeed<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T: Clone + Send + 'static> Default for ChangeFeed<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> ChangeFeed<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(1),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Registers a listener for events accepted by `predicate`.
    /// Events published before this call are not delivered.
    pub fn subscribe<F>(&self, predicate: F) -> Subscription<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded();
        self.registry.lock().push(Subscriber {
            id,
            predicate: Box::new(predicate),
            tx,
        });
        debug!(subscription = id, "Change feed subscription opened");
        Subscription {
            id,
            rx,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Delivers `event` to every matching subscriber and returns how many received it.
    /// Subscribers whose receiving side is gone are pruned.
    pub fn publish(&self, event: &T) -> usize {
        let mut subscribers = self.registry.lock();
        let mut delivered = 0;
        subscribers.retain(|s| {
            if !(s.predicate)(event) {
                return !s.tx.is_closed();
            }
            match s.tx.unbounded_send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });
        delivered
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().len()
    }
}

/// Handle to a live subscription. Yields events as a `Stream`.
pub struct Subscription<T> {
    id: u64,
    rx: UnboundedReceiver<T>,
    registry: Weak<Registry<T>>,
}

impl<T> Subscription<T> {
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Releases the listener. Equivalent to dropping the handle.
    pub fn close(self) {
        drop(self);
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
            debug!(subscription = self.id, "Change feed subscription closed");
        }
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.rx.poll_next_unpin(cx)
    }
}
