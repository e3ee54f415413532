#![forbid(unsafe_code)]

//! Single-threaded publish/subscribe channel for tree notifications.
//!
//! # Design
//!
//! [`EventBus<E>`] keeps its subscribers in shared, reference-counted
//! storage (`Rc<RefCell<..>>`). Subscribers are held weakly; the strong
//! reference lives in the [`Subscription`] guard returned by
//! [`EventBus::subscribe`], so dropping the guard unsubscribes.
//!
//! # Failure Modes
//!
//! - **Re-entrant publish**: publishing from inside a subscriber callback
//!   does not recurse. The event is queued and delivered after the current
//!   delivery round, in publish order.
//! - **Panicking subscriber**: the panic propagates to the publisher. The
//!   delivery flag is reset on unwind, so later publishes still deliver.
//!   Events queued behind the one that panicked go out with the next publish.
//! - **Subscriber leak**: guards stored indefinitely keep their callbacks
//!   alive. Dead weak references are pruned lazily on publish.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. Each published event reaches every subscriber alive when its delivery
//!    round starts, exactly once.
//! 3. Events are delivered in publish order.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use tracing::debug_span;
use web_time::Instant;

type CallbackRc<E> = Rc<dyn Fn(&E)>;
type CallbackWeak<E> = Weak<dyn Fn(&E)>;

struct BusInner<E> {
    subscribers: Vec<CallbackWeak<E>>,
    pending: VecDeque<E>,
    delivering: bool,
    published: u64,
}

/// Cloneable handle to a shared subscriber list.
///
/// Clones share subscribers and the pending queue.
pub struct EventBus<E> {
    inner: Rc<RefCell<BusInner<E>>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventBus")
            .field("subscriber_count", &inner.subscribers.len())
            .field("pending", &inner.pending.len())
            .field("published", &inner.published)
            .finish()
    }
}

impl<E: 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> EventBus<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(BusInner {
                subscribers: Vec::new(),
                pending: VecDeque::new(),
                delivering: false,
                published: 0,
            })),
        }
    }

    /// Register a callback. Dropping the returned guard unsubscribes it.
    pub fn subscribe(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        let strong: CallbackRc<E> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Deliver `event` to every live subscriber.
    ///
    /// Safe to call from inside a subscriber callback; see the module docs.
    pub fn publish(&self, event: E) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.published += 1;
            inner.pending.push_back(event);
            if inner.delivering {
                return;
            }
            inner.delivering = true;
        }
        self.drain();
    }

    /// Total events published on this bus.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.inner.borrow().published
    }

    /// Registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    fn drain(&self) {
        let _reset = DeliveringReset(&*self.inner);
        let start = Instant::now();
        let span = debug_span!(
            "pagetree.notify",
            events = tracing::field::Empty,
            duration_us = tracing::field::Empty
        )
        .entered();
        let mut delivered = 0u64;

        loop {
            let (event, callbacks) = {
                let mut inner = self.inner.borrow_mut();
                let Some(event) = inner.pending.pop_front() else {
                    inner.delivering = false;
                    break;
                };
                inner.subscribers.retain(|w| w.strong_count() > 0);
                let callbacks: Vec<CallbackRc<E>> = inner
                    .subscribers
                    .iter()
                    .filter_map(Weak::upgrade)
                    .collect();
                (event, callbacks)
            };
            for cb in &callbacks {
                cb(&event);
            }
            delivered += 1;
        }

        span.record("events", delivered);
        span.record("duration_us", start.elapsed().as_micros() as u64);
    }
}

/// Clears `delivering` when a drain ends, including by unwinding.
struct DeliveringReset<'a, E>(&'a RefCell<BusInner<E>>);

impl<E> Drop for DeliveringReset<'_, E> {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.0.try_borrow_mut() {
            inner.delivering = false;
        }
    }
}

/// RAII guard for a bus subscriber.
///
/// Holds the only strong reference to the callback; once dropped, the
/// bus's weak entry fails to upgrade and is pruned on the next publish.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn delivers_in_registration_order() {
        let bus = EventBus::<u32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let first = {
            let log = Rc::clone(&log);
            bus.subscribe(move |e| log.borrow_mut().push(("first", *e)))
        };
        let second = {
            let log = Rc::clone(&log);
            bus.subscribe(move |e| log.borrow_mut().push(("second", *e)))
        };
        bus.publish(7);
        assert_eq!(*log.borrow(), vec![("first", 7), ("second", 7)]);
        drop((first, second));
    }

    #[test]
    fn dropped_guard_unsubscribes() {
        let bus = EventBus::<u32>::new();
        let count = Rc::new(Cell::new(0));
        let sub = {
            let count = Rc::clone(&count);
            bus.subscribe(move |_| count.set(count.get() + 1))
        };
        bus.publish(1);
        drop(sub);
        bus.publish(2);
        assert_eq!(count.get(), 1);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.published(), 2);
    }

    #[test]
    fn reentrant_publish_is_queued() {
        let bus = EventBus::<u32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let echo = {
            let handle = bus.clone();
            bus.subscribe(move |e| {
                if *e < 3 {
                    handle.publish(e + 1);
                }
            })
        };
        let record = {
            let log = Rc::clone(&log);
            bus.subscribe(move |e| log.borrow_mut().push(*e))
        };
        bus.publish(1);
        // The echo's publish lands after the second subscriber saw event 1.
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
        drop((echo, record));
    }

    #[test]
    fn panicking_subscriber_does_not_wedge_the_bus() {
        let bus = EventBus::<u32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let record = {
            let log = Rc::clone(&log);
            bus.subscribe(move |e| log.borrow_mut().push(*e))
        };
        let faulty = bus.subscribe(|e| assert_ne!(*e, 1, "subscriber failure"));

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| bus.publish(1)));
        assert!(outcome.is_err());

        bus.publish(2);
        drop(faulty);
        bus.publish(3);
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
        drop(record);
    }

    #[test]
    fn clones_share_subscribers() {
        let bus = EventBus::<&'static str>::new();
        let other = bus.clone();
        let hits = Rc::new(Cell::new(0));
        let _sub = {
            let hits = Rc::clone(&hits);
            other.subscribe(move |_| hits.set(hits.get() + 1))
        };
        bus.publish("ping");
        assert_eq!(hits.get(), 1);
    }
}
