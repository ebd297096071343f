//! Scoped change notifications
//!
//! Subscribers register for one or more [`RefreshKey`]s and are only called
//! for those keys. Delivery is synchronous and in registration order. A
//! handler may subscribe, unsubscribe or send again while it runs.
//!
//! A dropped [`Subscription`] stops receiving notifications at once. Its entry
//! is removed right away when the registry is free, otherwise on the next
//! `subscribe` or `send`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

/// The screen region a state change is relevant to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshKey {
    TopView,
    BudgetStack,
    FundList,
    DayView,
}

type Handler = Rc<dyn Fn(RefreshKey)>;

struct Entry {
    keys: Vec<RefreshKey>,
    handler: Handler,
    live: Rc<Cell<bool>>,
}

#[derive(Default)]
struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    /// Take out cancelled entries; the caller drops them after releasing the borrow
    fn take_cancelled(&mut self) -> Vec<Entry> {
        let (live, cancelled): (Vec<Entry>, Vec<Entry>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| entry.live.get());
        self.entries = live;
        cancelled
    }
}

/// Shared subscriber registry; clones refer to the same registry
#[derive(Clone, Default)]
pub struct Dispatcher {
    registry: Rc<RefCell<Registry>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `handler` for every notification tagged with one of `keys`
    pub fn subscribe<F>(&self, keys: &[RefreshKey], handler: F) -> Subscription
    where
        F: Fn(RefreshKey) + 'static,
    {
        let live = Rc::new(Cell::new(true));
        let cancelled = {
            let mut registry = self.registry.borrow_mut();
            let cancelled = registry.take_cancelled();
            registry.entries.push(Entry {
                keys: keys.to_vec(),
                handler: Rc::new(handler),
                live: Rc::clone(&live),
            });
            cancelled
        };
        drop(cancelled);

        Subscription {
            registry: Rc::downgrade(&self.registry),
            live,
        }
    }

    /// Notify every subscriber of `key`
    pub fn send(&self, key: RefreshKey) {
        let cancelled = self.registry.borrow_mut().take_cancelled();
        drop(cancelled);

        // Snapshot first so handlers can touch the registry.
        let handlers: Vec<(Handler, Rc<Cell<bool>>)> = self
            .registry
            .borrow()
            .entries
            .iter()
            .filter(|entry| entry.keys.contains(&key))
            .map(|entry| (Rc::clone(&entry.handler), Rc::clone(&entry.live)))
            .collect();

        for (handler, live) in handlers {
            if live.get() {
                handler(key);
            }
        }
    }

    /// Number of subscriptions that have not been dropped
    pub fn subscriber_count(&self) -> usize {
        self.registry
            .borrow()
            .entries
            .iter()
            .filter(|entry| entry.live.get())
            .count()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Live registration; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes it immediately"]
pub struct Subscription {
    registry: Weak<RefCell<Registry>>,
    live: Rc<Cell<bool>>,
}

impl Subscription {
    /// Unsubscribe now
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.live.set(false);
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let cancelled = match registry.try_borrow_mut() {
            Ok(mut registry) => registry.take_cancelled(),
            Err(_) => {
                debug!("registry busy, subscription removal deferred");
                return;
            }
        };
        drop(cancelled);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("live", &self.live.get())
            .finish()
    }
}
