//! In-process change notification channel.
//!
//! # Responsibility
//! - Track observers and the address each one watches.
//! - Deliver "changed at address" signals to matching observers.
//!
//! # Invariants
//! - Handles are unique for the lifetime of a notifier.
//! - An unsubscribed observer receives no later signals.
//! - Observers never run while the registry lock is held.

use crate::provider::address::PetAddress;
use log::debug;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Receives "something changed at this address" signals.
pub trait ChangeObserver: Send + Sync {
    fn on_change(&self, address: &PetAddress);
}

impl<F> ChangeObserver for F
where
    F: Fn(&PetAddress) + Send + Sync,
{
    fn on_change(&self, address: &PetAddress) {
        self(address)
    }
}

/// Opaque token returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionHandle(u64);

struct Subscriber {
    address: PetAddress,
    observer: Arc<dyn ChangeObserver>,
}

/// Publish/subscribe registry owned by a provider.
///
/// Observers run synchronously on the notifying thread, after the registry
/// lock is released, so an observer may (un)subscribe from its callback.
#[derive(Default)]
pub struct ChangeNotifier {
    next_id: AtomicU64,
    subscribers: Mutex<BTreeMap<SubscriptionHandle, Subscriber>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `observer` for changes visible at `address`.
    pub fn subscribe(
        &self,
        address: PetAddress,
        observer: Arc<dyn ChangeObserver>,
    ) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        debug!("event=subscribe module=notify status=ok address={address}");
        self.lock().insert(handle, Subscriber { address, observer });
        handle
    }

    /// Removes a subscription. Returns `false` when the handle is not active.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.lock().remove(&handle).is_some()
    }

    /// Broadcasts a change at `address`; returns how many observers ran.
    pub fn notify(&self, address: &PetAddress) -> usize {
        let observers = self
            .lock()
            .values()
            .filter(|subscriber| subscriber.address.observes(address))
            .map(|subscriber| Arc::clone(&subscriber.observer))
            .collect::<Vec<_>>();

        for observer in &observers {
            observer.on_change(address);
        }

        debug!(
            "event=notify module=notify status=ok address={address} delivered={}",
            observers.len()
        );
        observers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<SubscriptionHandle, Subscriber>> {
        // Observers never run under this lock; a poisoned map is still consistent.
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
