//! Keyed Cache Store
//!
//! Owned key-value registry backing every view's local state. Handlers and
//! mutations receive a store handle by injection; nothing in the crate
//! holds a global. Slots carry a version counter and a stale flag, so
//! invalidation works as a reload trigger: bump, notify, let the owner
//! refetch. Values are replaced through the setters, never mutated in
//! place by callers.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

/// Cache key: a list of segments, e.g. `["chat-messages", chat_id]`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(Vec<String>);

impl CacheKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(":"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreEventKind {
    Updated,
    Invalidated,
    Removed,
}

/// Notification sent to store subscribers on every slot change
#[derive(Clone, Debug)]
pub struct StoreEvent {
    pub key: CacheKey,
    pub version: u64,
    pub kind: StoreEventKind,
}

struct Slot {
    value: Box<dyn Any + Send + Sync>,
    version: u64,
    stale: bool,
}

struct Inner {
    slots: Mutex<HashMap<CacheKey, Slot>>,
    events: broadcast::Sender<StoreEvent>,
}

/// Cloneable handle to one cache registry
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<Inner>,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(HashMap::new()),
                events,
            }),
        }
    }

    /// Snapshot of the value under `key`, if present and of type `T`
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &CacheKey) -> Option<T> {
        let slots = self.inner.slots.lock().expect("store lock poisoned");
        slots
            .get(key)
            .and_then(|slot| slot.value.downcast_ref::<T>())
            .cloned()
    }

    /// Replace (or create) the value under `key`
    pub fn set<T: Send + Sync + 'static>(&self, key: &CacheKey, value: T) {
        let version = {
            let mut slots = self.inner.slots.lock().expect("store lock poisoned");
            let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
                value: Box::new(()),
                version: 0,
                stale: false,
            });
            slot.value = Box::new(value);
            slot.version += 1;
            slot.stale = false;
            slot.version
        };
        self.notify(key, version, StoreEventKind::Updated);
    }

    /// Update the value under `key` through a closure. Returns false when
    /// the slot is missing or holds another type.
    pub fn update<T, F>(&self, key: &CacheKey, f: F) -> bool
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(&mut T),
    {
        let version = {
            let mut slots = self.inner.slots.lock().expect("store lock poisoned");
            let Some(slot) = slots.get_mut(key) else {
                return false;
            };
            let Some(value) = slot.value.downcast_mut::<T>() else {
                log::warn!("cache update for {key} with mismatched type");
                return false;
            };
            f(value);
            slot.version += 1;
            slot.version
        };
        self.notify(key, version, StoreEventKind::Updated);
        true
    }

    /// Reconcile the value under `key` in place, seeding a missing slot
    /// with `T::default()`. The closure runs under the slot lock and
    /// reports whether it changed the value; untouched slots are neither
    /// bumped nor notified.
    pub fn modify<T, F>(&self, key: &CacheKey, f: F) -> bool
    where
        T: Default + Send + Sync + 'static,
        F: FnOnce(&mut T) -> bool,
    {
        let version = {
            let mut slots = self.inner.slots.lock().expect("store lock poisoned");
            let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
                value: Box::new(T::default()),
                version: 0,
                stale: false,
            });
            let Some(value) = slot.value.downcast_mut::<T>() else {
                log::warn!("cache modify for {key} with mismatched type");
                return false;
            };
            if !f(value) {
                return false;
            }
            slot.version += 1;
            slot.version
        };
        self.notify(key, version, StoreEventKind::Updated);
        true
    }

    /// `modify` for slots that must already exist; a missing slot is a
    /// no-op.
    pub fn modify_existing<T, F>(&self, key: &CacheKey, f: F) -> bool
    where
        T: Send + Sync + 'static,
        F: FnOnce(&mut T) -> bool,
    {
        let version = {
            let mut slots = self.inner.slots.lock().expect("store lock poisoned");
            let Some(slot) = slots.get_mut(key) else {
                return false;
            };
            let Some(value) = slot.value.downcast_mut::<T>() else {
                log::warn!("cache modify for {key} with mismatched type");
                return false;
            };
            if !f(value) {
                return false;
            }
            slot.version += 1;
            slot.version
        };
        self.notify(key, version, StoreEventKind::Updated);
        true
    }

    /// Mark `key` stale and notify owners so they refetch
    pub fn invalidate(&self, key: &CacheKey) {
        let version = {
            let mut slots = self.inner.slots.lock().expect("store lock poisoned");
            let Some(slot) = slots.get_mut(key) else {
                return;
            };
            slot.stale = true;
            slot.version += 1;
            slot.version
        };
        self.notify(key, version, StoreEventKind::Invalidated);
    }

    pub fn remove(&self, key: &CacheKey) {
        let removed = {
            let mut slots = self.inner.slots.lock().expect("store lock poisoned");
            slots.remove(key)
        };
        if let Some(slot) = removed {
            self.notify(key, slot.version, StoreEventKind::Removed);
        }
    }

    pub fn version(&self, key: &CacheKey) -> u64 {
        let slots = self.inner.slots.lock().expect("store lock poisoned");
        slots.get(key).map(|slot| slot.version).unwrap_or(0)
    }

    pub fn is_stale(&self, key: &CacheKey) -> bool {
        let slots = self.inner.slots.lock().expect("store lock poisoned");
        slots.get(key).map(|slot| slot.stale).unwrap_or(false)
    }

    /// Subscribe to slot-change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    fn notify(&self, key: &CacheKey, version: u64, kind: StoreEventKind) {
        // No subscribers is fine
        let _ = self.inner.events.send(StoreEvent {
            key: key.clone(),
            version,
            kind,
        });
    }
}
