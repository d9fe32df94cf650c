//! Realtime Channel Wiring
//!
//! One channel per mounted view scope. Routes bind a table to a handler
//! and the store slot it reconciles into, optionally filtered to the
//! relevant parent id. The channel owns a routing task over the
//! transport's receiver; closing (or dropping) the channel aborts the
//! task, so a replaced scope never keeps writing into the store.
//! Reconnection and backoff stay in the transport.

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::Entity;
use crate::store::{CacheKey, CacheStore};
use crate::subscription::{ChangeEvent, ChangeType, StateRef, SubscriptionHandler};

/// Identity of one logical channel
#[derive(Clone, Debug)]
pub struct ChannelConfig {
    pub name: String,
    pub schema: String,
}

impl ChannelConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: "public".to_string(),
        }
    }
}

/// Server-side style filter: only events whose record carries
/// `column == value` pass
#[derive(Clone, Debug)]
pub struct EventFilter {
    pub column: String,
    pub value: Value,
}

impl EventFilter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    fn matches(&self, event: &ChangeEvent) -> bool {
        let field = |payload: &Option<Value>| {
            payload
                .as_ref()
                .and_then(|v| v.get(&self.column))
                .map(|v| v == &self.value)
        };
        match field(&event.new).or_else(|| field(&event.old)) {
            Some(matched) => matched,
            // A DELETE payload may carry only the id; let it through and
            // resolve by id locally, where an unknown id is a no-op
            None => event.event_type == ChangeType::Delete,
        }
    }
}

/// One table's binding inside a channel
pub trait EventRoute: Send + Sync {
    fn table(&self) -> &str;

    /// Apply the event to the bound store slot
    fn deliver(&self, event: &ChangeEvent);
}

/// Reconciles events into an ordered collection slot
pub struct ListRoute<T: Entity> {
    table: String,
    filter: Option<EventFilter>,
    handler: SubscriptionHandler<T>,
    store: CacheStore,
    key: CacheKey,
}

impl<T: Entity> ListRoute<T> {
    pub fn new(
        table: impl Into<String>,
        handler: SubscriptionHandler<T>,
        store: CacheStore,
        key: CacheKey,
    ) -> Self {
        Self {
            table: table.into(),
            filter: None,
            handler,
            store,
            key,
        }
    }

    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl<T: Entity> EventRoute for ListRoute<T> {
    fn table(&self) -> &str {
        &self.table
    }

    fn deliver(&self, event: &ChangeEvent) {
        if let Some(filter) = &self.filter {
            if !filter.matches(event) {
                return;
            }
        }
        // Reconciled under the slot lock so a settling mutation cannot be
        // overwritten with a stale copy
        self.store.modify::<Vec<T>, _>(&self.key, |items| {
            self.handler.handle(event, StateRef::List(items))
        });
    }
}

/// Reconciles events into a single-item slot
pub struct ItemRoute<T: Entity> {
    table: String,
    filter: Option<EventFilter>,
    handler: SubscriptionHandler<T>,
    store: CacheStore,
    key: CacheKey,
}

impl<T: Entity> ItemRoute<T> {
    pub fn new(
        table: impl Into<String>,
        handler: SubscriptionHandler<T>,
        store: CacheStore,
        key: CacheKey,
    ) -> Self {
        Self {
            table: table.into(),
            filter: None,
            handler,
            store,
            key,
        }
    }

    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl<T: Entity> EventRoute for ItemRoute<T> {
    fn table(&self) -> &str {
        &self.table
    }

    fn deliver(&self, event: &ChangeEvent) {
        if let Some(filter) = &self.filter {
            if !filter.matches(event) {
                return;
            }
        }
        let applied = self.store.modify_existing::<T, _>(&self.key, |item| {
            self.handler.handle(event, StateRef::Item(item))
        });
        if !applied {
            log::debug!("no change applied for {} event on {}", self.key, self.table);
        }
    }
}

/// A live subscription: routes events until closed or dropped
pub struct RealtimeChannel {
    name: String,
    task: JoinHandle<()>,
}

impl RealtimeChannel {
    /// Start routing events from the transport receiver. Tables may share
    /// the channel; each event goes to every route bound to its table.
    pub fn open(
        config: ChannelConfig,
        routes: Vec<Box<dyn EventRoute>>,
        mut events: mpsc::Receiver<ChangeEvent>,
    ) -> Self {
        let name = config.name.clone();
        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if event.schema != config.schema {
                    continue;
                }
                let mut routed = false;
                for route in routes.iter().filter(|r| r.table() == event.table) {
                    route.deliver(&event);
                    routed = true;
                }
                if !routed {
                    log::debug!(
                        "channel {}: no route for table {}",
                        config.name,
                        event.table
                    );
                }
            }
        });
        Self { name, task }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stop routing. Dropping the channel has the same effect.
    pub fn close(self) {
        self.task.abort();
    }
}

impl Drop for RealtimeChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}
