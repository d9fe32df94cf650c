//! Change-Event Reconciliation
//!
//! Builds handlers that keep a local slice of state (an ordered list or a
//! single record) consistent with insert/update/delete notifications from
//! the realtime source, without refetching. A handler never throws into
//! the delivery path: malformed or unexpected events are logged and
//! swallowed so the subscription keeps running.

use serde_json::{Map, Value};

use crate::domain::{DomainError, DomainResult, Entity};

/// Kind of remote change
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Insert,
    Update,
    Delete,
}

/// One change notification for a subscribed table
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ChangeEvent {
    pub event_type: ChangeType,
    pub schema: String,
    pub table: String,
    /// New record state (INSERT/UPDATE)
    #[serde(default)]
    pub new: Option<Value>,
    /// Old record state, at least the identifying key (UPDATE/DELETE)
    #[serde(default)]
    pub old: Option<Value>,
}

/// The slice of local state a handler reconciles into
pub enum StateRef<'a, T> {
    List(&'a mut Vec<T>),
    Item(&'a mut T),
}

impl<T> StateRef<'_, T> {
    fn view(&self) -> StateView<'_, T> {
        match self {
            StateRef::List(items) => StateView::List(items),
            StateRef::Item(item) => StateView::Item(item),
        }
    }
}

/// Read-only view of the reconciled state, handed to the after hook
pub enum StateView<'a, T> {
    List(&'a [T]),
    Item(&'a T),
}

type BeforeUpdateHook = Box<dyn Fn(&ChangeEvent) -> Option<bool> + Send + Sync>;
type AfterUpdateHook<T> = Box<dyn Fn(&ChangeEvent, StateView<'_, T>) + Send + Sync>;

/// Reconciles change events for one entity type into local state
pub struct SubscriptionHandler<T: Entity> {
    id_field: &'static str,
    on_before_update: Option<BeforeUpdateHook>,
    on_after_update: Option<AfterUpdateHook<T>>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Entity> Default for SubscriptionHandler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> SubscriptionHandler<T> {
    pub fn new() -> Self {
        Self {
            id_field: T::ID_FIELD,
            on_before_update: None,
            on_after_update: None,
            _marker: std::marker::PhantomData,
        }
    }

    /// Name of the payload field holding the identifier to match against
    /// `Entity::id()`. Defaults to `T::ID_FIELD`; override it when the
    /// subscribed table carries the id under a foreign-key column, e.g.
    /// attachment events keyed by `message_id` reconciling a message list.
    pub fn with_id_field(mut self, id_field: &'static str) -> Self {
        self.id_field = id_field;
        self
    }

    /// Hook run before any state change. Returning `Some(_)` (handled or
    /// vetoed) makes the handler exit without touching state.
    pub fn on_before_update<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ChangeEvent) -> Option<bool> + Send + Sync + 'static,
    {
        self.on_before_update = Some(Box::new(hook));
        self
    }

    /// Side-effect hook run with the resulting state after a change
    /// (toasts, derived recomputation)
    pub fn on_after_update<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ChangeEvent, StateView<'_, T>) + Send + Sync + 'static,
    {
        self.on_after_update = Some(Box::new(hook));
        self
    }

    /// Apply one event. Returns true when the state changed. Failures are
    /// logged and swallowed.
    pub fn handle(&self, event: &ChangeEvent, mut state: StateRef<'_, T>) -> bool {
        if let Some(hook) = &self.on_before_update {
            if let Some(handled) = hook(event) {
                return handled;
            }
        }

        let changed = match self.apply(event, &mut state) {
            Ok(changed) => changed,
            Err(err) => {
                log::warn!(
                    "dropping {:?} event for table {}: {}",
                    event.event_type,
                    event.table,
                    err
                );
                return false;
            }
        };

        if changed {
            if let Some(hook) = &self.on_after_update {
                hook(event, state.view());
            }
        }
        changed
    }

    fn apply(&self, event: &ChangeEvent, state: &mut StateRef<'_, T>) -> DomainResult<bool> {
        match (event.event_type, state) {
            (ChangeType::Insert, StateRef::List(items)) => self.insert_into(event, items),
            (ChangeType::Insert, StateRef::Item(item)) => {
                **item = parse_record(event.new.as_ref())?;
                Ok(true)
            }
            (ChangeType::Update, StateRef::List(items)) => self.update_in(event, items),
            (ChangeType::Update, StateRef::Item(item)) => self.update_single(event, item),
            (ChangeType::Delete, StateRef::List(items)) => self.delete_from(event, items),
            (ChangeType::Delete, StateRef::Item(_)) => {
                // A single-item slot cannot become empty without a type
                // change; the event is acknowledged but not applied.
                log::warn!(
                    "DELETE on single-item state for table {} is not applied",
                    event.table
                );
                Ok(false)
            }
        }
    }

    fn insert_into(&self, event: &ChangeEvent, items: &mut Vec<T>) -> DomainResult<bool> {
        let record: T = parse_record(event.new.as_ref())?;
        let id = record.id();

        // Duplicate delivery, or the optimistic entry was already
        // confirmed through the mutation path
        if items.iter().any(|item| item.id() == id) {
            return Ok(false);
        }

        // A confirmed record settles the pending entry it originated from
        if let Some(marker) = record.temp_marker() {
            if let Some(pending) = items
                .iter_mut()
                .find(|item| item.is_pending() && item.temp_marker() == Some(marker))
            {
                *pending = record;
                return Ok(true);
            }
        }

        items.push(record);
        Ok(true)
    }

    fn update_in(&self, event: &ChangeEvent, items: &mut Vec<T>) -> DomainResult<bool> {
        let patch = require_object(event.new.as_ref())?;
        let Some(id) = id_string(patch, self.id_field) else {
            return Err(DomainError::InvalidInput(format!(
                "UPDATE payload without {}",
                self.id_field
            )));
        };

        // Not fetched locally: a no-op, not an error
        let Some(target) = items.iter_mut().find(|item| item.id().to_string() == id) else {
            return Ok(false);
        };
        *target = merge_record(target, patch)?;
        Ok(true)
    }

    fn update_single(&self, event: &ChangeEvent, item: &mut T) -> DomainResult<bool> {
        let patch = require_object(event.new.as_ref())?;
        if let Some(id) = id_string(patch, self.id_field) {
            if item.id().to_string() != id {
                return Ok(false);
            }
        }
        *item = merge_record(item, patch)?;
        Ok(true)
    }

    fn delete_from(&self, event: &ChangeEvent, items: &mut Vec<T>) -> DomainResult<bool> {
        let old = require_object(event.old.as_ref())?;
        let Some(id) = id_string(old, self.id_field) else {
            return Err(DomainError::InvalidInput(format!(
                "DELETE payload without {}",
                self.id_field
            )));
        };
        let before = items.len();
        items.retain(|item| item.id().to_string() != id);
        Ok(items.len() != before)
    }
}

/// Shallow merge: fields present in the patch win, everything else is
/// preserved. The merged object is validated by deserializing back into
/// the entity type before any state is replaced.
pub fn merge_record<T: Entity>(current: &T, patch: &Map<String, Value>) -> DomainResult<T> {
    let mut merged = match serde_json::to_value(current) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return Err(DomainError::Internal(
                "entity does not serialize to an object".to_string(),
            ))
        }
        Err(err) => return Err(DomainError::Internal(err.to_string())),
    };
    for (field, value) in patch {
        merged.insert(field.clone(), value.clone());
    }
    serde_json::from_value(Value::Object(merged))
        .map_err(|err| DomainError::InvalidInput(format!("merged record is invalid: {err}")))
}

fn parse_record<T: Entity>(value: Option<&Value>) -> DomainResult<T> {
    let value = value
        .ok_or_else(|| DomainError::InvalidInput("event without new record".to_string()))?;
    serde_json::from_value(value.clone())
        .map_err(|err| DomainError::InvalidInput(format!("malformed record: {err}")))
}

fn require_object(value: Option<&Value>) -> DomainResult<&Map<String, Value>> {
    value
        .and_then(Value::as_object)
        .ok_or_else(|| DomainError::InvalidInput("event payload is not an object".to_string()))
}

/// Identifier as a string, accepting string and numeric JSON ids
fn id_string(payload: &Map<String, Value>, id_field: &str) -> Option<String> {
    match payload.get(id_field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
