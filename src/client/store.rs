//! Client-side cache of server-owned collections, one entry per
//! [`ResourceKey`].
//!
//! The store knows nothing about mutations. It keeps the last value it was
//! given, a stale flag, and the bookkeeping needed to cancel a read that is
//! still in flight. Grouping several keys into one unit of change is the
//! job of [`Transaction`](super::coordinator::Transaction).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tracing::debug;
use uuid::Uuid;

use crate::{meals::repo_types::Meal, pantry::repo_types::PantryItem, shopping::repo_types::ShoppingListItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Meals,
    Pantry,
    ShoppingList,
}

impl ResourceKind {
    /// Collection path below the API root.
    pub fn path(self) -> &'static str {
        match self {
            ResourceKind::Meals => "/meals",
            ResourceKind::Pantry => "/pantry",
            ResourceKind::ShoppingList => "/shopping-list",
        }
    }
}

/// "This owner's pantry", "this owner's meals", ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub kind: ResourceKind,
    pub owner: Uuid,
}

impl ResourceKey {
    pub fn new(kind: ResourceKind, owner: Uuid) -> Self {
        Self { kind, owner }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collection {
    Meals(Vec<Meal>),
    Pantry(Vec<PantryItem>),
    ShoppingList(Vec<ShoppingListItem>),
}

impl Collection {
    pub fn empty(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Meals => Collection::Meals(Vec::new()),
            ResourceKind::Pantry => Collection::Pantry(Vec::new()),
            ResourceKind::ShoppingList => Collection::ShoppingList(Vec::new()),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Collection::Meals(_) => ResourceKind::Meals,
            Collection::Pantry(_) => ResourceKind::Pantry,
            Collection::ShoppingList(_) => ResourceKind::ShoppingList,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Collection::Meals(v) => v.len(),
            Collection::Pantry(v) => v.len(),
            Collection::ShoppingList(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_meals(&self) -> Option<&[Meal]> {
        match self {
            Collection::Meals(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_pantry(&self) -> Option<&[PantryItem]> {
        match self {
            Collection::Pantry(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_shopping_list(&self) -> Option<&[ShoppingListItem]> {
        match self {
            Collection::ShoppingList(v) => Some(v),
            _ => None,
        }
    }
}

/// What a view sees when it asks for a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceState {
    pub data: Option<Collection>,
    pub is_loading: bool,
    pub is_stale: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct Entry {
    value: Option<Collection>,
    stale: bool,
    loading: bool,
    generation: u64,
    in_flight: Option<AbortHandle>,
    error: Option<String>,
}

/// Cached value of one key as it was when taken. Restoring it puts the
/// value and the stale flag back exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub key: ResourceKey,
    pub value: Option<Collection>,
    pub stale: bool,
}

#[derive(Clone, Default)]
pub struct ResourceStore {
    entries: Arc<Mutex<HashMap<ResourceKey, Entry>>>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self, key: ResourceKey) -> Option<Collection> {
        self.entries.lock().get(&key).and_then(|e| e.value.clone())
    }

    /// Replaces the cached value and clears staleness and errors.
    pub fn write(&self, key: ResourceKey, value: Collection) {
        let mut entries = self.entries.lock();
        let e = entries.entry(key).or_default();
        e.value = Some(value);
        e.stale = false;
        e.error = None;
    }

    pub fn snapshot(&self, key: ResourceKey) -> Snapshot {
        let entries = self.entries.lock();
        let (value, stale) = entries
            .get(&key)
            .map(|e| (e.value.clone(), e.stale))
            .unwrap_or((None, false));
        Snapshot { key, value, stale }
    }

    pub fn restore(&self, snapshot: Snapshot) {
        let mut entries = self.entries.lock();
        let e = entries.entry(snapshot.key).or_default();
        e.value = snapshot.value;
        e.stale = snapshot.stale;
    }

    /// Marks the value stale; the next `Client::use_resource` refetches it.
    pub fn invalidate(&self, key: ResourceKey) {
        let mut entries = self.entries.lock();
        entries.entry(key).or_default().stale = true;
        debug!(kind = ?key.kind, owner = %key.owner, "resource invalidated");
    }

    pub fn is_stale(&self, key: ResourceKey) -> bool {
        self.entries.lock().get(&key).map_or(false, |e| e.stale)
    }

    pub fn state(&self, key: ResourceKey) -> ResourceState {
        let entries = self.entries.lock();
        match entries.get(&key) {
            Some(e) => ResourceState {
                data: e.value.clone(),
                is_loading: e.loading,
                is_stale: e.stale,
                error: e.error.clone(),
            },
            None => ResourceState {
                data: None,
                is_loading: false,
                is_stale: false,
                error: None,
            },
        }
    }

    /// Registers a read for `key`. Returns its generation, or `None` when a
    /// read is already running.
    pub fn begin_fetch(&self, key: ResourceKey) -> Option<u64> {
        let mut entries = self.entries.lock();
        let e = entries.entry(key).or_default();
        if e.loading {
            return None;
        }
        e.loading = true;
        e.generation += 1;
        Some(e.generation)
    }

    /// Remembers the task behind a registered read so it can be aborted.
    pub fn attach_fetch(&self, key: ResourceKey, generation: u64, handle: AbortHandle) {
        let mut entries = self.entries.lock();
        match entries.get_mut(&key) {
            Some(e) if e.loading && e.generation == generation => e.in_flight = Some(handle),
            // Already finished or superseded.
            _ => {}
        }
    }

    /// Lands the result of a read. Returns `false` and drops the result
    /// when the read was cancelled or superseded in the meantime.
    pub fn complete_fetch(
        &self,
        key: ResourceKey,
        generation: u64,
        result: Result<Collection, String>,
    ) -> bool {
        let mut entries = self.entries.lock();
        let Some(e) = entries.get_mut(&key) else {
            return false;
        };
        if e.generation != generation {
            debug!(kind = ?key.kind, generation, current = e.generation, "discarding superseded read");
            return false;
        }

        e.loading = false;
        e.in_flight = None;
        match result {
            Ok(value) => {
                e.value = Some(value);
                e.stale = false;
                e.error = None;
            }
            Err(msg) => e.error = Some(msg),
        }
        true
    }

    /// Aborts any read in flight for `key`. Whatever it returns later is
    /// ignored.
    pub fn cancel_fetch(&self, key: ResourceKey) {
        let mut entries = self.entries.lock();
        let Some(e) = entries.get_mut(&key) else {
            return;
        };
        if let Some(handle) = e.in_flight.take() {
            handle.abort();
        }
        if e.loading {
            debug!(kind = ?key.kind, owner = %key.owner, "cancelled in-flight read");
        }
        e.loading = false;
        e.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pantry::repo_types::Category;
    use time::OffsetDateTime;

    fn pantry_key() -> ResourceKey {
        ResourceKey::new(ResourceKind::Pantry, Uuid::new_v4())
    }

    fn milk(owner: Uuid) -> PantryItem {
        PantryItem {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: "Milk".into(),
            category: Category::Dairy,
            in_stock: true,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn unknown_key_reads_as_nothing() {
        let store = ResourceStore::new();
        let key = pantry_key();
        assert_eq!(store.read(key), None);
        let state = store.state(key);
        assert!(state.data.is_none() && !state.is_loading && !state.is_stale);
    }

    #[test]
    fn restore_puts_back_value_and_stale_flag() {
        let store = ResourceStore::new();
        let key = pantry_key();
        store.write(key, Collection::Pantry(vec![milk(key.owner)]));
        store.invalidate(key);
        let snap = store.snapshot(key);

        store.write(key, Collection::Pantry(vec![]));
        assert!(!store.is_stale(key));

        store.restore(snap.clone());
        assert_eq!(store.read(key), snap.value);
        assert!(store.is_stale(key));
    }

    #[test]
    fn only_one_read_at_a_time() {
        let store = ResourceStore::new();
        let key = pantry_key();
        let gen = store.begin_fetch(key).unwrap();
        assert_eq!(store.begin_fetch(key), None);
        assert!(store.state(key).is_loading);

        assert!(store.complete_fetch(key, gen, Ok(Collection::Pantry(vec![]))));
        assert!(!store.state(key).is_loading);
        assert!(store.begin_fetch(key).is_some());
    }

    #[test]
    fn cancelled_read_cannot_overwrite_newer_value() {
        let store = ResourceStore::new();
        let key = pantry_key();
        let gen = store.begin_fetch(key).unwrap();

        store.cancel_fetch(key);
        let optimistic = Collection::Pantry(vec![milk(key.owner)]);
        store.write(key, optimistic.clone());

        assert!(!store.complete_fetch(key, gen, Ok(Collection::Pantry(vec![]))));
        assert_eq!(store.read(key), Some(optimistic));
    }

    #[test]
    fn failed_read_keeps_last_value_and_records_error() {
        let store = ResourceStore::new();
        let key = pantry_key();
        let value = Collection::Pantry(vec![milk(key.owner)]);
        store.write(key, value.clone());

        let gen = store.begin_fetch(key).unwrap();
        store.complete_fetch(key, gen, Err("server error".into()));

        let state = store.state(key);
        assert_eq!(state.data, Some(value));
        assert_eq!(state.error.as_deref(), Some("server error"));
    }

    #[tokio::test]
    async fn cancel_aborts_the_task() {
        let store = ResourceStore::new();
        let key = pantry_key();
        let gen = store.begin_fetch(key).unwrap();
        let task = tokio::spawn(std::future::pending::<()>());
        store.attach_fetch(key, gen, task.abort_handle());

        store.cancel_fetch(key);
        let err = task.await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
