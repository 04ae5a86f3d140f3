//! Optimistic mutations.
//!
//! A mutation moves through `Idle → OptimisticApplied → Confirmed |
//! RolledBack → Settled`. The optimistic write and its undo are grouped in a
//! [`Transaction`] spanning every key the mutation touches, so a transfer
//! between pantry and shopping list is undone as one unit.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::actions::Action;
use super::api::ApiRequest;
use super::error::{ApiError, ClientError};
use super::notify::{Notification, Notifier};
use super::store::{Collection, ResourceKey, ResourceKind, ResourceStore, Snapshot};
use super::transport::Transport;
use crate::{
    config::ClientConfig, meals::repo_types::Meal, pantry::repo_types::PantryItem,
    shopping::repo_types::ShoppingListItem,
};

type Update = Box<dyn FnOnce(Collection) -> Collection + Send>;

/// Local change to one cached collection.
pub struct Patch {
    key: ResourceKey,
    update: Update,
}

impl Patch {
    pub fn new(key: ResourceKey, update: impl FnOnce(Collection) -> Collection + Send + 'static) -> Self {
        Self {
            key,
            update: Box::new(update),
        }
    }

    pub fn meals(owner: Uuid, f: impl FnOnce(&mut Vec<Meal>) + Send + 'static) -> Self {
        Self::new(ResourceKey::new(ResourceKind::Meals, owner), move |c| match c {
            Collection::Meals(mut v) => {
                f(&mut v);
                Collection::Meals(v)
            }
            other => other,
        })
    }

    pub fn pantry(owner: Uuid, f: impl FnOnce(&mut Vec<PantryItem>) + Send + 'static) -> Self {
        Self::new(ResourceKey::new(ResourceKind::Pantry, owner), move |c| match c {
            Collection::Pantry(mut v) => {
                f(&mut v);
                Collection::Pantry(v)
            }
            other => other,
        })
    }

    pub fn shopping_list(owner: Uuid, f: impl FnOnce(&mut Vec<ShoppingListItem>) + Send + 'static) -> Self {
        Self::new(ResourceKey::new(ResourceKind::ShoppingList, owner), move |c| match c {
            Collection::ShoppingList(mut v) => {
                f(&mut v);
                Collection::ShoppingList(v)
            }
            other => other,
        })
    }

    pub fn key(&self) -> ResourceKey {
        self.key
    }

    pub fn run(self, current: Collection) -> Collection {
        (self.update)(current)
    }
}

impl fmt::Debug for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Patch").field("key", &self.key).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    OptimisticApplied,
    Confirmed,
    RolledBack,
    Settled,
}

/// Optimistic change across one or more keys with a single undo path.
///
/// Dropping a transaction that was neither committed nor rolled back rolls
/// it back.
pub struct Transaction {
    store: ResourceStore,
    snapshots: Vec<Snapshot>,
    phase: Phase,
}

impl Transaction {
    /// Cancels reads in flight for `keys` and snapshots each of them.
    pub fn begin(store: &ResourceStore, keys: impl IntoIterator<Item = ResourceKey>) -> Self {
        let mut tx = Self {
            store: store.clone(),
            snapshots: Vec::new(),
            phase: Phase::Idle,
        };
        for key in keys {
            tx.track(key);
        }
        tx
    }

    fn track(&mut self, key: ResourceKey) {
        if self.snapshots.iter().any(|s| s.key == key) {
            return;
        }
        self.store.cancel_fetch(key);
        self.snapshots.push(self.store.snapshot(key));
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn keys(&self) -> Vec<ResourceKey> {
        self.snapshots.iter().map(|s| s.key).collect()
    }

    /// Writes the patched value. An uncached key starts from an empty
    /// collection.
    pub fn apply(&mut self, patch: Patch) {
        let key = patch.key();
        self.track(key);
        let current = self
            .store
            .read(key)
            .unwrap_or_else(|| Collection::empty(key.kind));
        self.store.write(key, patch.run(current));
        self.phase = Phase::OptimisticApplied;
    }

    /// The server accepted the change: every key is refetched on next use
    /// so provisional records get their real ids.
    pub fn commit(mut self) -> Phase {
        for s in &self.snapshots {
            self.store.invalidate(s.key);
        }
        self.phase = Phase::Confirmed;
        self.phase
    }

    /// Puts every snapshot back as taken, then marks each key stale.
    ///
    /// A mutation that overlapped this one may have snapshotted our
    /// optimistic write, or committed after our snapshot was taken, so the
    /// restored value is only trusted until the next server read.
    pub fn rollback(mut self) -> Phase {
        self.restore_all();
        self.phase
    }

    fn restore_all(&mut self) {
        for s in self.snapshots.drain(..).rev() {
            let key = s.key;
            self.store.restore(s);
            self.store.invalidate(key);
        }
        self.phase = Phase::RolledBack;
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if matches!(self.phase, Phase::Idle | Phase::OptimisticApplied) && !self.snapshots.is_empty() {
            warn!(keys = self.snapshots.len(), "unsettled transaction dropped; rolling back");
            self.restore_all();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed(String),
}

/// Sends `req`, trying again after a pause while the failure is transient
/// and retries remain.
pub async fn send_with_retry(
    transport: &dyn Transport,
    config: &ClientConfig,
    req: ApiRequest,
) -> Result<Value, ApiError> {
    let mut attempt = 0;
    loop {
        match transport.send(req.clone()).await {
            Err(e) if e.is_transient() && attempt < config.retries => {
                attempt += 1;
                warn!(error = %e, attempt, path = %req.path, "transient failure; retrying");
                tokio::time::sleep(config.retry_delay).await;
            }
            other => return other,
        }
    }
}

#[derive(Clone)]
pub struct MutationCoordinator {
    store: ResourceStore,
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    notifier: Notifier,
    statuses: Arc<Mutex<HashMap<Action, MutationStatus>>>,
}

impl MutationCoordinator {
    pub fn new(
        store: ResourceStore,
        transport: Arc<dyn Transport>,
        config: ClientConfig,
        notifier: Notifier,
    ) -> Self {
        Self {
            store,
            transport,
            config,
            notifier,
            statuses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn status(&self, action: Action) -> MutationStatus {
        self.statuses.lock().get(&action).cloned().unwrap_or_default()
    }

    fn set_status(&self, action: Action, status: MutationStatus) {
        self.statuses.lock().insert(action, status);
    }

    /// Applies `patches` to the cache, sends `request`, then commits or
    /// rolls back and notifies. Returns the response body.
    pub async fn run(
        &self,
        action: Action,
        patches: Vec<Patch>,
        request: ApiRequest,
    ) -> Result<Value, ClientError> {
        self.set_status(action, MutationStatus::Pending);

        let mut tx = Transaction::begin(&self.store, patches.iter().map(Patch::key));
        for patch in patches {
            tx.apply(patch);
        }
        debug!(?action, phase = ?tx.phase(), keys = tx.keys().len(), "optimistic update applied");

        match send_with_retry(&*self.transport, &self.config, request).await {
            Ok(body) => {
                let phase = tx.commit();
                debug!(?action, ?phase, "mutation confirmed");
                self.set_status(action, MutationStatus::Succeeded);
                self.notifier.emit(Notification::success(action));
                info!(?action, phase = ?Phase::Settled, "mutation settled");
                Ok(body)
            }
            Err(e) => {
                let phase = tx.rollback();
                warn!(?action, ?phase, error = %e, "mutation rolled back");
                self.set_status(action, MutationStatus::Failed(e.to_string()));
                self.notifier.emit(Notification::error(action, &e));
                info!(?action, phase = ?Phase::Settled, "mutation settled");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::actions::{
        add_pantry_item, move_to_cart, provisional_pantry_item, provisional_shopping_item,
        remove_pantry_item,
    };
    use crate::client::api::Method;
    use crate::client::notify::Level;
    use crate::pantry::repo_types::Category;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Answers from a fixed script, one entry per call.
    struct Scripted {
        replies: Mutex<Vec<Result<Value, ApiError>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(mut replies: Vec<Result<Value, ApiError>>) -> Arc<Self> {
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn send(&self, _req: ApiRequest) -> Result<Value, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .pop()
                .unwrap_or_else(|| Err(ApiError::Network("script exhausted".into())))
        }
    }

    fn config() -> ClientConfig {
        ClientConfig {
            retries: 1,
            retry_delay: Duration::from_millis(1),
            notification_buffer: 8,
        }
    }

    fn coordinator(transport: Arc<Scripted>) -> (MutationCoordinator, ResourceStore, Notifier) {
        let store = ResourceStore::new();
        let notifier = Notifier::new(8);
        let c = MutationCoordinator::new(store.clone(), transport, config(), notifier.clone());
        (c, store, notifier)
    }

    fn server_error() -> ApiError {
        ApiError::Server { status: 500, message: "boom".into() }
    }

    fn request(owner: Uuid) -> ApiRequest {
        ApiRequest::new(Method::Post, "/pantry", owner)
    }

    #[test]
    fn dropped_transaction_rolls_back() {
        let store = ResourceStore::new();
        let owner = Uuid::new_v4();
        let key = ResourceKey::new(ResourceKind::Pantry, owner);
        store.write(key, Collection::Pantry(vec![]));

        {
            let mut tx = Transaction::begin(&store, [key]);
            tx.apply(add_pantry_item(provisional_pantry_item(owner, "Milk".into(), Category::Dairy, true)));
            assert_eq!(store.read(key).map(|c| c.len()), Some(1));
        }

        assert_eq!(store.read(key), Some(Collection::Pantry(vec![])));
        assert!(store.is_stale(key));
    }

    #[test]
    fn overlapping_rollbacks_leave_keys_stale() {
        let store = ResourceStore::new();
        let owner = Uuid::new_v4();
        let key = ResourceKey::new(ResourceKind::Pantry, owner);
        store.write(key, Collection::Pantry(vec![]));

        let mut first = Transaction::begin(&store, [key]);
        first.apply(add_pantry_item(provisional_pantry_item(owner, "Milk".into(), Category::Dairy, true)));
        let mut second = Transaction::begin(&store, [key]);
        second.apply(add_pantry_item(provisional_pantry_item(owner, "Eggs".into(), Category::Dairy, true)));

        first.rollback();
        second.rollback();

        // The second snapshot still holds Milk; only a fresh read can drop it.
        assert_eq!(store.read(key).map(|c| c.len()), Some(1));
        assert!(store.is_stale(key));
    }

    #[test]
    fn commit_marks_every_key_stale() {
        let store = ResourceStore::new();
        let owner = Uuid::new_v4();
        let entry = provisional_shopping_item(owner, "Milk".into(), Category::Dairy);

        let mut tx = Transaction::begin(&store, std::iter::empty());
        for p in move_to_cart(entry) {
            tx.apply(p);
        }
        assert_eq!(tx.commit(), Phase::Confirmed);

        assert!(store.is_stale(ResourceKey::new(ResourceKind::Pantry, owner)));
        assert!(store.is_stale(ResourceKey::new(ResourceKind::ShoppingList, owner)));
    }

    #[tokio::test]
    async fn transient_failure_is_retried_once() {
        let transport = Scripted::new(vec![Err(server_error()), Ok(Value::Null)]);
        let (c, _, _) = coordinator(transport.clone());
        let owner = Uuid::new_v4();

        c.run(Action::AddPantryItem, vec![], request(owner)).await.unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
        assert_eq!(c.status(Action::AddPantryItem), MutationStatus::Succeeded);
    }

    #[tokio::test]
    async fn validation_failure_is_not_retried() {
        let transport = Scripted::new(vec![Err(ApiError::Validation("name is required".into()))]);
        let (c, _, _) = coordinator(transport.clone());

        let err = c.run(Action::AddPantryItem, vec![], request(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, ClientError::Api(ApiError::Validation(_))));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_transient_failure_rolls_back_and_notifies() {
        let transport = Scripted::new(vec![Err(server_error()), Err(server_error())]);
        let (c, store, notifier) = coordinator(transport);
        let mut rx = notifier.subscribe();
        let owner = Uuid::new_v4();
        let key = ResourceKey::new(ResourceKind::Pantry, owner);
        let before = Collection::Pantry(vec![provisional_pantry_item(owner, "Rice".into(), Category::Grains, true)]);
        store.write(key, before.clone());

        let patch = add_pantry_item(provisional_pantry_item(owner, "Milk".into(), Category::Dairy, true));
        c.run(Action::AddPantryItem, vec![patch], request(owner)).await.unwrap_err();

        assert_eq!(store.read(key), Some(before));
        assert!(store.is_stale(key));
        assert!(matches!(c.status(Action::AddPantryItem), MutationStatus::Failed(_)));
        let n = rx.recv().await.unwrap();
        assert_eq!(n.level, Level::Error);
        assert_eq!(n.action, Action::AddPantryItem);
    }

    #[tokio::test]
    async fn not_found_restores_and_invalidates() {
        let transport = Scripted::new(vec![Err(ApiError::NotFound("pantry item not found".into()))]);
        let (c, store, _) = coordinator(transport);
        let owner = Uuid::new_v4();
        let key = ResourceKey::new(ResourceKind::Pantry, owner);
        let milk = provisional_pantry_item(owner, "Milk".into(), Category::Dairy, true);
        store.write(key, Collection::Pantry(vec![milk.clone()]));

        let patch = remove_pantry_item(owner, milk.id);
        c.run(Action::DeletePantryItem, vec![patch], request(owner)).await.unwrap_err();

        assert_eq!(store.read(key), Some(Collection::Pantry(vec![milk])));
        assert!(store.is_stale(key));
    }

    #[test]
    fn untouched_action_is_idle() {
        let (c, _, _) = coordinator(Scripted::new(vec![]));
        assert_eq!(c.status(Action::MoveToPantry), MutationStatus::Idle);
    }
}
