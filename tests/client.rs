//! Optimistic updates seen from the client cache.
//!
//! The gated transport holds every mutation until the test decides whether
//! it reaches the server or fails with a 500. Reads pass straight through
//! unless the gate is told to hold them too.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mealmatch::client::{
    Action, ApiError, ApiRequest, Client, ClientError, Collection, Level, Method, MutationStatus,
    ResourceKind, RouterTransport, Transport,
};
use mealmatch::config::ClientConfig;
use mealmatch::pantry::dto::CreatePantryItemRequest;
use mealmatch::pantry::repo_types::Category;
use mealmatch::pantry::services as pantry;
use mealmatch::state::AppState;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

struct Gated {
    inner: RouterTransport,
    hold_reads: bool,
    arrived: mpsc::UnboundedSender<ApiRequest>,
    verdicts: Mutex<mpsc::UnboundedReceiver<bool>>,
}

#[async_trait]
impl Transport for Gated {
    async fn send(&self, req: ApiRequest) -> Result<Value, ApiError> {
        if req.method == Method::Get && !self.hold_reads {
            return self.inner.send(req).await;
        }
        let _ = self.arrived.send(req.clone());
        let pass = self.verdicts.lock().await.recv().await.unwrap_or(false);
        if pass {
            self.inner.send(req).await
        } else {
            Err(ApiError::Server {
                status: 500,
                message: "simulated outage".into(),
            })
        }
    }
}

struct Gate {
    arrived: mpsc::UnboundedReceiver<ApiRequest>,
    verdicts: mpsc::UnboundedSender<bool>,
}

impl Gate {
    async fn next(&mut self) -> ApiRequest {
        tokio::time::timeout(Duration::from_secs(5), self.arrived.recv())
            .await
            .expect("mutation never reached the transport")
            .expect("transport dropped")
    }

    fn pass(&self) {
        self.verdicts.send(true).unwrap();
    }

    fn fail(&self) {
        self.verdicts.send(false).unwrap();
    }
}

fn no_retry() -> ClientConfig {
    ClientConfig {
        retries: 0,
        retry_delay: Duration::from_millis(1),
        notification_buffer: 16,
    }
}

fn gated_client(state: AppState, owner: Uuid) -> (Client, Gate) {
    gated(state, owner, false)
}

fn gated(state: AppState, owner: Uuid, hold_reads: bool) -> (Client, Gate) {
    let (arrived_tx, arrived_rx) = mpsc::unbounded_channel();
    let (verdict_tx, verdict_rx) = mpsc::unbounded_channel();
    let transport = Gated {
        inner: RouterTransport::new(state),
        hold_reads,
        arrived: arrived_tx,
        verdicts: Mutex::new(verdict_rx),
    };
    let client = Client::new(owner, Arc::new(transport), no_retry());
    let gate = Gate {
        arrived: arrived_rx,
        verdicts: verdict_tx,
    };
    (client, gate)
}

async fn stock(state: &AppState, owner: Uuid, name: &str, category: &str) {
    pantry::add_item(
        state,
        owner,
        CreatePantryItemRequest {
            name: name.into(),
            category: category.into(),
            in_stock: true,
        },
    )
    .await
    .unwrap();
}

fn eggs() -> CreatePantryItemRequest {
    CreatePantryItemRequest {
        name: "Eggs".into(),
        category: "Dairy".into(),
        in_stock: true,
    }
}

fn pantry_names(c: &Client) -> Vec<String> {
    c.store()
        .read(c.key(ResourceKind::Pantry))
        .and_then(|v| v.as_pantry().map(|items| items.iter().map(|i| i.name.clone()).collect()))
        .unwrap_or_default()
}

#[tokio::test]
async fn failed_add_restores_the_exact_snapshot() {
    let state = AppState::fake();
    let owner = Uuid::new_v4();
    stock(&state, owner, "Rice", "Grains").await;
    stock(&state, owner, "Beans", "Canned").await;

    let (client, mut gate) = gated_client(state, owner);
    let mut notes = client.subscribe();
    let before = client.refetch(ResourceKind::Pantry).await.unwrap();
    assert_eq!(before.len(), 2);

    let c = client.clone();
    let pending = tokio::spawn(async move {
        c.add_pantry_item(CreatePantryItemRequest {
            name: "Milk".into(),
            category: "Dairy".into(),
            in_stock: true,
        })
        .await
    });

    let req = gate.next().await;
    assert_eq!(req.path, "/pantry");
    assert_eq!(pantry_names(&client), vec!["Rice", "Beans", "Milk"]);
    assert_eq!(client.mutation_status(Action::AddPantryItem), MutationStatus::Pending);

    gate.fail();
    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, ClientError::Api(ApiError::Server { status: 500, .. })));

    let after = client.store().read(client.key(ResourceKind::Pantry)).unwrap();
    assert_eq!(after, before);
    assert!(client.store().is_stale(client.key(ResourceKind::Pantry)));
    assert_eq!(client.refetch(ResourceKind::Pantry).await.unwrap(), before);

    let note = notes.recv().await.unwrap();
    assert_eq!(note.level, Level::Error);
    assert_eq!(note.action, Action::AddPantryItem);
    assert!(matches!(client.mutation_status(Action::AddPantryItem), MutationStatus::Failed(_)));
}

#[tokio::test]
async fn move_to_cart_updates_both_caches_and_server() {
    let state = AppState::fake();
    let owner = Uuid::new_v4();
    stock(&state, owner, "Milk", "Dairy").await;
    stock(&state, owner, "Rice", "Grains").await;

    let (client, mut gate) = gated_client(state, owner);
    let mut notes = client.subscribe();
    client.refetch(ResourceKind::Pantry).await.unwrap();
    client.refetch(ResourceKind::ShoppingList).await.unwrap();

    let c = client.clone();
    let pending = tokio::spawn(async move { c.move_to_cart("Milk", "Dairy").await });

    let req = gate.next().await;
    assert_eq!(req.path, "/pantry/to-cart");
    assert_eq!(pantry_names(&client), vec!["Rice"]);
    let list = client.store().read(client.key(ResourceKind::ShoppingList)).unwrap();
    let list = list.as_shopping_list().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].name, "Milk");
    assert_eq!(list[0].category, Category::Dairy);

    gate.pass();
    let moved = pending.await.unwrap().unwrap();
    assert_eq!(moved.removed, 1);

    assert!(client.store().is_stale(client.key(ResourceKind::Pantry)));
    assert!(client.store().is_stale(client.key(ResourceKind::ShoppingList)));
    let pantry = client.refetch(ResourceKind::Pantry).await.unwrap();
    assert_eq!(pantry.as_pantry().unwrap().len(), 1);
    let list = client.refetch(ResourceKind::ShoppingList).await.unwrap();
    assert_eq!(list.as_shopping_list().unwrap()[0].id, moved.item.id);

    let note = notes.recv().await.unwrap();
    assert_eq!(note.level, Level::Success);
    assert_eq!(client.mutation_status(Action::MoveToCart), MutationStatus::Succeeded);
}

#[tokio::test]
async fn failed_move_to_cart_reverts_both_caches() {
    let state = AppState::fake();
    let owner = Uuid::new_v4();
    stock(&state, owner, "Milk", "Dairy").await;

    let (client, mut gate) = gated_client(state, owner);
    let pantry_before = client.refetch(ResourceKind::Pantry).await.unwrap();
    let list_before = client.refetch(ResourceKind::ShoppingList).await.unwrap();

    let c = client.clone();
    let pending = tokio::spawn(async move { c.move_to_cart("Milk", "Dairy").await });

    gate.next().await;
    assert!(pantry_names(&client).is_empty());
    assert_eq!(
        client.store().read(client.key(ResourceKind::ShoppingList)).map(|c| c.len()),
        Some(1)
    );

    gate.fail();
    pending.await.unwrap().unwrap_err();

    assert_eq!(client.store().read(client.key(ResourceKind::Pantry)), Some(pantry_before));
    assert_eq!(client.store().read(client.key(ResourceKind::ShoppingList)), Some(list_before));
}

#[tokio::test]
async fn move_to_pantry_reverts_when_abandoned() {
    let state = AppState::fake();
    let owner = Uuid::new_v4();
    let (client, mut gate) = gated_client(state, owner);
    client.refetch(ResourceKind::Pantry).await.unwrap();
    let list = client.refetch(ResourceKind::ShoppingList).await.unwrap();

    let c = client.clone();
    let pending = tokio::spawn(async move { c.move_to_pantry("Bread", "Bakery").await });
    gate.next().await;
    assert_eq!(pantry_names(&client), vec!["Bread"]);

    // The caller goes away before the server answers.
    pending.abort();
    let _ = pending.await;

    assert_eq!(client.store().read(client.key(ResourceKind::Pantry)), Some(Collection::Pantry(vec![])));
    assert_eq!(client.store().read(client.key(ResourceKind::ShoppingList)), Some(list));
}

#[tokio::test]
async fn overlapping_failures_reload_from_the_server() {
    let state = AppState::fake();
    let owner = Uuid::new_v4();
    stock(&state, owner, "Milk", "Dairy").await;
    stock(&state, owner, "Rice", "Grains").await;

    let (client, mut gate) = gated_client(state, owner);
    client.refetch(ResourceKind::Pantry).await.unwrap();
    client.refetch(ResourceKind::ShoppingList).await.unwrap();

    let c = client.clone();
    let transfer = tokio::spawn(async move { c.move_to_cart("Milk", "Dairy").await });
    gate.next().await;
    let c = client.clone();
    let add = tokio::spawn(async move { c.add_pantry_item(eggs()).await });
    gate.next().await;
    assert_eq!(pantry_names(&client), vec!["Rice", "Eggs"]);

    gate.fail();
    transfer.await.unwrap().unwrap_err();
    gate.fail();
    add.await.unwrap().unwrap_err();

    // The add snapshotted the pantry mid-transfer, without Milk.
    assert_eq!(pantry_names(&client), vec!["Rice"]);
    assert!(client.store().is_stale(client.key(ResourceKind::Pantry)));
    assert!(client.store().is_stale(client.key(ResourceKind::ShoppingList)));

    client.refetch(ResourceKind::Pantry).await.unwrap();
    assert_eq!(pantry_names(&client), vec!["Milk", "Rice"]);
    let list = client.refetch(ResourceKind::ShoppingList).await.unwrap();
    assert!(list.is_empty());
}

#[tokio::test]
async fn failure_after_an_overlapping_success_still_picks_up_server_ids() {
    let state = AppState::fake();
    let owner = Uuid::new_v4();
    let (client, mut gate) = gated_client(state, owner);
    client.refetch(ResourceKind::Pantry).await.unwrap();

    let c = client.clone();
    let milk = tokio::spawn(async move {
        c.add_pantry_item(CreatePantryItemRequest {
            name: "Milk".into(),
            category: "Dairy".into(),
            in_stock: true,
        })
        .await
    });
    gate.next().await;
    let c = client.clone();
    let add_eggs = tokio::spawn(async move { c.add_pantry_item(eggs()).await });
    gate.next().await;

    gate.pass();
    let milk = milk.await.unwrap().unwrap();
    gate.fail();
    add_eggs.await.unwrap().unwrap_err();

    let key = client.key(ResourceKind::Pantry);
    let cached = client.store().read(key).unwrap();
    let cached = cached.as_pantry().unwrap();
    assert_eq!(cached.len(), 1);
    assert_ne!(cached[0].id, milk.id);
    assert!(client.store().is_stale(key));

    let fresh = client.refetch(ResourceKind::Pantry).await.unwrap();
    let ids: Vec<Uuid> = fresh.as_pantry().unwrap().iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![milk.id]);
}

#[tokio::test]
async fn mutation_cancels_a_background_read() {
    let state = AppState::fake();
    let owner = Uuid::new_v4();
    stock(&state, owner, "Rice", "Grains").await;

    let (client, mut gate) = gated(state, owner, true);
    assert!(client.use_resource(ResourceKind::Pantry).is_loading);
    let read = gate.next().await;
    assert_eq!(read.method, Method::Get);

    let c = client.clone();
    let pending = tokio::spawn(async move { c.add_pantry_item(eggs()).await });
    let write = gate.next().await;
    assert_eq!(write.method, Method::Post);

    let key = client.key(ResourceKind::Pantry);
    assert!(!client.store().state(key).is_loading);
    assert_eq!(pantry_names(&client), vec!["Eggs"]);

    gate.pass();
    pending.await.unwrap().unwrap();

    // The read held at the gate was aborted and never lands.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(pantry_names(&client), vec!["Eggs"]);
    assert!(client.store().is_stale(key));

    gate.pass();
    client.refetch(ResourceKind::Pantry).await.unwrap();
    assert_eq!(pantry_names(&client), vec!["Rice", "Eggs"]);
}

#[tokio::test]
async fn http_client_against_a_live_listener() {
    use mealmatch::app::build_app;
    use mealmatch::meals::dto::CreateMealRequest;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_app(AppState::fake())).await.unwrap();
    });

    let client = Client::over_http(Uuid::new_v4(), format!("http://{addr}"), no_retry());
    client
        .add_meal(CreateMealRequest {
            name: "Shakshuka".into(),
            ingredients: vec!["eggs".into(), "tomatoes".into()],
            tags: vec!["healthy".into(), "breakfast".into(), "parve".into()],
            confirmed: None,
        })
        .await
        .unwrap();

    let meals = client.refetch(ResourceKind::Meals).await.unwrap();
    let meals = meals.as_meals().unwrap();
    assert_eq!(meals.len(), 1);
    assert_eq!(meals[0].tags, vec!["Healthy", "Breakfast", "Parve"]);

    let err = client.delete_meal(Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn deleting_a_vanished_item_refreshes_the_cache() {
    let state = AppState::fake();
    let owner = Uuid::new_v4();
    stock(&state, owner, "Milk", "Dairy").await;

    let client = Client::in_process(owner, state.clone(), no_retry());
    let cached = client.refetch(ResourceKind::Pantry).await.unwrap();
    let milk = cached.as_pantry().unwrap()[0].clone();

    // Someone else removes it first.
    pantry::delete_item(&state, owner, milk.id).await.unwrap();

    let err = client.delete_pantry_item(milk.id).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(client.store().read(client.key(ResourceKind::Pantry)), Some(cached));
    assert!(client.store().is_stale(client.key(ResourceKind::Pantry)));

    let fresh = client.refetch(ResourceKind::Pantry).await.unwrap();
    assert!(fresh.is_empty());
}

#[tokio::test]
async fn save_for_later_round_trip() {
    let state = AppState::fake();
    let owner = Uuid::new_v4();
    stock(&state, owner, "Milk", "Dairy").await;
    stock(&state, owner, "Milk", "Dairy").await;

    let client = Client::in_process(owner, state, no_retry());
    client.refetch(ResourceKind::Pantry).await.unwrap();

    let res = client.move_to_saved("Milk").await.unwrap();
    assert_eq!(res.affected, 2);
    let pantry = client.refetch(ResourceKind::Pantry).await.unwrap();
    assert!(pantry.as_pantry().unwrap().iter().all(|i| !i.in_stock));

    client.move_from_saved("Milk").await.unwrap();
    let pantry = client.refetch(ResourceKind::Pantry).await.unwrap();
    assert!(pantry.as_pantry().unwrap().iter().all(|i| i.in_stock));
}

#[tokio::test]
async fn matching_through_the_client() {
    use mealmatch::matching::Choice;
    use mealmatch::meals::dto::CreateMealRequest;

    let state = AppState::fake();
    let owner = Uuid::new_v4();
    stock(&state, owner, "eggs", "Dairy").await;
    stock(&state, owner, "cheese", "Dairy").await;

    let client = Client::in_process(owner, state, no_retry());
    client
        .add_meal(CreateMealRequest {
            name: "Omelette".into(),
            ingredients: vec!["egg".into(), "cheese".into()],
            tags: vec!["healthy".into(), "breakfast".into(), "dairy".into()],
            confirmed: None,
        })
        .await
        .unwrap();

    let found = client
        .find_matching_meals(Choice::filter(["healthy", "breakfast", "dairy"]))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Omelette");

    let none = client
        .find_matching_meals(Choice::filter(["healthy", "lunch", "dairy"]))
        .await
        .unwrap();
    assert!(none.is_empty());

    let surprise = client.find_matching_meals(Choice::Surprise).await.unwrap();
    assert_eq!(surprise.len(), 1);
}
