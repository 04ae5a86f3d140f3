//! Caching client for the meal planner API.
//!
//! Reads go through a [`ResourceStore`] keyed per owner and collection.
//! Every mutation is applied to the cache before the server answers and is
//! rolled back if the server refuses it. Pantry/shopping-list transfers
//! patch both collections inside one transaction.

pub mod actions;
pub mod api;
pub mod coordinator;
pub mod error;
pub mod notify;
pub mod store;
pub mod transport;

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

pub use actions::Action;
pub use api::{ApiRequest, Method};
pub use coordinator::{MutationCoordinator, MutationStatus, Patch, Phase, Transaction};
pub use error::{ApiError, ClientError};
pub use notify::{Level, Notification, Notifier};
pub use store::{Collection, ResourceKey, ResourceKind, ResourceState, ResourceStore};
pub use transport::{HttpTransport, RouterTransport, Transport};

use crate::{
    config::ClientConfig,
    error::required_name,
    matching::Choice,
    meals::{
        dto::{CreateMealRequest, UpdateMealRequest},
        repo_types::{Meal, MealPatch},
        services::{clean_ingredients, clean_tags},
    },
    pantry::{
        dto::{BulkResponse, CreatePantryItemRequest, MoveToCartResponse, TransferRequest, UpdatePantryItemRequest},
        repo_types::{Category, PantryItem, PantryPatch},
    },
    shopping::{
        dto::{CreateShoppingItemRequest, MoveToPantryResponse, UpdateShoppingItemRequest},
        repo_types::{ShoppingListItem, ShoppingPatch},
    },
    state::AppState,
};

fn required(field: &str, value: &str) -> Result<String, ClientError> {
    required_name(field, value).map_err(|e| ClientError::Validation(e.to_string()))
}

fn category(value: &str) -> Result<Category, ClientError> {
    value
        .parse::<Category>()
        .map_err(|e| ClientError::Validation(e.to_string()))
}

fn optional<T>(
    value: Option<&str>,
    check: impl Fn(&str) -> Result<T, ClientError>,
) -> Result<Option<T>, ClientError> {
    value.map(check).transpose()
}

async fn fetch(
    transport: &dyn Transport,
    config: &ClientConfig,
    key: ResourceKey,
) -> Result<Collection, ApiError> {
    let body = coordinator::send_with_retry(transport, config, ApiRequest::list(key)).await?;
    api::decode_collection(key.kind, body)
}

/// One owner's view of the API.
#[derive(Clone)]
pub struct Client {
    owner: Uuid,
    store: ResourceStore,
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    notifier: Notifier,
    coordinator: MutationCoordinator,
}

impl Client {
    pub fn new(owner: Uuid, transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        let store = ResourceStore::new();
        let notifier = Notifier::new(config.notification_buffer);
        let coordinator =
            MutationCoordinator::new(store.clone(), transport.clone(), config.clone(), notifier.clone());
        Self {
            owner,
            store,
            transport,
            config,
            notifier,
            coordinator,
        }
    }

    /// Client wired straight into the application router.
    pub fn in_process(owner: Uuid, state: AppState, config: ClientConfig) -> Self {
        Self::new(owner, Arc::new(RouterTransport::new(state)), config)
    }

    pub fn over_http(owner: Uuid, base_url: impl Into<String>, config: ClientConfig) -> Self {
        Self::new(owner, Arc::new(HttpTransport::new(base_url)), config)
    }

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    pub fn key(&self, kind: ResourceKind) -> ResourceKey {
        ResourceKey::new(kind, self.owner)
    }

    // --- reads ---

    /// Current state of a collection. Starts a background read when nothing
    /// is cached yet or the cached value is stale.
    pub fn use_resource(&self, kind: ResourceKind) -> ResourceState {
        let key = self.key(kind);
        let state = self.store.state(key);
        let wants_fetch = (state.data.is_none() && state.error.is_none()) || state.is_stale;
        if wants_fetch && !state.is_loading {
            self.spawn_fetch(key);
            return self.store.state(key);
        }
        state
    }

    fn spawn_fetch(&self, key: ResourceKey) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(kind = ?key.kind, "no tokio runtime; background read skipped");
            return;
        };
        let Some(generation) = self.store.begin_fetch(key) else {
            return;
        };

        let store = self.store.clone();
        let transport = self.transport.clone();
        let config = self.config.clone();
        let task = runtime.spawn(async move {
            let result = fetch(&*transport, &config, key).await.map_err(|e| e.to_string());
            store.complete_fetch(key, generation, result);
        });
        self.store.attach_fetch(key, generation, task.abort_handle());
        debug!(kind = ?key.kind, generation, "background read started");
    }

    /// Reads a collection now, replacing any read already in flight.
    pub async fn refetch(&self, kind: ResourceKind) -> Result<Collection, ClientError> {
        let key = self.key(kind);
        self.store.cancel_fetch(key);
        let generation = self.store.begin_fetch(key);

        let result = fetch(&*self.transport, &self.config, key).await;
        if let Some(generation) = generation {
            let landed = result.clone().map_err(|e| e.to_string());
            self.store.complete_fetch(key, generation, landed);
        }
        Ok(result?)
    }

    /// Meals cookable right now for `choice`. More than three choices are
    /// rejected without a request.
    pub async fn find_matching_meals(&self, choice: Choice) -> Result<Vec<Meal>, ClientError> {
        choice
            .clone()
            .into_choice_set()
            .map_err(|e| ClientError::Validation(e.to_string()))?;
        let request = ApiRequest::new(Method::Post, "/meals/match", self.owner).json(&choice)?;
        let body = coordinator::send_with_retry(&*self.transport, &self.config, request).await?;
        api::decode(body)
    }

    // --- mutation state ---

    pub fn mutation_status(&self, action: Action) -> MutationStatus {
        self.coordinator.status(action)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    // --- meals ---

    pub async fn add_meal(&self, req: CreateMealRequest) -> Result<Meal, ClientError> {
        let name = required("name", &req.name)?;
        let meal = actions::provisional_meal(
            self.owner,
            name,
            clean_ingredients(req.ingredients.clone()),
            clean_tags(req.tags.clone()),
            req.confirmed.unwrap_or(true),
        );
        let request = ApiRequest::create(self.key(ResourceKind::Meals), &req)?;
        let body = self
            .coordinator
            .run(Action::AddMeal, vec![actions::add_meal(meal)], request)
            .await?;
        api::decode(body)
    }

    pub async fn edit_meal(&self, id: Uuid, req: UpdateMealRequest) -> Result<Meal, ClientError> {
        let patch = MealPatch {
            name: optional(req.name.as_deref(), |n| required("name", n))?,
            ingredients: req.ingredients.clone().map(clean_ingredients),
            tags: req.tags.clone().map(clean_tags),
            confirmed: req.confirmed,
        };
        let request = ApiRequest::update(self.key(ResourceKind::Meals), id, &req)?;
        let body = self
            .coordinator
            .run(Action::EditMeal, vec![actions::edit_meal(self.owner, id, patch)], request)
            .await?;
        api::decode(body)
    }

    pub async fn delete_meal(&self, id: Uuid) -> Result<(), ClientError> {
        let request = ApiRequest::delete(self.key(ResourceKind::Meals), id);
        self.coordinator
            .run(Action::DeleteMeal, vec![actions::remove_meal(self.owner, id)], request)
            .await?;
        Ok(())
    }

    // --- pantry ---

    pub async fn add_pantry_item(&self, req: CreatePantryItemRequest) -> Result<PantryItem, ClientError> {
        let name = required("name", &req.name)?;
        let item = actions::provisional_pantry_item(self.owner, name, category(&req.category)?, req.in_stock);
        let request = ApiRequest::create(self.key(ResourceKind::Pantry), &req)?;
        let body = self
            .coordinator
            .run(Action::AddPantryItem, vec![actions::add_pantry_item(item)], request)
            .await?;
        api::decode(body)
    }

    pub async fn edit_pantry_item(
        &self,
        id: Uuid,
        req: UpdatePantryItemRequest,
    ) -> Result<PantryItem, ClientError> {
        let patch = PantryPatch {
            name: optional(req.name.as_deref(), |n| required("name", n))?,
            category: optional(req.category.as_deref(), category)?,
            in_stock: req.in_stock,
        };
        let request = ApiRequest::update(self.key(ResourceKind::Pantry), id, &req)?;
        let body = self
            .coordinator
            .run(
                Action::EditPantryItem,
                vec![actions::edit_pantry_item(self.owner, id, patch)],
                request,
            )
            .await?;
        api::decode(body)
    }

    pub async fn delete_pantry_item(&self, id: Uuid) -> Result<(), ClientError> {
        let request = ApiRequest::delete(self.key(ResourceKind::Pantry), id);
        self.coordinator
            .run(
                Action::DeletePantryItem,
                vec![actions::remove_pantry_item(self.owner, id)],
                request,
            )
            .await?;
        Ok(())
    }

    /// Marks every pantry item called `name` as saved for later.
    pub async fn move_to_saved(&self, name: &str) -> Result<BulkResponse, ClientError> {
        self.set_in_stock(Action::MoveToSaved, name, false).await
    }

    /// Puts every saved pantry item called `name` back in stock.
    pub async fn move_from_saved(&self, name: &str) -> Result<BulkResponse, ClientError> {
        self.set_in_stock(Action::MoveFromSaved, name, true).await
    }

    async fn set_in_stock(
        &self,
        action: Action,
        name: &str,
        in_stock: bool,
    ) -> Result<BulkResponse, ClientError> {
        let name = required("name", name)?;
        let request = if in_stock {
            ApiRequest::move_from_saved(self.owner, &name)?
        } else {
            ApiRequest::move_to_saved(self.owner, &name)?
        };
        let body = self
            .coordinator
            .run(action, vec![actions::set_in_stock(self.owner, name, in_stock)], request)
            .await?;
        api::decode(body)
    }

    /// Moves every pantry item called `name` to the shopping list as one
    /// `category` entry.
    pub async fn move_to_cart(&self, name: &str, category_name: &str) -> Result<MoveToCartResponse, ClientError> {
        let name = required("name", name)?;
        let entry = actions::provisional_shopping_item(self.owner, name.clone(), category(category_name)?);
        let request = ApiRequest::move_to_cart(
            self.owner,
            &TransferRequest {
                name,
                category: category_name.to_string(),
            },
        )?;
        let body = self
            .coordinator
            .run(Action::MoveToCart, actions::move_to_cart(entry).into(), request)
            .await?;
        api::decode(body)
    }

    // --- shopping list ---

    pub async fn add_shopping_item(
        &self,
        req: CreateShoppingItemRequest,
    ) -> Result<ShoppingListItem, ClientError> {
        let name = required("name", &req.name)?;
        let item = actions::provisional_shopping_item(self.owner, name, category(&req.category)?);
        let request = ApiRequest::create(self.key(ResourceKind::ShoppingList), &req)?;
        let body = self
            .coordinator
            .run(Action::AddShoppingItem, vec![actions::add_shopping_item(item)], request)
            .await?;
        api::decode(body)
    }

    pub async fn edit_shopping_item(
        &self,
        id: Uuid,
        req: UpdateShoppingItemRequest,
    ) -> Result<ShoppingListItem, ClientError> {
        let patch = ShoppingPatch {
            name: optional(req.name.as_deref(), |n| required("name", n))?,
            category: optional(req.category.as_deref(), category)?,
        };
        let request = ApiRequest::update(self.key(ResourceKind::ShoppingList), id, &req)?;
        let body = self
            .coordinator
            .run(
                Action::EditShoppingItem,
                vec![actions::edit_shopping_item(self.owner, id, patch)],
                request,
            )
            .await?;
        api::decode(body)
    }

    pub async fn delete_shopping_item(&self, id: Uuid) -> Result<(), ClientError> {
        let request = ApiRequest::delete(self.key(ResourceKind::ShoppingList), id);
        self.coordinator
            .run(
                Action::DeleteShoppingItem,
                vec![actions::remove_shopping_item(self.owner, id)],
                request,
            )
            .await?;
        Ok(())
    }

    /// Checks off every shopping-list entry called `name` and stocks it in
    /// the pantry under `category`.
    pub async fn move_to_pantry(
        &self,
        name: &str,
        category_name: &str,
    ) -> Result<MoveToPantryResponse, ClientError> {
        let name = required("name", name)?;
        let stocked =
            actions::provisional_pantry_item(self.owner, name.clone(), category(category_name)?, true);
        let request = ApiRequest::move_to_pantry(
            self.owner,
            &TransferRequest {
                name,
                category: category_name.to_string(),
            },
        )?;
        let body = self
            .coordinator
            .run(Action::MoveToPantry, actions::move_to_pantry(stocked).into(), request)
            .await?;
        api::decode(body)
    }
}
