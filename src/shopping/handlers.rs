use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{CreateShoppingItemRequest, MoveToPantryResponse, UpdateShoppingItemRequest};
use super::repo_types::ShoppingListItem;
use super::services;
use crate::{error::AppResult, extractors::Owner, pantry::dto::TransferRequest, state::AppState};

pub fn shopping_routes() -> Router<AppState> {
    Router::new()
        .route("/shopping-list", get(list_items).post(add_item))
        .route("/shopping-list/:id", put(update_item).delete(delete_item))
        .route("/shopping-list/to-pantry", post(move_to_pantry))
}

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
) -> AppResult<Json<Vec<ShoppingListItem>>> {
    Ok(Json(services::list_items(&state, owner_id).await?))
}

#[instrument(skip(state))]
pub async fn add_item(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Json(body): Json<CreateShoppingItemRequest>,
) -> AppResult<(StatusCode, Json<ShoppingListItem>)> {
    let item = services::add_item(&state, owner_id, body).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip(state))]
pub async fn update_item(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateShoppingItemRequest>,
) -> AppResult<Json<ShoppingListItem>> {
    Ok(Json(services::update_item(&state, owner_id, id, body).await?))
}

#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_item(&state, owner_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn move_to_pantry(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Json(body): Json<TransferRequest>,
) -> AppResult<Json<MoveToPantryResponse>> {
    Ok(Json(services::move_to_pantry(&state, owner_id, body).await?))
}
