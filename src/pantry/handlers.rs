use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{
    BulkResponse, ByNameRequest, CreatePantryItemRequest, MoveToCartResponse, TransferRequest,
    UpdatePantryItemRequest,
};
use super::repo_types::PantryItem;
use super::services;
use crate::{error::AppResult, extractors::Owner, state::AppState};

pub fn pantry_routes() -> Router<AppState> {
    Router::new()
        .route("/pantry", get(list_items).post(add_item))
        .route("/pantry/:id", put(update_item).delete(delete_item))
        .route("/pantry/saved", post(move_to_saved))
        .route("/pantry/restore", post(move_from_saved))
        .route("/pantry/to-cart", post(move_to_cart))
}

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
) -> AppResult<Json<Vec<PantryItem>>> {
    Ok(Json(services::list_items(&state, owner_id).await?))
}

#[instrument(skip(state))]
pub async fn add_item(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Json(body): Json<CreatePantryItemRequest>,
) -> AppResult<(StatusCode, Json<PantryItem>)> {
    let item = services::add_item(&state, owner_id, body).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip(state))]
pub async fn update_item(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdatePantryItemRequest>,
) -> AppResult<Json<PantryItem>> {
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
pub async fn move_to_saved(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Json(body): Json<ByNameRequest>,
) -> AppResult<Json<BulkResponse>> {
    let affected = services::set_in_stock(&state, owner_id, &body.name, false).await?;
    Ok(Json(BulkResponse { affected }))
}

#[instrument(skip(state))]
pub async fn move_from_saved(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Json(body): Json<ByNameRequest>,
) -> AppResult<Json<BulkResponse>> {
    let affected = services::set_in_stock(&state, owner_id, &body.name, true).await?;
    Ok(Json(BulkResponse { affected }))
}

#[instrument(skip(state))]
pub async fn move_to_cart(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Json(body): Json<TransferRequest>,
) -> AppResult<Json<MoveToCartResponse>> {
    Ok(Json(services::move_to_cart(&state, owner_id, body).await?))
}
