use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{CreateMealRequest, UpdateMealRequest};
use super::repo_types::Meal;
use super::services;
use crate::{error::AppResult, extractors::Owner, matching::Choice, state::AppState};

// --- public routers ---

pub fn meal_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals).post(create_meal))
        .route("/meals/:id", put(update_meal).delete(delete_meal))
        .route("/meals/match", post(find_matching_meals))
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
) -> AppResult<Json<Vec<Meal>>> {
    Ok(Json(services::list_meals(&state, owner_id).await?))
}

#[instrument(skip(state, body))]
pub async fn create_meal(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Json(body): Json<CreateMealRequest>,
) -> AppResult<(StatusCode, Json<Meal>)> {
    let meal = services::create_meal(&state, owner_id, body).await?;
    Ok((StatusCode::CREATED, Json(meal)))
}

#[instrument(skip(state, body))]
pub async fn update_meal(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateMealRequest>,
) -> AppResult<Json<Meal>> {
    Ok(Json(services::update_meal(&state, owner_id, id, body).await?))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_meal(&state, owner_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /meals/match `{"mode":"filter","choices":[..]}` or `{"mode":"surprise"}`
#[instrument(skip(state))]
pub async fn find_matching_meals(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Json(choice): Json<Choice>,
) -> AppResult<Json<Vec<Meal>>> {
    Ok(Json(
        services::find_matching_meals(&state, owner_id, choice).await?,
    ))
}
