use tracing::{debug, info};
use uuid::Uuid;

use super::dto::{CreateMealRequest, UpdateMealRequest};
use super::repo_types::{Meal, MealPatch, NewMeal};
use crate::error::{required_name, AppError, AppResult};
use crate::matching::{self, canonical_tag, Choice};
use crate::state::AppState;

pub(crate) fn clean_ingredients(ingredients: Vec<String>) -> Vec<String> {
    ingredients
        .into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect()
}

pub(crate) fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.iter()
        .map(|t| canonical_tag(t))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Lists the owner's saved meals, sweeping abandoned drafts first.
pub async fn list_meals(st: &AppState, owner_id: Uuid) -> AppResult<Vec<Meal>> {
    let purged = st.meals.delete_unconfirmed(owner_id).await?;
    if purged > 0 {
        info!(%owner_id, purged, "purged draft meals");
    }
    let meals = st.meals.find(owner_id).await?;
    Ok(meals.into_iter().filter(|m| m.confirmed).collect())
}

pub async fn create_meal(st: &AppState, owner_id: Uuid, req: CreateMealRequest) -> AppResult<Meal> {
    let name = required_name("name", &req.name)?;
    let meal = st
        .meals
        .create(NewMeal {
            owner_id,
            name,
            ingredients: clean_ingredients(req.ingredients),
            tags: clean_tags(req.tags),
            confirmed: req.confirmed.unwrap_or(true),
        })
        .await?;
    info!(%owner_id, meal_id = %meal.id, confirmed = meal.confirmed, "meal created");
    Ok(meal)
}

pub async fn update_meal(
    st: &AppState,
    owner_id: Uuid,
    id: Uuid,
    req: UpdateMealRequest,
) -> AppResult<Meal> {
    let name = match req.name {
        Some(n) => Some(required_name("name", &n)?),
        None => None,
    };
    let patch = MealPatch {
        name,
        ingredients: req.ingredients.map(clean_ingredients),
        tags: req.tags.map(clean_tags),
        confirmed: req.confirmed,
    };
    st.meals
        .update(owner_id, id, patch)
        .await?
        .ok_or_else(|| AppError::not_found(format!("meal {id}")))
}

pub async fn delete_meal(st: &AppState, owner_id: Uuid, id: Uuid) -> AppResult<()> {
    if !st.meals.delete(owner_id, id).await? {
        return Err(AppError::not_found(format!("meal {id}")));
    }
    info!(%owner_id, meal_id = %id, "meal deleted");
    Ok(())
}

/// Meals the owner can cook right now for the given choice.
pub async fn find_matching_meals(
    st: &AppState,
    owner_id: Uuid,
    choice: Choice,
) -> AppResult<Vec<Meal>> {
    let choices = choice.into_choice_set()?;
    let meals = st.meals.find(owner_id).await?;
    let pantry = st.pantry.find(owner_id).await?;

    let matched = matching::find_matching_meals(&meals, &pantry, &choices);
    debug!(%owner_id, matched = matched.len(), "find_matching_meals");
    Ok(matched)
}
