use tracing::info;
use uuid::Uuid;

use super::dto::{CreateShoppingItemRequest, MoveToPantryResponse, UpdateShoppingItemRequest};
use super::repo_types::{NewShoppingListItem, ShoppingListItem, ShoppingPatch};
use crate::error::{required_name, AppError, AppResult};
use crate::pantry::dto::TransferRequest;
use crate::pantry::repo_types::{Category, NewPantryItem};
use crate::state::AppState;

pub async fn list_items(st: &AppState, owner_id: Uuid) -> AppResult<Vec<ShoppingListItem>> {
    Ok(st.shopping.find(owner_id).await?)
}

pub async fn add_item(
    st: &AppState,
    owner_id: Uuid,
    req: CreateShoppingItemRequest,
) -> AppResult<ShoppingListItem> {
    let name = required_name("name", &req.name)?;
    let category: Category = req.category.parse()?;
    let item = st
        .shopping
        .create(NewShoppingListItem {
            owner_id,
            name,
            category,
        })
        .await?;
    info!(%owner_id, item_id = %item.id, name = %item.name, "shopping list item added");
    Ok(item)
}

pub async fn update_item(
    st: &AppState,
    owner_id: Uuid,
    id: Uuid,
    req: UpdateShoppingItemRequest,
) -> AppResult<ShoppingListItem> {
    let patch = ShoppingPatch {
        name: req.name.map(|n| required_name("name", &n)).transpose()?,
        category: req.category.map(|c| c.parse::<Category>()).transpose()?,
    };
    st.shopping
        .update(owner_id, id, patch)
        .await?
        .ok_or_else(|| AppError::not_found(format!("shopping list item {id}")))
}

pub async fn delete_item(st: &AppState, owner_id: Uuid, id: Uuid) -> AppResult<()> {
    if !st.shopping.delete(owner_id, id).await? {
        return Err(AppError::not_found(format!("shopping list item {id}")));
    }
    info!(%owner_id, item_id = %id, "shopping list item deleted");
    Ok(())
}

/// Checks off every shopping-list entry named `req.name` and stocks one
/// pantry item of `req.category` in its place.
pub async fn move_to_pantry(
    st: &AppState,
    owner_id: Uuid,
    req: TransferRequest,
) -> AppResult<MoveToPantryResponse> {
    let name = required_name("name", &req.name)?;
    let category: Category = req.category.parse()?;

    let stocked = NewPantryItem {
        owner_id,
        name: name.clone(),
        category,
        in_stock: true,
    };
    let Some((removed, item)) = st.shopping.move_to_pantry(owner_id, &name, stocked).await? else {
        return Err(AppError::not_found(format!(
            "shopping list item named {name:?}"
        )));
    };

    info!(%owner_id, %name, removed, "moved shopping list item to pantry");
    Ok(MoveToPantryResponse { removed, item })
}
