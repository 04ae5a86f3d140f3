use tracing::info;
use uuid::Uuid;

use super::dto::{
    CreatePantryItemRequest, MoveToCartResponse, TransferRequest, UpdatePantryItemRequest,
};
use super::repo_types::{Category, NewPantryItem, PantryItem, PantryPatch};
use crate::error::{required_name, AppError, AppResult};
use crate::shopping::repo_types::NewShoppingListItem;
use crate::state::AppState;

pub async fn list_items(st: &AppState, owner_id: Uuid) -> AppResult<Vec<PantryItem>> {
    Ok(st.pantry.find(owner_id).await?)
}

pub async fn add_item(
    st: &AppState,
    owner_id: Uuid,
    req: CreatePantryItemRequest,
) -> AppResult<PantryItem> {
    let name = required_name("name", &req.name)?;
    let category: Category = req.category.parse()?;
    let item = st
        .pantry
        .create(NewPantryItem {
            owner_id,
            name,
            category,
            in_stock: req.in_stock,
        })
        .await?;
    info!(%owner_id, item_id = %item.id, name = %item.name, "pantry item added");
    Ok(item)
}

pub async fn update_item(
    st: &AppState,
    owner_id: Uuid,
    id: Uuid,
    req: UpdatePantryItemRequest,
) -> AppResult<PantryItem> {
    let patch = PantryPatch {
        name: req.name.map(|n| required_name("name", &n)).transpose()?,
        category: req.category.map(|c| c.parse::<Category>()).transpose()?,
        in_stock: req.in_stock,
    };
    st.pantry
        .update(owner_id, id, patch)
        .await?
        .ok_or_else(|| AppError::not_found(format!("pantry item {id}")))
}

pub async fn delete_item(st: &AppState, owner_id: Uuid, id: Uuid) -> AppResult<()> {
    if !st.pantry.delete(owner_id, id).await? {
        return Err(AppError::not_found(format!("pantry item {id}")));
    }
    info!(%owner_id, item_id = %id, "pantry item deleted");
    Ok(())
}

/// Flags every item with this name as in stock or saved for later.
pub async fn set_in_stock(
    st: &AppState,
    owner_id: Uuid,
    name: &str,
    in_stock: bool,
) -> AppResult<u64> {
    let name = required_name("name", name)?;
    let affected = st
        .pantry
        .set_in_stock_by_name(owner_id, &name, in_stock)
        .await?;
    if affected == 0 {
        return Err(AppError::not_found(format!("pantry item named {name:?}")));
    }
    info!(%owner_id, %name, in_stock, affected, "pantry items moved");
    Ok(affected)
}

/// Moves every pantry item named `req.name` onto the shopping list as one
/// entry of `req.category`. Nothing changes when no pantry item matches.
pub async fn move_to_cart(
    st: &AppState,
    owner_id: Uuid,
    req: TransferRequest,
) -> AppResult<MoveToCartResponse> {
    let name = required_name("name", &req.name)?;
    let category: Category = req.category.parse()?;

    let entry = NewShoppingListItem {
        owner_id,
        name: name.clone(),
        category,
    };
    let Some((removed, item)) = st.pantry.move_to_shopping_list(owner_id, &name, entry).await? else {
        return Err(AppError::not_found(format!("pantry item named {name:?}")));
    };

    info!(%owner_id, %name, removed, "moved pantry item to shopping list");
    Ok(MoveToCartResponse { removed, item })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn milk() -> CreatePantryItemRequest {
        CreatePantryItemRequest {
            name: "Milk".into(),
            category: "dairy".into(),
            in_stock: true,
        }
    }

    #[tokio::test]
    async fn add_rejects_unknown_category() {
        let st = AppState::fake();
        let mut req = milk();
        req.category = "Furniture".into();
        let err = add_item(&st, Uuid::new_v4(), req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn saved_for_later_round_trip() {
        let st = AppState::fake();
        let owner = Uuid::new_v4();
        add_item(&st, owner, milk()).await.unwrap();
        add_item(&st, owner, milk()).await.unwrap();

        assert_eq!(set_in_stock(&st, owner, "Milk", false).await.unwrap(), 2);
        assert!(list_items(&st, owner).await.unwrap().iter().all(|i| !i.in_stock));

        assert_eq!(set_in_stock(&st, owner, "Milk", true).await.unwrap(), 2);
        let err = set_in_stock(&st, owner, "Bread", true).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn move_to_cart_transfers_between_collections() {
        let st = AppState::fake();
        let owner = Uuid::new_v4();
        add_item(&st, owner, milk()).await.unwrap();

        let res = move_to_cart(
            &st,
            owner,
            TransferRequest { name: "Milk".into(), category: "Dairy".into() },
        )
        .await
        .unwrap();

        assert_eq!(res.removed, 1);
        assert_eq!(res.item.category, Category::Dairy);
        assert!(list_items(&st, owner).await.unwrap().is_empty());
        assert_eq!(st.shopping.find(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn move_to_cart_of_missing_item_leaves_no_cart_entry() {
        let st = AppState::fake();
        let owner = Uuid::new_v4();
        let err = move_to_cart(
            &st,
            owner,
            TransferRequest { name: "Milk".into(), category: "Dairy".into() },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(st.shopping.find(owner).await.unwrap().is_empty());
    }
}
