//! Every mutation the client can trigger, and the optimistic change each
//! one makes to the cache before the server answers.

use time::OffsetDateTime;
use uuid::Uuid;

use super::coordinator::Patch;
use crate::{
    meals::repo_types::{Meal, MealPatch},
    pantry::repo_types::{Category, PantryItem, PantryPatch},
    shopping::repo_types::{ShoppingListItem, ShoppingPatch},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    AddMeal,
    EditMeal,
    DeleteMeal,
    AddPantryItem,
    EditPantryItem,
    DeletePantryItem,
    MoveToSaved,
    MoveFromSaved,
    MoveToCart,
    AddShoppingItem,
    EditShoppingItem,
    DeleteShoppingItem,
    MoveToPantry,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::AddMeal => "add meal",
            Action::EditMeal => "update meal",
            Action::DeleteMeal => "delete meal",
            Action::AddPantryItem => "add pantry item",
            Action::EditPantryItem => "update pantry item",
            Action::DeletePantryItem => "delete pantry item",
            Action::MoveToSaved => "save item for later",
            Action::MoveFromSaved => "restock item",
            Action::MoveToCart => "move item to shopping list",
            Action::AddShoppingItem => "add shopping list item",
            Action::EditShoppingItem => "update shopping list item",
            Action::DeleteShoppingItem => "delete shopping list item",
            Action::MoveToPantry => "move item to pantry",
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Action::AddMeal => "Meal added",
            Action::EditMeal => "Meal updated",
            Action::DeleteMeal => "Meal deleted",
            Action::AddPantryItem => "Pantry item added",
            Action::EditPantryItem => "Pantry item updated",
            Action::DeletePantryItem => "Pantry item deleted",
            Action::MoveToSaved => "Saved for later",
            Action::MoveFromSaved => "Back in stock",
            Action::MoveToCart => "Moved to shopping list",
            Action::AddShoppingItem => "Shopping list item added",
            Action::EditShoppingItem => "Shopping list item updated",
            Action::DeleteShoppingItem => "Shopping list item deleted",
            Action::MoveToPantry => "Moved to pantry",
        }
    }
}

// --- provisional records ---
//
// Stand-ins shown until the next read replaces them with the server's rows.
// Ids are random and never sent back to the server.

pub fn provisional_meal(
    owner: Uuid,
    name: String,
    ingredients: Vec<String>,
    tags: Vec<String>,
    confirmed: bool,
) -> Meal {
    Meal {
        id: Uuid::new_v4(),
        owner_id: owner,
        name,
        ingredients,
        tags,
        confirmed,
        created_at: OffsetDateTime::now_utc(),
    }
}

pub fn provisional_pantry_item(owner: Uuid, name: String, category: Category, in_stock: bool) -> PantryItem {
    PantryItem {
        id: Uuid::new_v4(),
        owner_id: owner,
        name,
        category,
        in_stock,
        created_at: OffsetDateTime::now_utc(),
    }
}

pub fn provisional_shopping_item(owner: Uuid, name: String, category: Category) -> ShoppingListItem {
    ShoppingListItem {
        id: Uuid::new_v4(),
        owner_id: owner,
        name,
        category,
        created_at: OffsetDateTime::now_utc(),
    }
}

// --- meals ---

/// Drafts never show up in listings, so only confirmed meals are appended.
pub fn add_meal(meal: Meal) -> Patch {
    Patch::meals(meal.owner_id, move |meals| {
        if meal.confirmed {
            meals.push(meal);
        }
    })
}

pub fn edit_meal(owner: Uuid, id: Uuid, patch: MealPatch) -> Patch {
    Patch::meals(owner, move |meals| {
        if let Some(meal) = meals.iter_mut().find(|m| m.id == id) {
            patch.apply(meal);
        }
        meals.retain(|m| m.confirmed);
    })
}

pub fn remove_meal(owner: Uuid, id: Uuid) -> Patch {
    Patch::meals(owner, move |meals| meals.retain(|m| m.id != id))
}

// --- pantry ---

pub fn add_pantry_item(item: PantryItem) -> Patch {
    Patch::pantry(item.owner_id, move |items| items.push(item))
}

pub fn edit_pantry_item(owner: Uuid, id: Uuid, patch: PantryPatch) -> Patch {
    Patch::pantry(owner, move |items| {
        if let Some(item) = items.iter_mut().find(|i| i.id == id) {
            patch.apply(item);
        }
    })
}

pub fn remove_pantry_item(owner: Uuid, id: Uuid) -> Patch {
    Patch::pantry(owner, move |items| items.retain(|i| i.id != id))
}

/// Flips `in_stock` on every pantry item with this exact name.
pub fn set_in_stock(owner: Uuid, name: String, in_stock: bool) -> Patch {
    Patch::pantry(owner, move |items| {
        items
            .iter_mut()
            .filter(|i| i.name == name)
            .for_each(|i| i.in_stock = in_stock);
    })
}

/// Takes every pantry item named like `entry` out of the pantry and puts
/// `entry` on the shopping list.
pub fn move_to_cart(entry: ShoppingListItem) -> [Patch; 2] {
    let owner = entry.owner_id;
    let name = entry.name.clone();
    [
        Patch::pantry(owner, move |items| items.retain(|i| i.name != name)),
        Patch::shopping_list(owner, move |items| items.push(entry)),
    ]
}

// --- shopping list ---

pub fn add_shopping_item(item: ShoppingListItem) -> Patch {
    Patch::shopping_list(item.owner_id, move |items| items.push(item))
}

pub fn edit_shopping_item(owner: Uuid, id: Uuid, patch: ShoppingPatch) -> Patch {
    Patch::shopping_list(owner, move |items| {
        if let Some(item) = items.iter_mut().find(|i| i.id == id) {
            patch.apply(item);
        }
    })
}

pub fn remove_shopping_item(owner: Uuid, id: Uuid) -> Patch {
    Patch::shopping_list(owner, move |items| items.retain(|i| i.id != id))
}

/// Checks off every shopping-list entry named like `stocked` and puts
/// `stocked` in the pantry.
pub fn move_to_pantry(stocked: PantryItem) -> [Patch; 2] {
    let owner = stocked.owner_id;
    let name = stocked.name.clone();
    [
        Patch::shopping_list(owner, move |items| items.retain(|i| i.name != name)),
        Patch::pantry(owner, move |items| items.push(stocked)),
    ]
}
