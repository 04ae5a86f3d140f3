use serde::{Deserialize, Serialize};

use crate::shopping::repo_types::ShoppingListItem;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePantryItemRequest {
    pub name: String,
    pub category: String,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

fn default_in_stock() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePantryItemRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
}

/// Targets every item of the owner carrying this exact name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ByNameRequest {
    pub name: String,
}

/// Moves an item between pantry and shopping list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResponse {
    pub affected: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveToCartResponse {
    pub removed: u64,
    pub item: ShoppingListItem,
}
