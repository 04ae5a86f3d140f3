use serde::{Deserialize, Serialize};

use crate::pantry::repo_types::PantryItem;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShoppingItemRequest {
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateShoppingItemRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveToPantryResponse {
    pub removed: u64,
    pub item: PantryItem,
}
