use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::pantry::repo_types::{Category, UnknownCategory};

#[derive(Debug, FromRow)]
pub struct ShoppingListItemRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub category: String,
    pub created_at: OffsetDateTime,
}

/// Something the owner still has to buy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingListItem {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub category: Category,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<ShoppingListItemRow> for ShoppingListItem {
    type Error = UnknownCategory;

    fn try_from(r: ShoppingListItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            owner_id: r.owner_id,
            name: r.name,
            category: r.category.parse()?,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewShoppingListItem {
    pub owner_id: Uuid,
    pub name: String,
    pub category: Category,
}

#[derive(Debug, Clone, Default)]
pub struct ShoppingPatch {
    pub name: Option<String>,
    pub category: Option<Category>,
}

impl ShoppingPatch {
    pub fn apply(self, item: &mut ShoppingListItem) {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(category) = self.category {
            item.category = category;
        }
    }
}
