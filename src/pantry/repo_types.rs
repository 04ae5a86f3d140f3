use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Grocery category shared by pantry and shopping-list items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Produce,
    Dairy,
    Meat,
    Seafood,
    Bakery,
    Grains,
    Canned,
    Frozen,
    Spices,
    Snacks,
    Beverages,
    Other,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl Category {
    pub const ALL: [Category; 12] = [
        Category::Produce,
        Category::Dairy,
        Category::Meat,
        Category::Seafood,
        Category::Bakery,
        Category::Grains,
        Category::Canned,
        Category::Frozen,
        Category::Spices,
        Category::Snacks,
        Category::Beverages,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Produce => "Produce",
            Category::Dairy => "Dairy",
            Category::Meat => "Meat",
            Category::Seafood => "Seafood",
            Category::Bakery => "Bakery",
            Category::Grains => "Grains",
            Category::Canned => "Canned",
            Category::Frozen => "Frozen",
            Category::Spices => "Spices",
            Category::Snacks => "Snacks",
            Category::Beverages => "Beverages",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Pantry row as read from the database; category is plain text there.
#[derive(Debug, FromRow)]
pub struct PantryItemRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub category: String,
    pub in_stock: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PantryItem {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub category: Category,
    pub in_stock: bool, // false = saved for later
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<PantryItemRow> for PantryItem {
    type Error = UnknownCategory;

    fn try_from(r: PantryItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            owner_id: r.owner_id,
            name: r.name,
            category: r.category.parse()?,
            in_stock: r.in_stock,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewPantryItem {
    pub owner_id: Uuid,
    pub name: String,
    pub category: Category,
    pub in_stock: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PantryPatch {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub in_stock: Option<bool>,
}

impl PantryPatch {
    pub fn apply(self, item: &mut PantryItem) {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(in_stock) = self.in_stock {
            item.in_stock = in_stock;
        }
    }
}
