use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Meal record as stored and as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub ingredients: Vec<String>,
    pub tags: Vec<String>,
    pub confirmed: bool, // false = draft left behind by an abandoned form
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewMeal {
    pub owner_id: Uuid,
    pub name: String,
    pub ingredients: Vec<String>,
    pub tags: Vec<String>,
    pub confirmed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MealPatch {
    pub name: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub confirmed: Option<bool>,
}

impl MealPatch {
    pub fn apply(self, meal: &mut Meal) {
        if let Some(name) = self.name {
            meal.name = name;
        }
        if let Some(ingredients) = self.ingredients {
            meal.ingredients = ingredients;
        }
        if let Some(tags) = self.tags {
            meal.tags = tags;
        }
        if let Some(confirmed) = self.confirmed {
            meal.confirmed = confirmed;
        }
    }
}
