use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    meals::{
        repo::MealRepo,
        repo_types::{Meal, MealPatch, NewMeal},
    },
    pantry::{
        repo::PantryRepo,
        repo_types::{NewPantryItem, PantryItem, PantryPatch},
    },
    shopping::{
        repo::ShoppingRepo,
        repo_types::{NewShoppingListItem, ShoppingListItem, ShoppingPatch},
    },
};

#[derive(Default)]
struct Tables {
    meals: Vec<Meal>,
    pantry: Vec<PantryItem>,
    shopping: Vec<ShoppingListItem>,
}

/// In-process stand-in for the database, used when no `DATABASE_URL` is set
/// and by tests. Rows keep insertion order.
#[derive(Clone, Default)]
pub struct MemoryDb {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

fn pantry_row(item: NewPantryItem) -> PantryItem {
    PantryItem {
        id: Uuid::new_v4(),
        owner_id: item.owner_id,
        name: item.name,
        category: item.category,
        in_stock: item.in_stock,
        created_at: OffsetDateTime::now_utc(),
    }
}

fn shopping_row(item: NewShoppingListItem) -> ShoppingListItem {
    ShoppingListItem {
        id: Uuid::new_v4(),
        owner_id: item.owner_id,
        name: item.name,
        category: item.category,
        created_at: OffsetDateTime::now_utc(),
    }
}

#[async_trait]
impl MealRepo for MemoryDb {
    async fn find(&self, owner_id: Uuid) -> anyhow::Result<Vec<Meal>> {
        let t = self.tables.lock();
        Ok(t.meals
            .iter()
            .filter(|m| m.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create(&self, meal: NewMeal) -> anyhow::Result<Meal> {
        let row = Meal {
            id: Uuid::new_v4(),
            owner_id: meal.owner_id,
            name: meal.name,
            ingredients: meal.ingredients,
            tags: meal.tags,
            confirmed: meal.confirmed,
            created_at: OffsetDateTime::now_utc(),
        };
        self.tables.lock().meals.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: MealPatch,
    ) -> anyhow::Result<Option<Meal>> {
        let mut t = self.tables.lock();
        let Some(meal) = t
            .meals
            .iter_mut()
            .find(|m| m.id == id && m.owner_id == owner_id)
        else {
            return Ok(None);
        };
        patch.apply(meal);
        Ok(Some(meal.clone()))
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.tables.lock();
        let before = t.meals.len();
        t.meals.retain(|m| !(m.id == id && m.owner_id == owner_id));
        Ok(t.meals.len() < before)
    }

    async fn delete_unconfirmed(&self, owner_id: Uuid) -> anyhow::Result<u64> {
        let mut t = self.tables.lock();
        let before = t.meals.len();
        t.meals.retain(|m| !(m.owner_id == owner_id && !m.confirmed));
        Ok((before - t.meals.len()) as u64)
    }
}

#[async_trait]
impl PantryRepo for MemoryDb {
    async fn find(&self, owner_id: Uuid) -> anyhow::Result<Vec<PantryItem>> {
        let t = self.tables.lock();
        Ok(t.pantry
            .iter()
            .filter(|i| i.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create(&self, item: NewPantryItem) -> anyhow::Result<PantryItem> {
        let row = pantry_row(item);
        self.tables.lock().pantry.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: PantryPatch,
    ) -> anyhow::Result<Option<PantryItem>> {
        let mut t = self.tables.lock();
        let Some(item) = t
            .pantry
            .iter_mut()
            .find(|i| i.id == id && i.owner_id == owner_id)
        else {
            return Ok(None);
        };
        patch.apply(item);
        Ok(Some(item.clone()))
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.tables.lock();
        let before = t.pantry.len();
        t.pantry.retain(|i| !(i.id == id && i.owner_id == owner_id));
        Ok(t.pantry.len() < before)
    }

    async fn set_in_stock_by_name(
        &self,
        owner_id: Uuid,
        name: &str,
        in_stock: bool,
    ) -> anyhow::Result<u64> {
        let mut t = self.tables.lock();
        let mut affected = 0;
        for item in t
            .pantry
            .iter_mut()
            .filter(|i| i.owner_id == owner_id && i.name == name)
        {
            item.in_stock = in_stock;
            affected += 1;
        }
        Ok(affected)
    }

    async fn move_to_shopping_list(
        &self,
        owner_id: Uuid,
        name: &str,
        entry: NewShoppingListItem,
    ) -> anyhow::Result<Option<(u64, ShoppingListItem)>> {
        let mut t = self.tables.lock();
        let before = t.pantry.len();
        t.pantry
            .retain(|i| !(i.owner_id == owner_id && i.name == name));
        let removed = (before - t.pantry.len()) as u64;
        if removed == 0 {
            return Ok(None);
        }
        let row = shopping_row(entry);
        t.shopping.push(row.clone());
        Ok(Some((removed, row)))
    }
}

#[async_trait]
impl ShoppingRepo for MemoryDb {
    async fn find(&self, owner_id: Uuid) -> anyhow::Result<Vec<ShoppingListItem>> {
        let t = self.tables.lock();
        Ok(t.shopping
            .iter()
            .filter(|i| i.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create(&self, item: NewShoppingListItem) -> anyhow::Result<ShoppingListItem> {
        let row = shopping_row(item);
        self.tables.lock().shopping.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: ShoppingPatch,
    ) -> anyhow::Result<Option<ShoppingListItem>> {
        let mut t = self.tables.lock();
        let Some(item) = t
            .shopping
            .iter_mut()
            .find(|i| i.id == id && i.owner_id == owner_id)
        else {
            return Ok(None);
        };
        patch.apply(item);
        Ok(Some(item.clone()))
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.tables.lock();
        let before = t.shopping.len();
        t.shopping.retain(|i| !(i.id == id && i.owner_id == owner_id));
        Ok(t.shopping.len() < before)
    }

    async fn move_to_pantry(
        &self,
        owner_id: Uuid,
        name: &str,
        item: NewPantryItem,
    ) -> anyhow::Result<Option<(u64, PantryItem)>> {
        let mut t = self.tables.lock();
        let before = t.shopping.len();
        t.shopping
            .retain(|i| !(i.owner_id == owner_id && i.name == name));
        let removed = (before - t.shopping.len()) as u64;
        if removed == 0 {
            return Ok(None);
        }
        let row = pantry_row(item);
        t.pantry.push(row.clone());
        Ok(Some((removed, row)))
    }
}
