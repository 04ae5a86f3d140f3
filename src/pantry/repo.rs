use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewPantryItem, PantryItem, PantryItemRow, PantryPatch};
use crate::shopping::repo_types::{NewShoppingListItem, ShoppingListItem, ShoppingListItemRow};

/// Pantry persistence. The by-name calls touch every item of the owner with
/// that exact name and report how many rows they affected.
#[async_trait]
pub trait PantryRepo: Send + Sync {
    async fn find(&self, owner_id: Uuid) -> anyhow::Result<Vec<PantryItem>>;
    async fn create(&self, item: NewPantryItem) -> anyhow::Result<PantryItem>;
    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: PantryPatch,
    ) -> anyhow::Result<Option<PantryItem>>;
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> anyhow::Result<bool>;
    async fn set_in_stock_by_name(
        &self,
        owner_id: Uuid,
        name: &str,
        in_stock: bool,
    ) -> anyhow::Result<u64>;
    /// Deletes every pantry item named `name` and adds `entry` to the
    /// shopping list, both or neither. `None` when no pantry item matched.
    async fn move_to_shopping_list(
        &self,
        owner_id: Uuid,
        name: &str,
        entry: NewShoppingListItem,
    ) -> anyhow::Result<Option<(u64, ShoppingListItem)>>;
}

#[derive(Clone)]
pub struct PgPantryRepo {
    db: PgPool,
}

impl PgPantryRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_items(rows: Vec<PantryItemRow>) -> anyhow::Result<Vec<PantryItem>> {
    rows.into_iter()
        .map(|r| PantryItem::try_from(r).context("decode pantry row"))
        .collect()
}

#[async_trait]
impl PantryRepo for PgPantryRepo {
    async fn find(&self, owner_id: Uuid) -> anyhow::Result<Vec<PantryItem>> {
        let rows = sqlx::query_as::<_, PantryItemRow>(
            r#"
            SELECT id, owner_id, name, category, in_stock, created_at
            FROM pantry_items
            WHERE owner_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await
        .context("list pantry items")?;
        into_items(rows)
    }

    async fn create(&self, item: NewPantryItem) -> anyhow::Result<PantryItem> {
        let row = sqlx::query_as::<_, PantryItemRow>(
            r#"
            INSERT INTO pantry_items (owner_id, name, category, in_stock)
            VALUES ($1, $2, $3, $4)
            RETURNING id, owner_id, name, category, in_stock, created_at
            "#,
        )
        .bind(item.owner_id)
        .bind(&item.name)
        .bind(item.category.as_str())
        .bind(item.in_stock)
        .fetch_one(&self.db)
        .await
        .context("insert pantry item")?;
        Ok(PantryItem::try_from(row)?)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: PantryPatch,
    ) -> anyhow::Result<Option<PantryItem>> {
        let row = sqlx::query_as::<_, PantryItemRow>(
            r#"
            UPDATE pantry_items
               SET name     = COALESCE($3, name),
                   category = COALESCE($4, category),
                   in_stock = COALESCE($5, in_stock)
             WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, name, category, in_stock, created_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(patch.name)
        .bind(patch.category.map(|c| c.as_str()))
        .bind(patch.in_stock)
        .fetch_optional(&self.db)
        .await
        .context("update pantry item")?;
        row.map(PantryItem::try_from).transpose().map_err(Into::into)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM pantry_items WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.db)
            .await
            .context("delete pantry item")?;
        Ok(res.rows_affected() > 0)
    }

    async fn set_in_stock_by_name(
        &self,
        owner_id: Uuid,
        name: &str,
        in_stock: bool,
    ) -> anyhow::Result<u64> {
        let res = sqlx::query(
            "UPDATE pantry_items SET in_stock = $3 WHERE owner_id = $1 AND name = $2",
        )
        .bind(owner_id)
        .bind(name)
        .bind(in_stock)
        .execute(&self.db)
        .await
        .context("update pantry items by name")?;
        Ok(res.rows_affected())
    }

    async fn move_to_shopping_list(
        &self,
        owner_id: Uuid,
        name: &str,
        entry: NewShoppingListItem,
    ) -> anyhow::Result<Option<(u64, ShoppingListItem)>> {
        let mut tx = self.db.begin().await.context("begin pantry transfer")?;

        let removed = sqlx::query("DELETE FROM pantry_items WHERE owner_id = $1 AND name = $2")
            .bind(owner_id)
            .bind(name)
            .execute(&mut *tx)
            .await
            .context("delete pantry items by name")?
            .rows_affected();
        if removed == 0 {
            tx.rollback().await.context("rollback pantry transfer")?;
            return Ok(None);
        }

        let row = sqlx::query_as::<_, ShoppingListItemRow>(
            r#"
            INSERT INTO shopping_list_items (owner_id, name, category)
            VALUES ($1, $2, $3)
            RETURNING id, owner_id, name, category, created_at
            "#,
        )
        .bind(entry.owner_id)
        .bind(&entry.name)
        .bind(entry.category.as_str())
        .fetch_one(&mut *tx)
        .await
        .context("insert shopping list item")?;

        tx.commit().await.context("commit pantry transfer")?;
        Ok(Some((removed, ShoppingListItem::try_from(row)?)))
    }
}
