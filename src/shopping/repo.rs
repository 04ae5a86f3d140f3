use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewShoppingListItem, ShoppingListItem, ShoppingListItemRow, ShoppingPatch};
use crate::pantry::repo_types::{NewPantryItem, PantryItem, PantryItemRow};

#[async_trait]
pub trait ShoppingRepo: Send + Sync {
    async fn find(&self, owner_id: Uuid) -> anyhow::Result<Vec<ShoppingListItem>>;
    async fn create(&self, item: NewShoppingListItem) -> anyhow::Result<ShoppingListItem>;
    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: ShoppingPatch,
    ) -> anyhow::Result<Option<ShoppingListItem>>;
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> anyhow::Result<bool>;
    /// Checks off every entry named `name` and stocks `item` in the pantry,
    /// both or neither. `None` when no entry matched.
    async fn move_to_pantry(
        &self,
        owner_id: Uuid,
        name: &str,
        item: NewPantryItem,
    ) -> anyhow::Result<Option<(u64, PantryItem)>>;
}

#[derive(Clone)]
pub struct PgShoppingRepo {
    db: PgPool,
}

impl PgShoppingRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ShoppingRepo for PgShoppingRepo {
    async fn find(&self, owner_id: Uuid) -> anyhow::Result<Vec<ShoppingListItem>> {
        let rows = sqlx::query_as::<_, ShoppingListItemRow>(
            r#"
            SELECT id, owner_id, name, category, created_at
            FROM shopping_list_items
            WHERE owner_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await
        .context("list shopping list items")?;

        rows.into_iter()
            .map(|r| ShoppingListItem::try_from(r).context("decode shopping list row"))
            .collect()
    }

    async fn create(&self, item: NewShoppingListItem) -> anyhow::Result<ShoppingListItem> {
        let row = sqlx::query_as::<_, ShoppingListItemRow>(
            r#"
            INSERT INTO shopping_list_items (owner_id, name, category)
            VALUES ($1, $2, $3)
            RETURNING id, owner_id, name, category, created_at
            "#,
        )
        .bind(item.owner_id)
        .bind(&item.name)
        .bind(item.category.as_str())
        .fetch_one(&self.db)
        .await
        .context("insert shopping list item")?;
        Ok(ShoppingListItem::try_from(row)?)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: ShoppingPatch,
    ) -> anyhow::Result<Option<ShoppingListItem>> {
        let row = sqlx::query_as::<_, ShoppingListItemRow>(
            r#"
            UPDATE shopping_list_items
               SET name     = COALESCE($3, name),
                   category = COALESCE($4, category)
             WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, name, category, created_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(patch.name)
        .bind(patch.category.map(|c| c.as_str()))
        .fetch_optional(&self.db)
        .await
        .context("update shopping list item")?;
        row.map(ShoppingListItem::try_from)
            .transpose()
            .map_err(Into::into)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM shopping_list_items WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.db)
            .await
            .context("delete shopping list item")?;
        Ok(res.rows_affected() > 0)
    }

    async fn move_to_pantry(
        &self,
        owner_id: Uuid,
        name: &str,
        item: NewPantryItem,
    ) -> anyhow::Result<Option<(u64, PantryItem)>> {
        let mut tx = self.db.begin().await.context("begin shopping list transfer")?;

        let removed =
            sqlx::query("DELETE FROM shopping_list_items WHERE owner_id = $1 AND name = $2")
                .bind(owner_id)
                .bind(name)
                .execute(&mut *tx)
                .await
                .context("delete shopping list items by name")?
                .rows_affected();
        if removed == 0 {
            tx.rollback().await.context("rollback shopping list transfer")?;
            return Ok(None);
        }

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
        .fetch_one(&mut *tx)
        .await
        .context("insert pantry item")?;

        tx.commit().await.context("commit shopping list transfer")?;
        Ok(Some((removed, PantryItem::try_from(row)?)))
    }
}
