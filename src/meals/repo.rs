use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Meal, MealPatch, NewMeal};

/// Meal persistence, always scoped to one owner.
#[async_trait]
pub trait MealRepo: Send + Sync {
    async fn find(&self, owner_id: Uuid) -> anyhow::Result<Vec<Meal>>;
    async fn create(&self, meal: NewMeal) -> anyhow::Result<Meal>;
    async fn update(&self, owner_id: Uuid, id: Uuid, patch: MealPatch)
        -> anyhow::Result<Option<Meal>>;
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> anyhow::Result<bool>;
    /// Removes the owner's drafts; returns how many were removed.
    async fn delete_unconfirmed(&self, owner_id: Uuid) -> anyhow::Result<u64>;
}

#[derive(Clone)]
pub struct PgMealRepo {
    db: PgPool,
}

impl PgMealRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MealRepo for PgMealRepo {
    async fn find(&self, owner_id: Uuid) -> anyhow::Result<Vec<Meal>> {
        let rows = sqlx::query_as::<_, Meal>(
            r#"
            SELECT id, owner_id, name, ingredients, tags, confirmed, created_at
            FROM meals
            WHERE owner_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn create(&self, meal: NewMeal) -> anyhow::Result<Meal> {
        let row = sqlx::query_as::<_, Meal>(
            r#"
            INSERT INTO meals (owner_id, name, ingredients, tags, confirmed)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, name, ingredients, tags, confirmed, created_at
            "#,
        )
        .bind(meal.owner_id)
        .bind(&meal.name)
        .bind(&meal.ingredients)
        .bind(&meal.tags)
        .bind(meal.confirmed)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: MealPatch,
    ) -> anyhow::Result<Option<Meal>> {
        let row = sqlx::query_as::<_, Meal>(
            r#"
            UPDATE meals
               SET name        = COALESCE($3, name),
                   ingredients = COALESCE($4, ingredients),
                   tags        = COALESCE($5, tags),
                   confirmed   = COALESCE($6, confirmed)
             WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, name, ingredients, tags, confirmed, created_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(patch.name)
        .bind(patch.ingredients)
        .bind(patch.tags)
        .bind(patch.confirmed)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM meals WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_unconfirmed(&self, owner_id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM meals WHERE owner_id = $1 AND confirmed = FALSE")
            .bind(owner_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }
}
