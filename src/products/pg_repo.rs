use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ProductError, Result};
use crate::products::repo::{touch, Clock, IdGenerator, MergeFn, ProductStore, RandomIds, SystemClock};
use crate::products::repo_types::Product;
use crate::products::validation::ProductFields;

/// PostgreSQL-backed store over the `products` table.
#[derive(Clone)]
pub struct PgProductStore {
    db: PgPool,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl PgProductStore {
    pub fn new(db: PgPool) -> Self {
        Self::with_sources(db, Arc::new(SystemClock), Arc::new(RandomIds))
    }

    pub fn with_sources(db: PgPool, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { db, clock, ids }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn list(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, available, created_at, updated_at
              FROM products
             ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Product> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, available, created_at, updated_at
              FROM products
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ProductError::NotFound)
    }

    async fn create(&self, fields: ProductFields) -> Result<Product> {
        let now = self.clock.now();
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (id, name, description, price, available, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id, name, description, price, available, created_at, updated_at
            "#,
        )
        .bind(self.ids.next_id())
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.price)
        .bind(fields.available)
        .bind(now)
        .fetch_one(&self.db)
        .await?;
        Ok(product)
    }

    async fn update(&self, id: Uuid, merge: MergeFn) -> Result<Product> {
        let mut tx = self.db.begin().await?;

        // row lock held until commit; concurrent writers to this id wait here
        let current = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, available, created_at, updated_at
              FROM products
             WHERE id = $1
               FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ProductError::NotFound)?;

        let fields = merge(&current)?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
               SET name = $2, description = $3, price = $4, available = $5, updated_at = $6
             WHERE id = $1
            RETURNING id, name, description, price, available, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.price)
        .bind(fields.available)
        .bind(touch(current.created_at, self.clock.now()))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(%id, "product row updated");
        Ok(product)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let done = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if done.rows_affected() == 0 {
            return Err(ProductError::NotFound);
        }
        Ok(())
    }
}
