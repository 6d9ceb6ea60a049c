use crate::config::AppConfig;
use crate::products::{
    pg_repo::PgProductStore,
    repo::{MemoryProductStore, ProductStore},
    services::ProductService,
};
use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Present only with the Postgres backend.
    pub db: Option<PgPool>,
    pub config: Arc<AppConfig>,
    pub products: ProductService,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set; products are kept in memory");
            return Ok(Self::from_parts(None, config, Arc::new(MemoryProductStore::new())));
        };

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(db_config.max_connections)
            .connect(&db_config.url)
            .await
            .context("connect to database")?;

        let store = Arc::new(PgProductStore::new(db.clone())) as Arc<dyn ProductStore>;
        Ok(Self::from_parts(Some(db), config, store))
    }

    pub fn from_parts(db: Option<PgPool>, config: Arc<AppConfig>, store: Arc<dyn ProductStore>) -> Self {
        Self {
            db,
            config,
            products: ProductService::new(store),
        }
    }

    #[cfg(test)]
    pub fn fake(store: Arc<dyn ProductStore>) -> Self {
        let config = Arc::new(AppConfig {
            server: crate::config::ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
            },
            database: None,
        });
        Self::from_parts(None, config, store)
    }
}
