use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{ProductError, Result};
use crate::products::dto::ProductParams;
use crate::products::repo::ProductStore;
use crate::products::repo_types::Product;
use crate::products::validation::{validate, FieldErrors};

/// Product operations: validation first, then the store.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn ProductStore>,
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Product>> {
        self.store.list().await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Product> {
        self.store.get(id).await
    }

    #[instrument(skip(self, params))]
    pub async fn create(&self, params: ProductParams) -> Result<Product> {
        let mut candidate = params.into_candidate();
        candidate.available.get_or_insert(true);

        let fields = validate(&candidate).map_err(rejected)?;
        let product = self.store.create(fields).await?;
        info!(id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    #[instrument(skip(self, params))]
    pub async fn update(&self, id: Uuid, params: ProductParams) -> Result<Product> {
        // load-or-fail before anything else
        self.store.get(id).await?;

        // merge + validate again against the locked row, not the copy above
        let product = self
            .store
            .update(
                id,
                Box::new(move |current: &Product| {
                    validate(&params.merged_onto(current)).map_err(rejected)
                }),
            )
            .await?;
        info!(%id, "product updated");
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.store.delete(id).await?;
        info!(%id, "product deleted");
        Ok(())
    }
}

fn rejected(errors: FieldErrors) -> ProductError {
    warn!(fields = ?errors.fields().collect::<Vec<_>>(), "product rejected");
    ProductError::ValidationFailed(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::products::repo::MemoryProductStore;
    use crate::products::testing::{SequentialIds, SteppingClock};
    use crate::products::validation::{BLANK, NEGATIVE, NOT_A_NUMBER};
    use rust_decimal::Decimal;
    use serde_json::json;
    use time::macros::datetime;

    fn service() -> ProductService {
        ProductService::new(Arc::new(MemoryProductStore::with_sources(
            Arc::new(SteppingClock::starting_at(datetime!(2024-03-01 09:00 UTC))),
            Arc::new(SequentialIds::default()),
        )))
    }

    fn params(body: serde_json::Value) -> ProductParams {
        serde_json::from_value(body).unwrap()
    }

    fn validation_errors(err: ProductError) -> FieldErrors {
        match err {
            ProductError::ValidationFailed(errors) => errors,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let svc = service();
        let created = svc
            .create(params(json!({
                "name": "New Test Product",
                "description": "A product created via test",
                "price": 25.50,
                "available": true,
            })))
            .await
            .unwrap();

        assert_eq!(created.name, "New Test Product");
        assert_eq!(created.description.as_deref(), Some("A product created via test"));
        assert_eq!(created.price, Decimal::new(2550, 2));
        assert!(created.available);
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(svc.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn create_defaults_available_to_true() {
        let svc = service();
        let created = svc
            .create(params(json!({ "name": "Default Product", "price": 5.00 })))
            .await
            .unwrap();
        assert!(created.available);
        assert!(svc.get(created.id).await.unwrap().available);
    }

    #[tokio::test]
    async fn create_keeps_explicit_unavailable() {
        let created = service()
            .create(params(json!({ "name": "Hidden", "price": 1, "available": false })))
            .await
            .unwrap();
        assert!(!created.available);
    }

    #[tokio::test]
    async fn invalid_create_stores_nothing() {
        let svc = service();
        let err = svc
            .create(params(json!({ "name": "", "price": -10.00 })))
            .await
            .unwrap_err();
        let errors = validation_errors(err);
        assert_eq!(errors.get("name").unwrap(), [BLANK]);
        assert_eq!(errors.get("price").unwrap(), [NEGATIVE]);
        assert!(svc.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_numeric_price_is_reported() {
        let err = service()
            .create(params(json!({ "name": "p", "price": "invalid" })))
            .await
            .unwrap_err();
        assert_eq!(validation_errors(err).get("price").unwrap(), [NOT_A_NUMBER]);
    }

    #[tokio::test]
    async fn update_merges_and_refreshes_timestamp() {
        let svc = service();
        let original = svc
            .create(params(json!({ "name": "Fixture", "description": "d", "price": 9.99 })))
            .await
            .unwrap();
        let updated = svc
            .update(
                original.id,
                params(json!({ "name": "Updated Product Name", "price": 99.00, "available": false })),
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Updated Product Name");
        assert_eq!(updated.price, Decimal::from(99));
        assert!(!updated.available);
        assert_eq!(updated.description.as_deref(), Some("d"));
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at > original.updated_at);
    }

    #[tokio::test]
    async fn invalid_update_leaves_record_unchanged() {
        let svc = service();
        let original = svc
            .create(params(json!({ "name": "Keep Me", "price": 3 })))
            .await
            .unwrap();

        let err = svc
            .update(original.id, params(json!({ "name": "  " })))
            .await
            .unwrap_err();
        assert_eq!(validation_errors(err).get("name").unwrap(), [BLANK]);

        let err = svc
            .update(original.id, params(json!({ "price": -1 })))
            .await
            .unwrap_err();
        assert_eq!(validation_errors(err).get("price").unwrap(), [NEGATIVE]);

        assert_eq!(svc.get(original.id).await.unwrap(), original);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let svc = service();
        let id = Uuid::from_u128(99_999);
        assert!(matches!(svc.get(id).await, Err(ProductError::NotFound)));
        assert!(matches!(
            svc.update(id, params(json!({ "name": "Bogus Update" }))).await,
            Err(ProductError::NotFound)
        ));
        assert!(matches!(svc.delete(id).await, Err(ProductError::NotFound)));
    }

    #[tokio::test]
    async fn update_of_missing_id_is_not_found_even_with_bad_data() {
        let err = service()
            .update(Uuid::from_u128(5), params(json!({ "name": "" })))
            .await
            .unwrap_err();
        assert!(matches!(err, ProductError::NotFound));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let svc = service();
        let p = svc
            .create(params(json!({ "name": "Doomed", "price": 1 })))
            .await
            .unwrap();
        svc.delete(p.id).await.unwrap();
        assert!(matches!(svc.get(p.id).await, Err(ProductError::NotFound)));
        assert!(svc.list().await.unwrap().is_empty());
    }
}
