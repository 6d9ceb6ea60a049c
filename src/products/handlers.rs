use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{ProductError, Result};
use crate::products::dto::ProductParams;
use crate::products::repo_types::Product;
use crate::state::AppState;

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(show_product)
                .patch(update_product)
                .put(update_product)
                .delete(destroy_product),
        )
}

/// Ids that don't parse can't name a stored record.
fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| {
        debug!(id = %raw, "unparseable product id");
        ProductError::NotFound
    })
}

/// Decode failures are the client's fault, not a validation outcome.
fn product_params(body: std::result::Result<Json<Value>, JsonRejection>) -> Result<ProductParams> {
    let Json(body) = body.map_err(|rejection| {
        debug!(error = %rejection.body_text(), "unreadable product body");
        ProductError::BadRequest(rejection.body_text())
    })?;
    ProductParams::from_body(body)
}

#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.products.list().await?))
}

#[instrument(skip(state))]
pub async fn show_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let id = parse_id(&id)?;
    Ok(Json(state.products.get(id).await?))
}

#[instrument(skip(state, body))]
pub async fn create_product(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let params = product_params(body)?;
    let product = state.products.create(params).await?;
    let location = format!("/products/{}", product.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(product),
    ))
}

#[instrument(skip(state, body))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Product>> {
    let id = parse_id(&id)?;
    let params = product_params(body)?;
    Ok(Json(state.products.update(id, params).await?))
}

#[instrument(skip(state))]
pub async fn destroy_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_id(&id)?;
    state.products.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
