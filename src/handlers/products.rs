use axum::{
    extract::{Extension, State},
    http::StatusCode,
};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::id::EntityType;
use crate::models::{Caller, CreateProduct, Product};

use super::{require_admin, require_id};

pub async fn create_product(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CreateProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    require_admin(&caller)?;
    input.validate()?;

    let conn = state.db.get()?;
    let product = queries::create_product(&conn, &input)?;

    tracing::info!(product_id = %product.id, name = %product.name, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_products(&conn)?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    require_id(EntityType::Product, &id)?;

    let conn = state.db.get()?;
    let product = queries::get_product_by_id(&conn, &id)?
        .ok_or_else(|| AppError::NotFound("product".into()))?;
    Ok(Json(product))
}
