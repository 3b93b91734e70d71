mod devices;
mod license_types;
mod licensing;
mod products;
mod users;

pub use devices::*;
pub use license_types::*;
pub use licensing::*;
pub use products::*;
pub use users::*;

use axum::{
    Json, Router, middleware,
    routing::{delete, get, post},
};
use serde::Serialize;

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::id::EntityType;
use crate::middleware::require_caller;
use crate::models::Caller;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn require_admin(caller: &Caller) -> Result<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("administrator role required".into()))
    }
}

/// Reject path ids that cannot belong to `entity` before any lookup.
fn require_id(entity: EntityType, raw: &str) -> Result<()> {
    if entity.is_valid_id(raw) {
        Ok(())
    } else {
        Err(AppError::InvalidArgument(format!(
            "malformed id '{}', expected {}_<32 hex chars>",
            raw,
            entity.prefix()
        )))
    }
}

pub fn router(state: AppState) -> Router<AppState> {
    let authenticated = Router::new()
        // License lifecycle
        .route("/licensing/create", post(create_license))
        .route("/licensing/update", post(renew_license))
        .route("/licensing/check", post(check_license))
        .route("/licensing/activation", post(activate_license))
        .route("/licenses/{id}/history", get(license_history))
        // Devices
        .route("/devices", get(list_devices))
        .route("/devices/{id}", delete(delete_device))
        // Catalogue
        .route("/license-types", post(create_license_type).get(list_license_types))
        .route(
            "/license-types/{id}",
            get(get_license_type).delete(delete_license_type),
        )
        .route("/products", post(create_product).get(list_products))
        .route("/products/{id}", get(get_product))
        // Users
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user))
        .layer(middleware::from_fn_with_state(state, require_caller));

    Router::new()
        .route("/health", get(health))
        .merge(authenticated)
}
