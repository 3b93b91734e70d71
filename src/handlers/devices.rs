use axum::extract::{Extension, State};

use crate::db::AppState;
use crate::error::Result;
use crate::extractors::{Json, Path};
use crate::id::EntityType;
use crate::models::{Caller, DeleteDeviceResult, Device};

use super::require_id;

/// GET /devices - devices registered by the caller
pub async fn list_devices(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<Device>>> {
    Ok(Json(state.engine.list_devices(&caller)?))
}

/// DELETE /devices/{id}
///
/// Removes the device and returns one activation slot to every license it
/// was bound to.
pub async fn delete_device(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(device_id): Path<String>,
) -> Result<Json<DeleteDeviceResult>> {
    require_id(EntityType::Device, &device_id)?;
    Ok(Json(state.engine.delete_device(&caller, &device_id)?))
}
