use axum::{
    extract::{Extension, State},
    http::StatusCode,
};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::id::EntityType;
use crate::models::{Caller, CreateLicenseType, LicenseType};

use super::{require_admin, require_id};

pub async fn create_license_type(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CreateLicenseType>,
) -> Result<(StatusCode, Json<LicenseType>)> {
    require_admin(&caller)?;
    input.validate()?;

    let conn = state.db.get()?;
    if queries::get_license_type_by_name(&conn, &input.name)?.is_some() {
        return Err(AppError::InvalidState(format!(
            "license type '{}' already exists",
            input.name
        )));
    }

    let license_type = queries::create_license_type(&conn, &input)?;

    tracing::info!(
        license_type_id = %license_type.id,
        default_duration = license_type.default_duration,
        "License type created"
    );
    Ok((StatusCode::CREATED, Json(license_type)))
}

pub async fn list_license_types(State(state): State<AppState>) -> Result<Json<Vec<LicenseType>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_license_types(&conn)?))
}

pub async fn get_license_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LicenseType>> {
    require_id(EntityType::LicenseType, &id)?;

    let conn = state.db.get()?;
    let license_type = queries::get_license_type_by_id(&conn, &id)?
        .ok_or_else(|| AppError::NotFound("license type".into()))?;
    Ok(Json(license_type))
}

/// DELETE /license-types/{id} - refused while any license references the type
pub async fn delete_license_type(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    require_admin(&caller)?;
    require_id(EntityType::LicenseType, &id)?;

    let conn = state.db.get()?;
    if queries::get_license_type_by_id(&conn, &id)?.is_none() {
        return Err(AppError::NotFound("license type".into()));
    }

    let in_use = queries::count_licenses_for_type(&conn, &id)?;
    if in_use > 0 {
        return Err(AppError::InvalidState(format!(
            "license type is used by {} license(s)",
            in_use
        )));
    }

    queries::delete_license_type(&conn, &id)?;
    tracing::info!(license_type_id = %id, "License type deleted");
    Ok(StatusCode::NO_CONTENT)
}
