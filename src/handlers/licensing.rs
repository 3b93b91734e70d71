use axum::{
    extract::{Extension, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::db::AppState;
use crate::error::Result;
use crate::extractors::{Json, Path};
use crate::id::EntityType;
use crate::licensing::Ticket;
use crate::models::{
    ActivateLicense, Caller, CheckLicense, CreateLicense, License, LicenseHistory, RenewLicense,
};

use super::require_id;

#[derive(Debug, Serialize)]
pub struct RenewResponse {
    pub ticket: Ticket,
    pub ending_date: i64,
}

/// POST /licensing/create - admin only
pub async fn create_license(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CreateLicense>,
) -> Result<(StatusCode, Json<License>)> {
    let license = state.engine.create_license(&caller, &input)?;
    Ok((StatusCode::CREATED, Json(license)))
}

/// POST /licensing/update - extend the validity window of a license
pub async fn renew_license(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<RenewLicense>,
) -> Result<Json<RenewResponse>> {
    let renewal = state.engine.renew_license(&caller, &input)?;
    Ok(Json(RenewResponse {
        ticket: renewal.ticket,
        ending_date: renewal.license.ending_date,
    }))
}

/// POST /licensing/check
pub async fn check_license(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CheckLicense>,
) -> Result<Json<Ticket>> {
    Ok(Json(state.engine.check_license(&caller, &input)?))
}

/// POST /licensing/activation
pub async fn activate_license(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<ActivateLicense>,
) -> Result<Json<Ticket>> {
    Ok(Json(state.engine.activate_license(&caller, &input)?))
}

/// GET /licenses/{id}/history - newest entry first
pub async fn license_history(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(license_id): Path<String>,
) -> Result<Json<Vec<LicenseHistory>>> {
    require_id(EntityType::License, &license_id)?;
    Ok(Json(state.engine.license_history(&caller, &license_id)?))
}
