use axum::{
    extract::{Extension, State},
    http::StatusCode,
};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::id::EntityType;
use crate::models::{Caller, CreateUser, User};

use super::{require_admin, require_id};

/// POST /users - admin only; registers a user that licenses can be issued to
pub async fn create_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>)> {
    require_admin(&caller)?;
    input.validate()?;
    let input = input.with_user_role();

    let conn = state.db.get()?;
    if queries::get_user_by_email(&conn, &input.email)?.is_some() {
        return Err(AppError::InvalidState(format!(
            "user '{}' already exists",
            input.email.trim()
        )));
    }

    let user = queries::create_user(&conn, &input)?;

    tracing::info!(user_id = %user.id, admin = user.is_admin(), "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/{id} - admins, or the user themselves
pub async fn get_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<User>> {
    require_id(EntityType::User, &id)?;

    let conn = state.db.get()?;
    let user = queries::get_user_by_id(&conn, &id)?
        .ok_or_else(|| AppError::NotFound("user".into()))?;

    if !caller.is_admin() && !user.email.eq_ignore_ascii_case(caller.identity.trim()) {
        return Err(AppError::Forbidden("users can only view their own account".into()));
    }

    Ok(Json(user))
}
