use axum::{
    RequestExt,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::db::AppState;
use crate::error::{AppError, Result};

/// Resolve the caller from the bearer token and attach it as a `Caller` extension.
///
/// A missing, malformed, expired or role-less credential is `Unauthenticated`.
pub async fn require_caller(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let TypedHeader(auth) = request
        .extract_parts::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|_| AppError::Unauthenticated)?;

    let caller = state.tokens.verify(auth.token())?;
    if !caller.is_authenticated() {
        tracing::debug!(identity = %caller.identity, "Token carries no roles");
        return Err(AppError::Unauthenticated);
    }

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}
