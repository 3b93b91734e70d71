use rusqlite::Connection;

use crate::db::queries;
use crate::error::{AppError, Result};
use crate::models::{HistoryStatus, LicenseHistory};

/// Append one immutable history row.
///
/// Storage failures surface as `Internal`; the caller's transaction decides
/// whether the enclosing change is rolled back.
pub fn record_change(
    conn: &Connection,
    license_id: &str,
    user_id: &str,
    status: HistoryStatus,
    change_date: i64,
    description: Option<&str>,
) -> Result<LicenseHistory> {
    let description = description.unwrap_or(status.description());

    queries::create_license_history(
        conn,
        license_id,
        user_id,
        status.as_ref(),
        change_date,
        Some(description),
    )
    .map_err(|e| {
        tracing::error!(license_id, status = %status, "Failed to record license history: {}", e);
        AppError::Internal(format!("failed to record license history: {}", e))
    })
}
