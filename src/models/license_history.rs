use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Transition labels written to the license history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display)]
pub enum HistoryStatus {
    Created,
    Activated,
    Renewed,
    Released,
}

impl HistoryStatus {
    /// Default human-readable description for the transition.
    pub fn description(&self) -> &'static str {
        match self {
            HistoryStatus::Created => "License created",
            HistoryStatus::Activated => "License activated on a device",
            HistoryStatus::Renewed => "License validity extended",
            HistoryStatus::Released => "Device removed, activation slot returned",
        }
    }
}

/// Append-only audit row. Never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseHistory {
    pub id: String,
    pub license_id: String,
    pub user_id: String,
    /// Free-text transition label; rows written by this service use `HistoryStatus`.
    pub status: String,
    pub change_date: i64,
    pub description: Option<String>,
}
