use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseType {
    pub id: String,
    pub name: String,
    /// Validity window, in days, applied to licenses created with this type.
    pub default_duration: i32,
    pub description: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateLicenseType {
    pub name: String,
    pub default_duration: i32,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateLicenseType {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::InvalidArgument("name cannot be empty".into()));
        }
        if self.default_duration <= 0 {
            return Err(AppError::InvalidArgument(
                "default_duration must be at least one day".into(),
            ));
        }
        Ok(())
    }
}
