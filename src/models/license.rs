use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    pub id: String,
    /// Activation key: 32 uppercase hex characters, immutable after creation.
    pub code: String,
    /// Current holder, bound on first activation.
    pub user_id: Option<String>,
    /// Creator / purchaser.
    pub owner_id: String,
    pub product_id: String,
    pub license_type_id: String,
    pub first_activation_date: i64,
    pub ending_date: i64,
    pub blocked: bool,
    /// Remaining activation slots (never negative).
    pub device_count: i32,
    /// Length of the validity window in days (informational).
    pub duration: i32,
    pub description: String,
    pub created_at: i64,
}

impl License {
    /// True if the user is the owner or the current holder.
    pub fn is_held_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id || self.user_id.as_deref() == Some(user_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLicense {
    pub product_id: String,
    pub owner_id: String,
    pub license_type_id: String,
    pub device_count: i32,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenewLicense {
    pub code: String,
    /// `YYYY-MM-DDTHH:MM:SS`, interpreted as UTC.
    pub new_expiration_date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckLicense {
    pub mac_address: String,
    pub device_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivateLicense {
    pub code: String,
    pub mac_address: String,
    pub device_name: String,
}
