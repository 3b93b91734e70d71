use serde::{Deserialize, Serialize};

/// A physical device, identified naturally by (mac_address, name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub mac_address: String,
    pub name: String,
    /// User that registered the device.
    pub user_id: String,
    pub created_at: i64,
}

/// Binding of one device to one license. At most one per pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceLicense {
    pub id: String,
    pub device_id: String,
    pub license_id: String,
    pub activation_date: i64,
}

#[derive(Debug, Serialize)]
pub struct DeleteDeviceResult {
    pub deleted: bool,
    /// Licenses that got a slot back, with their new remaining slot count.
    pub released: Vec<ReleasedSlot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleasedSlot {
    pub license_id: String,
    pub device_count: i32,
}
