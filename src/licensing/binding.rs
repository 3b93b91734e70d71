//! Device binding: natural-key device resolution, capacity-checked binding
//! and slot release on device deletion.
//!
//! Every function here expects to run inside the caller's transaction.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::{AppError, Result};
use crate::models::{
    DeleteDeviceResult, Device, DeviceLicense, HistoryStatus, License, ReleasedSlot,
};

use super::history::record_change;

pub const NO_SLOTS_REMAINING: &str = "no activation slots remaining";
pub const ALREADY_ACTIVATED: &str = "already activated on this device";

/// Find the device registered under (mac_address, name) or register it for `user_id`.
///
/// An existing device is reused as-is, whoever registered it.
pub fn resolve_device(
    conn: &Connection,
    mac_address: &str,
    name: &str,
    user_id: &str,
) -> Result<Device> {
    if let Some(device) = queries::get_device_by_mac_and_name(conn, mac_address, name)? {
        tracing::debug!(device_id = %device.id, "Reusing registered device");
        return Ok(device);
    }

    let device = queries::create_device(conn, mac_address, name, user_id)?;
    tracing::debug!(device_id = %device.id, "Registered new device");
    Ok(device)
}

/// Bind `device` to `license`, consuming one slot.
///
/// The slot is taken with a conditional decrement, so a concurrent activation
/// that drained the license in the meantime still fails cleanly.
pub fn bind_device(
    conn: &Connection,
    device: &Device,
    license: &License,
    activation_date: i64,
) -> Result<DeviceLicense> {
    if license.device_count <= 0 {
        return Err(AppError::InvalidState(NO_SLOTS_REMAINING.into()));
    }

    if queries::get_device_license(conn, &device.id, &license.id)?.is_some() {
        return Err(AppError::InvalidState(ALREADY_ACTIVATED.into()));
    }

    let binding = queries::create_device_license(conn, &device.id, &license.id, activation_date)?;

    let remaining = queries::take_device_slot(conn, &license.id)?
        .ok_or_else(|| AppError::InvalidState(NO_SLOTS_REMAINING.into()))?;

    tracing::debug!(
        license_id = %license.id,
        device_id = %device.id,
        remaining,
        "Activation slot consumed"
    );

    Ok(binding)
}

/// Bindings of one device, split by whether a given user owns or holds the bound license.
#[derive(Debug, Default)]
pub struct DeviceBindings {
    pub own: Vec<DeviceLicense>,
    pub foreign: Vec<DeviceLicense>,
}

/// Split the bindings of `device` by license ownership for `user_id`.
///
/// A binding whose license is gone counts as the registrant's own.
pub fn partition_bindings(
    conn: &Connection,
    device: &Device,
    user_id: &str,
) -> Result<DeviceBindings> {
    let mut split = DeviceBindings::default();

    for binding in queries::list_bindings_for_device(conn, &device.id)? {
        let own = match queries::get_license_by_id(conn, &binding.license_id)? {
            Some(license) => license.is_held_by(user_id),
            None => device.user_id == user_id,
        };
        if own {
            split.own.push(binding);
        } else {
            split.foreign.push(binding);
        }
    }

    Ok(split)
}

/// Delete `bindings`, returning one slot to each bound license.
///
/// `actor_id` is recorded as the user on the `Released` history rows.
pub fn release_bindings(
    conn: &Connection,
    bindings: &[DeviceLicense],
    actor_id: &str,
    now: i64,
) -> Result<Vec<ReleasedSlot>> {
    let mut released = Vec::with_capacity(bindings.len());

    for binding in bindings {
        match queries::return_device_slot(conn, &binding.license_id)? {
            Some(device_count) => {
                record_change(
                    conn,
                    &binding.license_id,
                    actor_id,
                    HistoryStatus::Released,
                    now,
                    None,
                )?;
                released.push(ReleasedSlot {
                    license_id: binding.license_id.clone(),
                    device_count,
                });
            }
            None => {
                // Foreign keys normally prevent this; drop the binding anyway.
                tracing::warn!(
                    binding_id = %binding.id,
                    license_id = %binding.license_id,
                    "Binding references a missing license"
                );
            }
        }
        queries::delete_device_license(conn, &binding.id)?;
    }

    Ok(released)
}

/// Remove a device and every binding it holds, returning one slot per binding.
pub fn release_device(
    conn: &Connection,
    device: &Device,
    actor_id: &str,
    now: i64,
) -> Result<DeleteDeviceResult> {
    let bindings = queries::list_bindings_for_device(conn, &device.id)?;
    let released = release_bindings(conn, &bindings, actor_id, now)?;
    let deleted = queries::delete_device(conn, &device.id)?;

    Ok(DeleteDeviceResult { deleted, released })
}
