use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;
use crate::id::EntityType;
use crate::models::*;

use super::from_row::{
    DEVICE_COLS, DEVICE_LICENSE_COLS, LICENSE_COLS, LICENSE_HISTORY_COLS, LICENSE_TYPE_COLS,
    PRODUCT_COLS, USER_COLS, query_all, query_one,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

// ============ Users ============

pub fn create_user(conn: &Connection, input: &CreateUser) -> Result<User> {
    let id = EntityType::User.gen_id();
    let now = now();
    let email = input.email.trim().to_lowercase();
    let roles = input.roles.join(",");

    conn.execute(
        "INSERT INTO users (id, email, name, roles, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, &email, &input.name, &roles, now],
    )?;

    Ok(User {
        id,
        email,
        name: input.name.clone(),
        roles: input.roles.clone(),
        created_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let email = email.trim().to_lowercase();
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
        &[&email],
    )
}

pub fn count_users(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
        .map_err(Into::into)
}

// ============ Products ============

pub fn create_product(conn: &Connection, input: &CreateProduct) -> Result<Product> {
    let id = EntityType::Product.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO products (id, name, blocked, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![&id, &input.name, input.blocked, now],
    )?;

    Ok(Product {
        id,
        name: input.name.clone(),
        blocked: input.blocked,
        created_at: now,
    })
}

pub fn get_product_by_id(conn: &Connection, id: &str) -> Result<Option<Product>> {
    query_one(
        conn,
        &format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLS),
        &[&id],
    )
}

pub fn list_products(conn: &Connection) -> Result<Vec<Product>> {
    query_all(
        conn,
        &format!("SELECT {} FROM products ORDER BY created_at, id", PRODUCT_COLS),
        &[],
    )
}

// ============ License Types ============

pub fn create_license_type(conn: &Connection, input: &CreateLicenseType) -> Result<LicenseType> {
    let id = EntityType::LicenseType.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO license_types (id, name, default_duration, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, &input.name, input.default_duration, &input.description, now],
    )?;

    Ok(LicenseType {
        id,
        name: input.name.clone(),
        default_duration: input.default_duration,
        description: input.description.clone(),
        created_at: now,
    })
}

pub fn get_license_type_by_id(conn: &Connection, id: &str) -> Result<Option<LicenseType>> {
    query_one(
        conn,
        &format!("SELECT {} FROM license_types WHERE id = ?1", LICENSE_TYPE_COLS),
        &[&id],
    )
}

pub fn get_license_type_by_name(conn: &Connection, name: &str) -> Result<Option<LicenseType>> {
    query_one(
        conn,
        &format!("SELECT {} FROM license_types WHERE name = ?1", LICENSE_TYPE_COLS),
        &[&name],
    )
}

pub fn list_license_types(conn: &Connection) -> Result<Vec<LicenseType>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM license_types ORDER BY name",
            LICENSE_TYPE_COLS
        ),
        &[],
    )
}

pub fn count_licenses_for_type(conn: &Connection, type_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM licenses WHERE type_id = ?1",
        params![type_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

pub fn delete_license_type(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM license_types WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

// ============ Licenses ============

/// Persist a fully-built license. `code` uniqueness is enforced by the schema.
pub fn insert_license(conn: &Connection, license: &License) -> Result<()> {
    conn.execute(
        "INSERT INTO licenses (id, code, user_id, owner_id, product_id, type_id, first_activation_date, ending_date, blocked, device_count, duration, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            &license.id,
            &license.code,
            &license.user_id,
            &license.owner_id,
            &license.product_id,
            &license.license_type_id,
            license.first_activation_date,
            license.ending_date,
            license.blocked,
            license.device_count,
            license.duration,
            &license.description,
            license.created_at
        ],
    )?;
    Ok(())
}

pub fn get_license_by_id(conn: &Connection, id: &str) -> Result<Option<License>> {
    query_one(
        conn,
        &format!("SELECT {} FROM licenses WHERE id = ?1", LICENSE_COLS),
        &[&id],
    )
}

pub fn get_license_by_code(conn: &Connection, code: &str) -> Result<Option<License>> {
    query_one(
        conn,
        &format!("SELECT {} FROM licenses WHERE code = ?1", LICENSE_COLS),
        &[&code],
    )
}

pub fn update_license_ending_date(
    conn: &Connection,
    id: &str,
    ending_date: i64,
    duration: i32,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE licenses SET ending_date = ?1, duration = ?2 WHERE id = ?3",
        params![ending_date, duration, id],
    )?;
    Ok(affected > 0)
}

/// Bind the holder only if none is set yet. Returns false when a holder exists.
pub fn set_license_holder_if_unset(conn: &Connection, id: &str, user_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE licenses SET user_id = ?1 WHERE id = ?2 AND user_id IS NULL",
        params![user_id, id],
    )?;
    Ok(affected > 0)
}

/// Consume one activation slot. Returns the remaining count, or None when
/// the license has no slot left (or does not exist). Single statement, so
/// two writers can never both take the last slot.
pub fn take_device_slot(conn: &Connection, id: &str) -> Result<Option<i32>> {
    conn.query_row(
        "UPDATE licenses SET device_count = device_count - 1
         WHERE id = ?1 AND device_count > 0
         RETURNING device_count",
        params![id],
        |row| row.get(0),
    )
    .optional()
    .map_err(Into::into)
}

/// Return one activation slot. Returns the new count, or None if the license is missing.
pub fn return_device_slot(conn: &Connection, id: &str) -> Result<Option<i32>> {
    conn.query_row(
        "UPDATE licenses SET device_count = device_count + 1 WHERE id = ?1 RETURNING device_count",
        params![id],
        |row| row.get(0),
    )
    .optional()
    .map_err(Into::into)
}

// ============ Devices ============

pub fn create_device(
    conn: &Connection,
    mac_address: &str,
    name: &str,
    user_id: &str,
) -> Result<Device> {
    let id = EntityType::Device.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO devices (id, mac_address, name, user_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, mac_address, name, user_id, now],
    )?;

    Ok(Device {
        id,
        mac_address: mac_address.to_string(),
        name: name.to_string(),
        user_id: user_id.to_string(),
        created_at: now,
    })
}

pub fn get_device_by_id(conn: &Connection, id: &str) -> Result<Option<Device>> {
    query_one(
        conn,
        &format!("SELECT {} FROM devices WHERE id = ?1", DEVICE_COLS),
        &[&id],
    )
}

pub fn get_device_by_mac_and_name(
    conn: &Connection,
    mac_address: &str,
    name: &str,
) -> Result<Option<Device>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM devices WHERE mac_address = ?1 AND name = ?2",
            DEVICE_COLS
        ),
        &[&mac_address, &name],
    )
}

pub fn list_devices_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Device>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM devices WHERE user_id = ?1 ORDER BY created_at, id",
            DEVICE_COLS
        ),
        &[&user_id],
    )
}

pub fn delete_device(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM devices WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

// ============ Device Bindings ============

pub fn create_device_license(
    conn: &Connection,
    device_id: &str,
    license_id: &str,
    activation_date: i64,
) -> Result<DeviceLicense> {
    let id = EntityType::DeviceLicense.gen_id();

    conn.execute(
        "INSERT INTO device_licenses (id, device_id, license_id, activation_date) VALUES (?1, ?2, ?3, ?4)",
        params![&id, device_id, license_id, activation_date],
    )?;

    Ok(DeviceLicense {
        id,
        device_id: device_id.to_string(),
        license_id: license_id.to_string(),
        activation_date,
    })
}

pub fn get_device_license(
    conn: &Connection,
    device_id: &str,
    license_id: &str,
) -> Result<Option<DeviceLicense>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM device_licenses WHERE device_id = ?1 AND license_id = ?2",
            DEVICE_LICENSE_COLS
        ),
        &[&device_id, &license_id],
    )
}

/// Most recent binding of a device.
pub fn get_binding_for_device(conn: &Connection, device_id: &str) -> Result<Option<DeviceLicense>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM device_licenses WHERE device_id = ?1
             ORDER BY activation_date DESC, id DESC LIMIT 1",
            DEVICE_LICENSE_COLS
        ),
        &[&device_id],
    )
}

/// Most recent binding of a license.
pub fn get_binding_for_license(
    conn: &Connection,
    license_id: &str,
) -> Result<Option<DeviceLicense>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM device_licenses WHERE license_id = ?1
             ORDER BY activation_date DESC, id DESC LIMIT 1",
            DEVICE_LICENSE_COLS
        ),
        &[&license_id],
    )
}

pub fn list_bindings_for_device(conn: &Connection, device_id: &str) -> Result<Vec<DeviceLicense>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM device_licenses WHERE device_id = ?1 ORDER BY activation_date, id",
            DEVICE_LICENSE_COLS
        ),
        &[&device_id],
    )
}

pub fn delete_device_license(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM device_licenses WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

// ============ License History ============

pub fn create_license_history(
    conn: &Connection,
    license_id: &str,
    user_id: &str,
    status: &str,
    change_date: i64,
    description: Option<&str>,
) -> Result<LicenseHistory> {
    let id = EntityType::LicenseHistory.gen_id();

    conn.execute(
        "INSERT INTO license_history (id, license_id, user_id, status, change_date, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, license_id, user_id, status, change_date, description],
    )?;

    Ok(LicenseHistory {
        id,
        license_id: license_id.to_string(),
        user_id: user_id.to_string(),
        status: status.to_string(),
        change_date,
        description: description.map(String::from),
    })
}

/// History rows for a license, newest first.
pub fn list_license_history(conn: &Connection, license_id: &str) -> Result<Vec<LicenseHistory>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM license_history WHERE license_id = ?1
             ORDER BY change_date DESC, rowid DESC",
            LICENSE_HISTORY_COLS
        ),
        &[&license_id],
    )
}
