//! Row mapping trait and helpers for reducing boilerplate in queries.
//!
//! Models implement `FromRow` to define how they are built from a row
//! selected with the matching `*_COLS` constant.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str = "id, email, name, roles, created_at";

pub const PRODUCT_COLS: &str = "id, name, blocked, created_at";

pub const LICENSE_TYPE_COLS: &str = "id, name, default_duration, description, created_at";

pub const LICENSE_COLS: &str = "id, code, user_id, owner_id, product_id, type_id, first_activation_date, ending_date, blocked, device_count, duration, description, created_at";

pub const DEVICE_COLS: &str = "id, mac_address, name, user_id, created_at";

pub const DEVICE_LICENSE_COLS: &str = "id, device_id, license_id, activation_date";

pub const LICENSE_HISTORY_COLS: &str =
    "id, license_id, user_id, status, change_date, description";

/// Split the stored comma-separated role list.
pub fn parse_roles(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .collect()
}

// ============ FromRow Implementations ============

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let roles: String = row.get(3)?;
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            roles: parse_roles(&roles),
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for Product {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Product {
            id: row.get(0)?,
            name: row.get(1)?,
            blocked: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl FromRow for LicenseType {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(LicenseType {
            id: row.get(0)?,
            name: row.get(1)?,
            default_duration: row.get(2)?,
            description: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for License {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(License {
            id: row.get(0)?,
            code: row.get(1)?,
            user_id: row.get(2)?,
            owner_id: row.get(3)?,
            product_id: row.get(4)?,
            license_type_id: row.get(5)?,
            first_activation_date: row.get(6)?,
            ending_date: row.get(7)?,
            blocked: row.get(8)?,
            device_count: row.get(9)?,
            duration: row.get(10)?,
            description: row.get(11)?,
            created_at: row.get(12)?,
        })
    }
}

impl FromRow for Device {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Device {
            id: row.get(0)?,
            mac_address: row.get(1)?,
            name: row.get(2)?,
            user_id: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for DeviceLicense {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(DeviceLicense {
            id: row.get(0)?,
            device_id: row.get(1)?,
            license_id: row.get(2)?,
            activation_date: row.get(3)?,
        })
    }
}

impl FromRow for LicenseHistory {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(LicenseHistory {
            id: row.get(0)?,
            license_id: row.get(1)?,
            user_id: row.get(2)?,
            status: row.get(3)?,
            change_date: row.get(4)?,
            description: row.get(5)?,
        })
    }
}
