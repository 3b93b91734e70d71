use rusqlite::Connection;

/// Initialize the database schema. Idempotent.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Users (identity; roles are a comma-separated list)
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            roles TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            blocked INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS license_types (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            default_duration INTEGER NOT NULL CHECK (default_duration > 0),
            description TEXT,
            created_at INTEGER NOT NULL
        );

        -- Licenses (code is the activation key; device_count = remaining slots)
        CREATE TABLE IF NOT EXISTS licenses (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            user_id TEXT REFERENCES users(id),
            owner_id TEXT NOT NULL REFERENCES users(id),
            product_id TEXT NOT NULL REFERENCES products(id),
            type_id TEXT NOT NULL REFERENCES license_types(id),
            first_activation_date INTEGER NOT NULL,
            ending_date INTEGER NOT NULL,
            blocked INTEGER NOT NULL DEFAULT 0,
            device_count INTEGER NOT NULL CHECK (device_count >= 0),
            duration INTEGER NOT NULL,
            description TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_licenses_owner ON licenses(owner_id);
        CREATE INDEX IF NOT EXISTS idx_licenses_type ON licenses(type_id);

        -- Devices (natural key: mac_address + name)
        CREATE TABLE IF NOT EXISTS devices (
            id TEXT PRIMARY KEY,
            mac_address TEXT NOT NULL,
            name TEXT NOT NULL,
            user_id TEXT NOT NULL REFERENCES users(id),
            created_at INTEGER NOT NULL,
            UNIQUE(mac_address, name)
        );
        CREATE INDEX IF NOT EXISTS idx_devices_user ON devices(user_id);

        -- Device <-> license bindings (one per pair)
        CREATE TABLE IF NOT EXISTS device_licenses (
            id TEXT PRIMARY KEY,
            device_id TEXT NOT NULL REFERENCES devices(id),
            license_id TEXT NOT NULL REFERENCES licenses(id),
            activation_date INTEGER NOT NULL,
            UNIQUE(device_id, license_id)
        );
        CREATE INDEX IF NOT EXISTS idx_device_licenses_license ON device_licenses(license_id);

        -- License history (append-only)
        CREATE TABLE IF NOT EXISTS license_history (
            id TEXT PRIMARY KEY,
            license_id TEXT NOT NULL REFERENCES licenses(id),
            user_id TEXT NOT NULL,
            status TEXT NOT NULL,
            change_date INTEGER NOT NULL,
            description TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_license_history_license ON license_history(license_id, change_date);

        CREATE TRIGGER IF NOT EXISTS license_history_no_update
        BEFORE UPDATE ON license_history
        BEGIN
            SELECT RAISE(ABORT, 'license history is append-only');
        END;

        CREATE TRIGGER IF NOT EXISTS license_history_no_delete
        BEFORE DELETE ON license_history
        BEGIN
            SELECT RAISE(ABORT, 'license history is append-only');
        END;
        "#,
    )?;
    Ok(())
}
