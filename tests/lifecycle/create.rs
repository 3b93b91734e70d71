//! CreateLicense tests

#[path = "../common/mod.rs"]
mod common;

use common::*;
use licensing::licensing::DEFAULT_DESCRIPTION;

#[test]
fn test_create_license_sets_validity_window_from_type() {
    let fx = setup_fixture();

    let license = fx.create_license(3);

    assert_eq!(
        license.first_activation_date % SECONDS_PER_DAY,
        0,
        "first activation date should be truncated to midnight"
    );
    assert_eq!(
        license.ending_date - license.first_activation_date,
        i64::from(DEFAULT_DURATION_DAYS) * SECONDS_PER_DAY,
        "ending date should be default_duration days after first activation date"
    );
    assert_eq!(license.duration, DEFAULT_DURATION_DAYS);
    assert_eq!(license.device_count, 3, "device_count should be as requested");
    assert!(!license.blocked, "new license should not be blocked");
    assert!(license.user_id.is_none(), "new license should have no holder");
    assert_eq!(license.owner_id, fx.owner.id);
    assert_eq!(license.product_id, fx.product.id);
    assert_eq!(license.license_type_id, fx.license_type.id);
}

#[test]
fn test_create_license_is_persisted_with_generated_code() {
    let fx = setup_fixture();

    let license = fx.create_license(1);

    assert_eq!(license.code.len(), 32, "code should be 32 characters");
    assert!(
        license
            .code
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)),
        "code should be uppercase hexadecimal without separators"
    );

    let conn = fx.state.db.get().unwrap();
    let stored = queries::get_license_by_code(&conn, &license.code)
        .unwrap()
        .expect("license should be retrievable by code");
    assert_eq!(stored.id, license.id);
    assert_eq!(stored.ending_date, license.ending_date);
}

#[test]
fn test_create_license_codes_are_distinct() {
    let fx = setup_fixture();

    let codes: std::collections::HashSet<String> =
        (0..20).map(|_| fx.create_license(1).code).collect();

    assert_eq!(codes.len(), 20, "every license should get its own code");
}

#[test]
fn test_create_license_uses_default_description() {
    let fx = setup_fixture();

    let license = fx.create_license(1);
    assert_eq!(license.description, DEFAULT_DESCRIPTION);

    let mut input = fx.create_input(1);
    input.description = Some("Site license for the lab".to_string());
    let custom = fx
        .engine()
        .create_license(&admin_caller(), &input)
        .unwrap();
    assert_eq!(custom.description, "Site license for the lab");
}

#[test]
fn test_create_license_records_created_history() {
    let fx = setup_fixture();

    let license = fx.create_license(1);
    let history = fx.history(&license.id);

    assert_eq!(history.len(), 1, "creation should append exactly one history row");
    assert_eq!(history[0].status, HistoryStatus::Created.to_string());
    assert_eq!(history[0].user_id, fx.owner.id);
}

#[test]
fn test_create_license_requires_admin() {
    let fx = setup_fixture();

    let result = fx
        .engine()
        .create_license(&user_caller(OWNER_EMAIL), &fx.create_input(1));
    assert!(
        matches!(result, Err(AppError::Forbidden(_))),
        "non-admin should be forbidden, got {:?}",
        result
    );

    let result = fx
        .engine()
        .create_license(&anonymous_caller(), &fx.create_input(1));
    assert!(
        matches!(result, Err(AppError::Unauthenticated)),
        "caller without roles should be unauthenticated, got {:?}",
        result
    );
}

#[test]
fn test_create_license_missing_references() {
    let fx = setup_fixture();

    let mut input = fx.create_input(1);
    input.product_id = "prod_00000000000000000000000000000000".to_string();
    let result = fx.engine().create_license(&admin_caller(), &input);
    assert!(matches!(result, Err(AppError::NotFound(ref what)) if what == "product"));

    let mut input = fx.create_input(1);
    input.owner_id = "usr_00000000000000000000000000000000".to_string();
    let result = fx.engine().create_license(&admin_caller(), &input);
    assert!(matches!(result, Err(AppError::NotFound(ref what)) if what == "owner"));

    let mut input = fx.create_input(1);
    input.license_type_id = "ltyp_00000000000000000000000000000000".to_string();
    let result = fx.engine().create_license(&admin_caller(), &input);
    assert!(matches!(result, Err(AppError::NotFound(ref what)) if what == "license type"));
}

#[test]
fn test_create_license_for_blocked_product_fails() {
    let fx = setup_fixture();
    {
        let conn = fx.state.db.get().unwrap();
        block_product(&conn, &fx.product.id);
    }

    let result = fx.engine().create_license(&admin_caller(), &fx.create_input(1));

    assert!(
        matches!(result, Err(AppError::InvalidState(_))),
        "blocked product should refuse new licenses, got {:?}",
        result
    );
    let conn = fx.state.db.get().unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM licenses", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0, "no license should be stored");
}

#[test]
fn test_create_license_rejects_negative_device_count() {
    let fx = setup_fixture();

    let result = fx.engine().create_license(&admin_caller(), &fx.create_input(-1));

    assert!(matches!(result, Err(AppError::InvalidArgument(_))));
}

#[test]
fn test_create_license_with_zero_slots_is_allowed() {
    let fx = setup_fixture();

    let license = fx.create_license(0);

    assert_eq!(license.device_count, 0);
}
