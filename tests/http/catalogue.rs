//! Product, license type and user routes

#[path = "../common/mod.rs"]
mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn test_product_crud() {
    let state = create_test_app_state();

    let response = send(
        app(state.clone()),
        "POST",
        "/products",
        Some(&admin_bearer()),
        Some(json!({ "name": "Editor Pro" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let product = body_json(response).await;
    let id = product["id"].as_str().unwrap();
    assert_eq!(product["blocked"], false);

    let response = send(
        app(state.clone()),
        "GET",
        &format!("/products/{}", id),
        Some(&user_bearer(OWNER_EMAIL)),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "Editor Pro");

    let response = send(app(state), "GET", "/products", Some(&user_bearer(OWNER_EMAIL)), None).await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_product_creation_requires_admin_and_name() {
    let state = create_test_app_state();

    let response = send(
        app(state.clone()),
        "POST",
        "/products",
        Some(&user_bearer(OWNER_EMAIL)),
        Some(json!({ "name": "Sneaky" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        app(state),
        "POST",
        "/products",
        Some(&admin_bearer()),
        Some(json!({ "name": "   " })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let state = create_test_app_state();

    let response = send(
        app(state),
        "GET",
        "/products/prod_00000000000000000000000000000000",
        Some(&user_bearer(OWNER_EMAIL)),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_license_type_lifecycle() {
    let state = create_test_app_state();

    let response = send(
        app(state.clone()),
        "POST",
        "/license-types",
        Some(&admin_bearer()),
        Some(json!({ "name": "Quarterly", "default_duration": 90 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let license_type = body_json(response).await;
    let id = license_type["id"].as_str().unwrap().to_string();

    let response = send(
        app(state.clone()),
        "POST",
        "/license-types",
        Some(&admin_bearer()),
        Some(json!({ "name": "Quarterly", "default_duration": 91 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT, "names are unique");

    let response = send(
        app(state.clone()),
        "GET",
        &format!("/license-types/{}", id),
        Some(&user_bearer(OWNER_EMAIL)),
        None,
    )
    .await;
    assert_eq!(body_json(response).await["default_duration"], 90);

    let response = send(
        app(state.clone()),
        "DELETE",
        &format!("/license-types/{}", id),
        Some(&admin_bearer()),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        app(state),
        "GET",
        &format!("/license-types/{}", id),
        Some(&user_bearer(OWNER_EMAIL)),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_license_type_rejects_non_positive_duration() {
    let state = create_test_app_state();

    let response = send(
        app(state),
        "POST",
        "/license-types",
        Some(&admin_bearer()),
        Some(json!({ "name": "Never", "default_duration": 0 })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_license_type_in_use_cannot_be_deleted() {
    let fx = setup_fixture();
    fx.create_license(1);

    let response = send(
        app(fx.state.clone()),
        "DELETE",
        &format!("/license-types/{}", fx.license_type.id),
        Some(&admin_bearer()),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let conn = fx.state.db.get().unwrap();
    assert!(queries::get_license_type_by_id(&conn, &fx.license_type.id).unwrap().is_some());
}

#[tokio::test]
async fn test_created_user_can_own_a_license() {
    let state = create_test_app_state();
    let (product, license_type) = {
        let conn = state.db.get().unwrap();
        (
            create_test_product(&conn, "Editor Pro"),
            create_test_license_type(&conn, "Monthly", DEFAULT_DURATION_DAYS),
        )
    };

    let response = send(
        app(state.clone()),
        "POST",
        "/users",
        Some(&admin_bearer()),
        Some(json!({ "email": "Buyer@Example.com", "name": "Buyer" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let user = body_json(response).await;
    assert_eq!(user["email"], "buyer@example.com");
    assert_eq!(user["roles"], json!([ROLE_USER]));
    let user_id = user["id"].as_str().unwrap().to_string();

    let response = send(
        app(state.clone()),
        "POST",
        "/licensing/create",
        Some(&admin_bearer()),
        Some(json!({
            "product_id": product.id,
            "owner_id": user_id,
            "license_type_id": license_type.id,
            "device_count": 1,
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let code = body_json(response).await["code"].as_str().unwrap().to_string();

    let response = send(
        app(state),
        "POST",
        "/licensing/activation",
        Some(&user_bearer("buyer@example.com")),
        Some(json!({ "code": code, "mac_address": "AA:BB", "device_name": "laptop" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["holder_id"], user_id.as_str());
}

#[tokio::test]
async fn test_user_creation_rules() {
    let state = create_test_app_state();
    let body = json!({ "email": "buyer@example.com", "name": "Buyer", "roles": [ROLE_USER] });

    let response = send(
        app(state.clone()),
        "POST",
        "/users",
        Some(&user_bearer(OWNER_EMAIL)),
        Some(body.clone()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(app(state.clone()), "POST", "/users", Some(&admin_bearer()), Some(body.clone())).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(app(state.clone()), "POST", "/users", Some(&admin_bearer()), Some(body)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT, "email is unique");

    let response = send(
        app(state),
        "POST",
        "/users",
        Some(&admin_bearer()),
        Some(json!({ "email": "x@example.com", "name": "X", "roles": ["ROLE_ROOT"] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_user_visibility() {
    let state = create_test_app_state();
    let (owner, other) = {
        let conn = state.db.get().unwrap();
        (
            create_test_user(&conn, OWNER_EMAIL, &[ROLE_USER]),
            create_test_user(&conn, OTHER_EMAIL, &[ROLE_USER]),
        )
    };
    let uri = format!("/users/{}", owner.id);

    let response = send(app(state.clone()), "GET", &uri, Some(&user_bearer(OWNER_EMAIL)), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["id"], owner.id.as_str());

    let response = send(app(state.clone()), "GET", &uri, Some(&admin_bearer()), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(app(state.clone()), "GET", &uri, Some(&user_bearer(&other.email)), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        app(state.clone()),
        "GET",
        "/users/usr_00000000000000000000000000000000",
        Some(&admin_bearer()),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(app(state), "GET", "/users/not-an-id", Some(&admin_bearer()), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
