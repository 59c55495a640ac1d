//! Admin user listing and blocking

mod common;

use common::{bearer, create_admin, create_test_app, register_user};
use serde_json::{json, Value};

/// Test: the user list exposes only public fields
#[tokio::test]
async fn test_list_users() {
    let app = create_test_app();
    register_user(&app, "Alice", "a@x.com", "pw123456").await;
    let admin = create_admin(&app, "admin@x.com").await;

    let (name, value) = bearer(&admin);
    let response = app.server.get("/api/admin/users").add_header(name, value).await;
    assert_eq!(response.status_code(), 200);

    let users: Vec<Value> = response.json();
    assert_eq!(users.len(), 2);

    let alice = users.iter().find(|u| u["email"] == "a@x.com").unwrap();
    assert_eq!(alice["name"], "Alice");
    assert_eq!(alice["role"], "USER");
    assert_eq!(alice["blocked"], false);
    assert!(alice["createdAt"].is_string());
    assert!(alice.get("passwordHash").is_none());
    assert!(alice.get("password_hash").is_none());
}

/// Test: blocking locks the user out and unblocking lets them back in
#[tokio::test]
async fn test_block_and_unblock() {
    let app = create_test_app();
    let customer = register_user(&app, "Alice", "a@x.com", "pw123456").await;
    let admin = create_admin(&app, "admin@x.com").await;

    let (admin_header, admin_value) = bearer(&admin);
    let users: Vec<Value> = app
        .server
        .get("/api/admin/users")
        .add_header(admin_header.clone(), admin_value.clone())
        .await
        .json();
    let alice_id = users
        .iter()
        .find(|u| u["email"] == "a@x.com")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();
    let path = format!("/api/admin/users/{}/block", alice_id);

    let response = app
        .server
        .put(&path)
        .add_header(admin_header.clone(), admin_value.clone())
        .json(&json!({ "blocked": true }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["blocked"], true);
    assert_eq!(body["email"], "a@x.com");

    let (name, value) = bearer(&customer);
    let response = app
        .server
        .get("/api/orders/user")
        .add_header(name.clone(), value.clone())
        .await;
    assert_eq!(response.status_code(), 403);

    let response = app
        .server
        .put(&path)
        .add_header(admin_header, admin_value)
        .json(&json!({ "blocked": false }))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = app.server.get("/api/orders/user").add_header(name, value).await;
    assert_eq!(response.status_code(), 200);
}

/// Test: blocking an unknown user
#[tokio::test]
async fn test_block_unknown_user() {
    let app = create_test_app();
    let admin = create_admin(&app, "admin@x.com").await;
    let (name, value) = bearer(&admin);

    let response = app
        .server
        .put("/api/admin/users/00000000-0000-4000-8000-000000000000/block")
        .add_header(name, value)
        .json(&json!({ "blocked": true }))
        .await;
    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["message"], "User not found");
}
