//! Admin order views and status changes

mod common;

use common::{
    bearer, create_admin, create_test_app, create_test_app_with, place_order, register_user,
    MockEmailSender, TestApp,
};
use pizzahub_core::TransitionPolicy;
use serde_json::{json, Value};

async fn set_status(
    app: &TestApp,
    admin: &str,
    order_id: &str,
    status: &str,
) -> axum_test::TestResponse {
    let (name, value) = bearer(admin);
    app.server
        .put(&format!("/api/admin/orders/{}/status", order_id))
        .add_header(name, value)
        .json(&json!({ "status": status }))
        .await
}

async fn setup(app: &TestApp) -> (String, String) {
    let customer = register_user(app, "Alice", "a@x.com", "pw123456").await;
    let admin = create_admin(app, "admin@x.com").await;
    let order = place_order(app, &customer).await;
    (admin, order["id"].as_str().unwrap().to_string())
}

/// Test: PENDING straight to DELIVERED is allowed and only stamps delivery
#[tokio::test]
async fn test_skip_to_delivered() {
    let app = create_test_app();
    let (admin, order_id) = setup(&app).await;

    let response = set_status(&app, &admin, &order_id, "DELIVERED").await;
    assert_eq!(response.status_code(), 200);

    let order: Value = response.json();
    assert_eq!(order["status"], "DELIVERED");
    assert!(order["deliveredAt"].is_string());
    assert!(order["confirmedAt"].is_null());
    assert_eq!(order["user"]["email"], "a@x.com");
}

/// Test: re-entering a status keeps the time of the first arrival
#[tokio::test]
async fn test_first_arrival_stamp_kept() {
    let app = create_test_app();
    let (admin, order_id) = setup(&app).await;

    let first: Value = set_status(&app, &admin, &order_id, "CONFIRMED").await.json();
    let confirmed_at = first["confirmedAt"].clone();
    assert!(confirmed_at.is_string());

    let back: Value = set_status(&app, &admin, &order_id, "PENDING").await.json();
    assert_eq!(back["status"], "PENDING");
    assert_eq!(back["confirmedAt"], confirmed_at);

    let again: Value = set_status(&app, &admin, &order_id, "CONFIRMED").await.json();
    assert_eq!(again["status"], "CONFIRMED");
    assert_eq!(again["confirmedAt"], confirmed_at);
}

/// Test: each stage is stamped along the normal path
#[tokio::test]
async fn test_happy_path_stamps() {
    let app = create_test_app();
    let (admin, order_id) = setup(&app).await;

    let stages = [
        ("CONFIRMED", "confirmedAt"),
        ("PREPARING", "preparingAt"),
        ("BAKING", "bakingAt"),
        ("OUT_FOR_DELIVERY", "outForDeliveryAt"),
        ("DELIVERED", "deliveredAt"),
    ];

    let mut last = Value::Null;
    for (status, _) in stages {
        let response = set_status(&app, &admin, &order_id, status).await;
        assert_eq!(response.status_code(), 200);
        last = response.json();
    }

    for (_, stamp) in stages {
        assert!(last[stamp].is_string(), "{}", stamp);
    }
    assert!(last["cancelledAt"].is_null());
}

/// Test: unknown labels are rejected without touching the order
#[tokio::test]
async fn test_invalid_status_label() {
    let app = create_test_app();
    let (admin, order_id) = setup(&app).await;

    for label in ["SHIPPED", "confirmed", ""] {
        let response = set_status(&app, &admin, &order_id, label).await;
        assert_eq!(response.status_code(), 400, "{}", label);
        let body: Value = response.json();
        assert_eq!(body["message"], "Invalid status");
    }

    let (name, value) = bearer(&admin);
    let order: Value = app
        .server
        .get(&format!("/api/orders/{}", order_id))
        .add_header(name, value)
        .await
        .json();
    assert_eq!(order["status"], "PENDING");
}

/// Test: status change on an unknown order
#[tokio::test]
async fn test_status_for_missing_order() {
    let app = create_test_app();
    let admin = create_admin(&app, "admin@x.com").await;

    let missing = "00000000-0000-4000-8000-000000000000";
    let response = set_status(&app, &admin, missing, "CONFIRMED").await;
    assert_eq!(response.status_code(), 404);
}

/// Test: the customer sees the admin's change on the next poll
#[tokio::test]
async fn test_customer_sees_status_change() {
    let app = create_test_app();
    let customer = register_user(&app, "Alice", "a@x.com", "pw123456").await;
    let admin = create_admin(&app, "admin@x.com").await;
    let order = place_order(&app, &customer).await;
    let order_id = order["id"].as_str().unwrap();

    set_status(&app, &admin, order_id, "BAKING").await;

    let (name, value) = bearer(&customer);
    let order: Value = app
        .server
        .get(&format!("/api/orders/{}", order_id))
        .add_header(name, value)
        .await
        .json();
    assert_eq!(order["status"], "BAKING");
    assert!(order["bakingAt"].is_string());
    assert!(order.get("user").is_none());
}

/// Test: admin listing covers every customer, newest first, with owners
#[tokio::test]
async fn test_admin_lists_all_orders() {
    let app = create_test_app();
    let alice = register_user(&app, "Alice", "a@x.com", "pw123456").await;
    let bob = register_user(&app, "Bob", "b@x.com", "pw123456").await;
    let admin = create_admin(&app, "admin@x.com").await;

    place_order(&app, &alice).await;
    let newest = place_order(&app, &bob).await;

    let (name, value) = bearer(&admin);
    let response = app.server.get("/api/admin/orders").add_header(name, value).await;
    assert_eq!(response.status_code(), 200);

    let orders: Vec<Value> = response.json();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"], newest["id"]);
    assert_eq!(orders[0]["user"]["name"], "Bob");
    assert_eq!(orders[1]["user"]["email"], "a@x.com");
    assert!(orders[0]["user"].get("passwordHash").is_none());
}

/// Test: the forward-only policy refuses regressions but allows cancelling
#[tokio::test]
async fn test_forward_only_policy() {
    let app = create_test_app_with(TransitionPolicy::ForwardOnly, MockEmailSender::new());
    let (admin, order_id) = setup(&app).await;

    assert_eq!(set_status(&app, &admin, &order_id, "BAKING").await.status_code(), 200);
    assert_eq!(set_status(&app, &admin, &order_id, "CONFIRMED").await.status_code(), 400);
    assert_eq!(set_status(&app, &admin, &order_id, "CANCELLED").await.status_code(), 200);

    // Cancelled is terminal
    let response = set_status(&app, &admin, &order_id, "DELIVERED").await;
    assert_eq!(response.status_code(), 400);
}
