//! Common test utilities for service integration tests

#![allow(dead_code)]

use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use pizzahub_core::{Lifecycle, Role, TokenService, TransitionPolicy};
use pizzahub_server::crypto::hash_password;
use pizzahub_server::store::NewUser;
use pizzahub_server::{
    routes, AppState, EmailSender, InMemoryCatalogStore, InMemoryOrderStore, InMemoryUserStore,
    UploadSettings, UserStore,
};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const TEST_SECRET: &str = "test-secret";
pub const PUBLIC_BASE_URL: &str = "http://pizza.test";

/// Mock email sender that captures verification codes
#[derive(Default, Clone)]
pub struct MockEmailSender {
    /// Captured (email, code) pairs
    pub sent: Arc<RwLock<Vec<(String, String)>>>,
    /// Record the code but report a delivery failure
    pub fail: bool,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Get the last verification code sent to an email
    pub fn get_code(&self, email: &str) -> Option<String> {
        self.sent
            .read()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| e == email)
            .map(|(_, c)| c.clone())
    }

    pub fn count_for(&self, email: &str) -> usize {
        self.sent
            .read()
            .unwrap()
            .iter()
            .filter(|(e, _)| e == email)
            .count()
    }

    /// Emails go out in the background, so poll until the nth one lands
    pub async fn wait_for_code(&self, email: &str, nth: usize) -> String {
        for _ in 0..200 {
            if self.count_for(email) >= nth {
                if let Some(code) = self.get_code(email) {
                    return code;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("No verification code sent to {}", email);
    }
}

impl EmailSender for MockEmailSender {
    fn send_verification(&self, email: &str, _name: &str, code: &str) -> Result<(), String> {
        self.sent
            .write()
            .unwrap()
            .push((email.to_string(), code.to_string()));

        if self.fail {
            return Err("mock relay refused the message".to_string());
        }
        Ok(())
    }
}

/// A running test server plus handles on its stores
pub struct TestApp {
    pub server: TestServer,
    pub email: MockEmailSender,
    pub users: Arc<InMemoryUserStore>,
    pub catalog: Arc<InMemoryCatalogStore>,
    pub orders: Arc<InMemoryOrderStore>,
    pub uploads: TempDir,
}

/// Create a test server with the default (permissive) lifecycle
pub fn create_test_app() -> TestApp {
    create_test_app_with(TransitionPolicy::Permissive, MockEmailSender::new())
}

pub fn create_test_app_with(policy: TransitionPolicy, email: MockEmailSender) -> TestApp {
    let users = Arc::new(InMemoryUserStore::new());
    let catalog = Arc::new(InMemoryCatalogStore::new());
    let orders = Arc::new(InMemoryOrderStore::new());
    let uploads = TempDir::new().expect("Failed to create uploads dir");

    let state = Arc::new(
        AppState::new(
            TokenService::new(TEST_SECRET),
            users.clone(),
            catalog.clone(),
            orders.clone(),
            email.clone(),
        )
        .with_lifecycle(Lifecycle::new(policy))
        .with_uploads(UploadSettings {
            dir: uploads.path().to_path_buf(),
            public_base_url: Some(PUBLIC_BASE_URL.to_string()),
        }),
    );

    let app = routes::create_router(state);
    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp {
        server,
        email,
        users,
        catalog,
        orders,
        uploads,
    }
}

/// `Authorization` header for a session token
pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

/// Register, verify and return the session token
pub async fn register_user(app: &TestApp, name: &str, email: &str, password: &str) -> String {
    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({
            "name": name,
            "email": email,
            "password": password,
            "phone": "555-0100"
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let code = app.email.wait_for_code(email, 1).await;

    let response = app
        .server
        .post("/api/auth/verify")
        .json(&json!({ "email": email, "code": code }))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    body["token"].as_str().expect("No token").to_string()
}

/// Insert a verified admin directly and log in through the admin endpoint
pub async fn create_admin(app: &TestApp, email: &str) -> String {
    app.users
        .create_user(NewUser {
            name: "Admin".to_string(),
            email: email.to_string(),
            password_hash: hash_password("adminpass").unwrap(),
            phone: None,
            role: Role::Admin,
            verified: true,
        })
        .unwrap();

    let response = app
        .server
        .post("/api/auth/admin/login")
        .json(&json!({ "email": email, "password": "adminpass" }))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    body["token"].as_str().expect("No token").to_string()
}

/// Two Margheritas at 299, total 598
pub fn sample_order() -> Value {
    json!({
        "items": [
            { "id": "cart-1", "pizzaId": "p-1", "name": "Margherita", "size": "medium",
              "crust": "thin", "toppings": [], "quantity": 1, "price": 299 },
            { "id": "cart-2", "pizzaId": "p-1", "name": "Margherita", "size": "medium",
              "crust": "classic", "toppings": [], "quantity": 1, "price": 299 }
        ],
        "total": 598,
        "payment": "cod",
        "address": "1 Main St",
        "phone": "555-0100"
    })
}

/// Place the sample order and return it
pub async fn place_order(app: &TestApp, token: &str) -> Value {
    let (name, value) = bearer(token);
    let response = app
        .server
        .post("/api/orders")
        .add_header(name, value)
        .json(&sample_order())
        .await;
    assert_eq!(response.status_code(), 200);
    response.json()
}
