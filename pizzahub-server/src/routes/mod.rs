//! HTTP routes for the ordering service

mod admin;
mod auth;
mod orders;
mod pizzas;
mod upload;

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, FromRequest, Request};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use axum::{async_trait, Json, Router};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use validator::Validate;

use crate::auth::{require_admin, require_auth, require_customer};
use crate::email::EmailSender;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{CatalogStore, OrderStore, UserStore};

/// JSON body that has passed its field validation rules.
///
/// Malformed bodies and failed rules are both reported as 400.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| ApiError::Validation(e.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Parse an id from the path. Ids that cannot exist are reported as missing.
fn parse_id<T: FromStr>(raw: &str, not_found: &'static str) -> Result<T, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound(not_found))
}

async fn index() -> Json<Value> {
    Json(json!({ "message": "Pizza Ordering Backend" }))
}

/// Create the router with all routes
pub fn create_router<U, C, O, E>(state: Arc<AppState<U, C, O, E>>) -> Router
where
    U: UserStore + 'static,
    C: CatalogStore + 'static,
    O: OrderStore + 'static,
    E: EmailSender + 'static,
{
    let uploads_dir = state.uploads.dir.clone();

    // Layers run bottom-up: authenticate, then check the role
    let customer = Router::new()
        .route("/api/orders", post(orders::create_order))
        .route("/api/orders/user", get(orders::list_my_orders))
        .route("/api/orders/:id", get(orders::get_order))
        .route_layer(from_fn(require_customer))
        .route_layer(from_fn_with_state(state.clone(), require_auth::<U, C, O, E>));

    let admin = Router::new()
        .route("/api/admin/orders", get(admin::list_orders))
        .route("/api/admin/orders/:id/status", put(admin::set_order_status))
        .route(
            "/api/admin/pizzas",
            get(pizzas::list_all_pizzas).post(pizzas::create_pizza),
        )
        .route(
            "/api/admin/pizzas/:id",
            put(pizzas::update_pizza).delete(pizzas::delete_pizza),
        )
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/:id/block", put(admin::set_blocked))
        .route(
            "/api/admin/upload",
            post(upload::upload_image).layer(DefaultBodyLimit::max(upload::MAX_UPLOAD_BYTES)),
        )
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), require_auth::<U, C, O, E>));

    Router::new()
        .route("/", get(index))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/verify", post(auth::verify))
        .route("/api/auth/resend", post(auth::resend))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/admin/login", post(auth::admin_login))
        .route("/api/pizzas", get(pizzas::list_menu))
        .route("/api/pizzas/:id", get(pizzas::get_pizza))
        .merge(customer)
        .merge(admin)
        // Uploaded images
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
