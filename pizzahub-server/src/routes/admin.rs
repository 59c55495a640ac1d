//! Admin panel: order status and user management

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use pizzahub_core::{Error as CoreError, Role};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::orders::ORDER_NOT_FOUND;
use super::{parse_id, ValidJson};
use crate::auth::Identity;
use crate::email::EmailSender;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{
    CatalogStore, Order, OrderId, OrderStore, User, UserId, UserStore, UserSummary,
};

const USER_NOT_FOUND: &str = "User not found";

/// An order with its owner attached
#[derive(Serialize)]
pub struct AdminOrder {
    #[serde(flatten)]
    pub order: Order,
    /// `None` if the owner no longer exists
    pub user: Option<UserSummary>,
}

#[derive(Deserialize, Validate)]
pub struct SetStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub blocked: bool,
}

impl From<User> for AdminUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            blocked: user.blocked,
        }
    }
}

#[derive(Deserialize, Validate)]
pub struct SetBlockedRequest {
    #[serde(default)]
    pub blocked: bool,
}

#[derive(Serialize)]
pub struct BlockedUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub blocked: bool,
}

/// GET /api/admin/orders
pub async fn list_orders<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
) -> Result<Json<Vec<AdminOrder>>, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender,
{
    let orders = state.order_store.list_orders()?;

    let owners: HashMap<UserId, UserSummary> = state
        .user_store
        .list_users()?
        .iter()
        .map(|user| (user.id, UserSummary::from(user)))
        .collect();

    let orders = orders
        .into_iter()
        .map(|order| AdminOrder {
            user: owners.get(&order.user_id).cloned(),
            order,
        })
        .collect();

    Ok(Json(orders))
}

/// PUT /api/admin/orders/:id/status
pub async fn set_order_status<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
    Extension(admin): Extension<Identity>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<SetStatusRequest>,
) -> Result<Json<AdminOrder>, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender,
{
    let order_id: OrderId = parse_id(&id, ORDER_NOT_FOUND)?;
    let mut order = state
        .order_store
        .get_order(order_id)?
        .ok_or(ApiError::NotFound(ORDER_NOT_FOUND))?;

    let now = Utc::now();
    let label = req.status.unwrap_or_default();

    let transition = state
        .lifecycle
        .advance_to_label(&mut order.status, &mut order.timeline, &label, now)
        .map_err(|e| match e {
            CoreError::InvalidStatus(_) => ApiError::Validation("Invalid status".to_string()),
            CoreError::IllegalTransition { from, to } => {
                tracing::warn!(order_id = %order_id, %from, %to, "Rejected status change");
                ApiError::Validation(format!("Cannot change status from {} to {}", from, to))
            }
            other => other.into(),
        })?;

    let order = state
        .order_store
        .record_status(order_id, transition.to, &order.timeline, now)?
        .ok_or(ApiError::NotFound(ORDER_NOT_FOUND))?;

    tracing::info!(
        order_id = %order.id,
        admin_id = %admin.id,
        from = %transition.from,
        to = %transition.to,
        stamped = transition.stamped,
        "Order status changed"
    );

    let user = state
        .user_store
        .get_user(order.user_id)?
        .map(|user| UserSummary::from(&user));

    Ok(Json(AdminOrder { order, user }))
}

/// GET /api/admin/users
pub async fn list_users<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
) -> Result<Json<Vec<AdminUser>>, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender,
{
    let users = state.user_store.list_users()?;
    Ok(Json(users.into_iter().map(AdminUser::from).collect()))
}

/// PUT /api/admin/users/:id/block
pub async fn set_blocked<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
    Extension(admin): Extension<Identity>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<SetBlockedRequest>,
) -> Result<Json<BlockedUser>, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender,
{
    let user_id: UserId = parse_id(&id, USER_NOT_FOUND)?;
    let user = state
        .user_store
        .set_blocked(user_id, req.blocked)?
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;

    tracing::info!(
        user_id = %user.id,
        admin_id = %admin.id,
        blocked = user.blocked,
        "User block flag changed"
    );

    Ok(Json(BlockedUser {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        blocked: user.blocked,
    }))
}
