//! Customer order endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::{Extension, Json};
use pizzahub_core::Price;
use serde::Deserialize;
use validator::Validate;

use super::{parse_id, ValidJson};
use crate::auth::Identity;
use crate::email::EmailSender;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{
    items_total, CatalogStore, LineItem, NewOrder, Order, OrderId, OrderStore, UserStore,
};

pub(super) const ORDER_NOT_FOUND: &str = "Order not found";

/// Tax the checkout adds on top of the item subtotal, in percent
const CHECKOUT_TAX_PERCENT: i64 = 5;

/// Whether `total` is the item subtotal, with or without checkout tax.
/// Tax rounds half up to a whole unit.
fn total_matches(total: i64, subtotal: i64) -> bool {
    let tax = (subtotal * CHECKOUT_TAX_PERCENT + 50).div_euclid(100);
    total == subtotal || total == subtotal + tax
}

#[derive(Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Option<Vec<LineItem>>,
    #[serde(default)]
    pub total: Option<Price>,
    #[serde(default)]
    pub payment: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CreateOrderRequest {
    /// Every required field present and non-empty
    fn into_new_order(self, identity: &Identity) -> Result<NewOrder, ApiError> {
        let missing = || ApiError::Validation("Missing fields".to_string());
        let present = |s: Option<String>| s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let items = self.items.filter(|items| !items.is_empty()).ok_or_else(missing)?;
        let total = self.total.filter(|t| t.amount() != 0).ok_or_else(missing)?;
        let address = present(self.address).ok_or_else(missing)?;
        let phone = present(self.phone).ok_or_else(missing)?;

        Ok(NewOrder {
            user_id: identity.id,
            items,
            total: total.amount(),
            payment: present(self.payment),
            address,
            phone,
        })
    }
}

/// POST /api/orders
pub async fn create_order<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
    Extension(identity): Extension<Identity>,
    ValidJson(req): ValidJson<CreateOrderRequest>,
) -> Result<Json<Order>, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender,
{
    let new_order = req.into_new_order(&identity)?;

    // The client total is what the customer agreed to pay. Mismatches are
    // only flagged, and only when every line carries a price.
    if let Some(computed) = items_total(&new_order.items) {
        if !total_matches(new_order.total, computed) {
            tracing::warn!(
                user_id = %identity.id,
                total = new_order.total,
                computed,
                "Order total differs from line items"
            );
        }
    }

    let order = state.order_store.create_order(new_order)?;

    tracing::info!(
        order_id = %order.id,
        user_id = %order.user_id,
        items = order.items.len(),
        total = order.total,
        "Order placed"
    );

    Ok(Json(order))
}

/// GET /api/orders/user
pub async fn list_my_orders<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Order>>, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender,
{
    Ok(Json(state.order_store.list_orders_for_user(identity.id)?))
}

/// GET /api/orders/:id
pub async fn get_order<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender,
{
    let order_id: OrderId = parse_id(&id, ORDER_NOT_FOUND)?;
    let order = state
        .order_store
        .get_order(order_id)?
        .ok_or(ApiError::NotFound(ORDER_NOT_FOUND))?;

    if !identity.can_access(order.user_id) {
        tracing::warn!(
            order_id = %order.id,
            user_id = %identity.id,
            "Rejected access to another user's order"
        );
        return Err(ApiError::Forbidden);
    }

    Ok(Json(order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UserId;
    use pizzahub_core::Role;
    use serde_json::json;

    fn identity() -> Identity {
        Identity {
            id: UserId::new(),
            role: Role::User,
        }
    }

    fn request(body: serde_json::Value) -> CreateOrderRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_complete_request_accepted() {
        let order = request(json!({
            "items": [{"name": "Margherita", "price": 299, "quantity": 2}],
            "total": "598",
            "payment": "cod",
            "address": "1 Main St",
            "phone": "555-0100"
        }))
        .into_new_order(&identity())
        .unwrap();

        assert_eq!(order.total, 598);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.payment.as_deref(), Some("cod"));
    }

    #[test]
    fn test_total_matches_with_or_without_tax() {
        // 2 x 449 = 898, tax 44.9 rounds to 45
        assert!(total_matches(898, 898));
        assert!(total_matches(943, 898));
        assert!(!total_matches(944, 898));
        assert!(!total_matches(500, 898));

        // 10 x 5% = 0.5 rounds up
        assert!(total_matches(11, 10));
    }

    #[test]
    fn test_cart_total_from_customization_prices() {
        let order = request(json!({
            "items": [
                {"pizzaId": "p-1", "crust": "thin", "quantity": 2, "customizationPrice": 449},
                {"pizzaId": "p-2", "crust": "pan", "quantity": 1, "customizationPrice": 299}
            ],
            "total": 1257,
            "address": "1 Main St",
            "phone": "555-0100"
        }))
        .into_new_order(&identity())
        .unwrap();

        let subtotal = items_total(&order.items).unwrap();
        assert_eq!(subtotal, 1197);
        assert!(total_matches(order.total, subtotal));
    }

    #[test]
    fn test_missing_fields_rejected() {
        let bodies = [
            json!({"total": 598, "address": "1 Main St", "phone": "555"}),
            json!({"items": [], "total": 598, "address": "1 Main St", "phone": "555"}),
            json!({"items": [{"name": "x"}], "total": 0, "address": "1 Main St", "phone": "555"}),
            json!({"items": [{"name": "x"}], "total": 598, "address": "  ", "phone": "555"}),
            json!({"items": [{"name": "x"}], "total": 598, "address": "1 Main St"}),
        ];

        for body in bodies {
            let result = request(body.clone()).into_new_order(&identity());
            assert!(
                matches!(&result, Err(ApiError::Validation(msg)) if msg == "Missing fields"),
                "{}",
                body
            );
        }
    }
}
