//! In-memory storage implementations

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use pizzahub_core::{OrderStatus, StatusTimeline};

use super::{
    CatalogStore, EmailVerification, NewOrder, NewPizza, NewUser, Order, OrderId, OrderStore,
    Pizza, PizzaChanges, PizzaId, StoreResult, User, UserId, UserStore,
};
use crate::error::ApiError;

fn poisoned<T>(_: T) -> ApiError {
    ApiError::Storage("in-memory store lock poisoned".to_string())
}

/// Newest first. Orders created in the same instant keep reverse insertion order.
fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.reverse();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

/// In-memory user store
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
    verifications: RwLock<HashMap<String, EmailVerification>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(Vec::new()),
            verifications: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for InMemoryUserStore {
    fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().map_err(poisoned)?;
        if users.iter().any(|u| u.email == user.email) {
            return Err(ApiError::EmailInUse);
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            verified: user.verified,
            blocked: false,
            phone: user.phone,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.iter().find(|u| u.id == user_id).cloned())
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.users.read().map_err(poisoned)?.clone())
    }

    fn mark_verified(&self, email: &str) -> StoreResult<()> {
        let mut users = self.users.write().map_err(poisoned)?;
        let user = users
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or(ApiError::UnknownEmail)?;
        user.verified = true;
        user.updated_at = Utc::now();
        Ok(())
    }

    fn set_blocked(&self, user_id: UserId, blocked: bool) -> StoreResult<Option<User>> {
        let mut users = self.users.write().map_err(poisoned)?;
        Ok(users.iter_mut().find(|u| u.id == user_id).map(|user| {
            user.blocked = blocked;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    fn upsert_verification(&self, verification: EmailVerification) -> StoreResult<()> {
        self.verifications
            .write()
            .map_err(poisoned)?
            .insert(verification.email.clone(), verification);
        Ok(())
    }

    fn get_verification(&self, email: &str) -> StoreResult<Option<EmailVerification>> {
        Ok(self.verifications.read().map_err(poisoned)?.get(email).cloned())
    }

    fn delete_verification(&self, email: &str) -> StoreResult<()> {
        self.verifications.write().map_err(poisoned)?.remove(email);
        Ok(())
    }
}

/// In-memory menu store
pub struct InMemoryCatalogStore {
    pizzas: RwLock<Vec<Pizza>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self {
            pizzas: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn create_pizza(&self, pizza: NewPizza) -> StoreResult<Pizza> {
        let now = Utc::now();
        let pizza = Pizza {
            id: PizzaId::new(),
            name: pizza.name,
            description: pizza.description,
            image: pizza.image,
            base_price: pizza.base_price,
            sizes: pizza.sizes,
            toppings: pizza.toppings,
            category: pizza.category,
            popular: pizza.popular,
            available: pizza.available,
            created_at: now,
            updated_at: now,
        };
        self.pizzas.write().map_err(poisoned)?.push(pizza.clone());
        Ok(pizza)
    }

    fn get_pizza(&self, pizza_id: PizzaId) -> StoreResult<Option<Pizza>> {
        let pizzas = self.pizzas.read().map_err(poisoned)?;
        Ok(pizzas.iter().find(|p| p.id == pizza_id).cloned())
    }

    fn list_pizzas(&self, available_only: bool) -> StoreResult<Vec<Pizza>> {
        let pizzas = self.pizzas.read().map_err(poisoned)?;
        Ok(pizzas
            .iter()
            .filter(|p| !available_only || p.available)
            .cloned()
            .collect())
    }

    fn update_pizza(&self, pizza_id: PizzaId, changes: PizzaChanges) -> StoreResult<Option<Pizza>> {
        let mut pizzas = self.pizzas.write().map_err(poisoned)?;
        Ok(pizzas.iter_mut().find(|p| p.id == pizza_id).map(|pizza| {
            changes.apply(pizza, Utc::now());
            pizza.clone()
        }))
    }

    fn delete_pizza(&self, pizza_id: PizzaId) -> StoreResult<bool> {
        let mut pizzas = self.pizzas.write().map_err(poisoned)?;
        let before = pizzas.len();
        pizzas.retain(|p| p.id != pizza_id);
        Ok(pizzas.len() != before)
    }
}

/// In-memory order store
pub struct InMemoryOrderStore {
    orders: RwLock<Vec<Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn create_order(&self, order: NewOrder) -> StoreResult<Order> {
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            user_id: order.user_id,
            items: order.items,
            total: order.total,
            payment: order.payment,
            address: order.address,
            phone: order.phone,
            status: OrderStatus::Pending,
            timeline: StatusTimeline::default(),
            created_at: now,
            updated_at: now,
        };
        self.orders.write().map_err(poisoned)?.push(order.clone());
        Ok(order)
    }

    fn get_order(&self, order_id: OrderId) -> StoreResult<Option<Order>> {
        let orders = self.orders.read().map_err(poisoned)?;
        Ok(orders.iter().find(|o| o.id == order_id).cloned())
    }

    fn list_orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>> {
        let orders = self.orders.read().map_err(poisoned)?;
        Ok(newest_first(
            orders.iter().filter(|o| o.user_id == user_id).cloned().collect(),
        ))
    }

    fn list_orders(&self) -> StoreResult<Vec<Order>> {
        Ok(newest_first(self.orders.read().map_err(poisoned)?.clone()))
    }

    fn record_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        timeline: &StatusTimeline,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Order>> {
        let mut orders = self.orders.write().map_err(poisoned)?;
        Ok(orders.iter_mut().find(|o| o.id == order_id).map(|order| {
            order.status = status;
            order.timeline.merge_missing(timeline);
            order.updated_at = at;
            order.clone()
        }))
    }
}
