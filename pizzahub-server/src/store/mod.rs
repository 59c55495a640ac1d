//! Storage abstractions for the service

pub mod memory;
pub mod models;
pub mod sqlite;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pizzahub_core::{OrderStatus, StatusTimeline};

pub use memory::{InMemoryCatalogStore, InMemoryOrderStore, InMemoryUserStore};
pub use models::*;
pub use sqlite::SqliteStore;

use crate::error::ApiError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, ApiError>;

/// Accounts and pending email verifications
pub trait UserStore: Send + Sync {
    /// Create an account. Fails with `EmailInUse` if the email is taken.
    fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// Get a user by ID
    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>>;

    /// Get a user by exact email address
    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// All users, oldest first
    fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Mark the account for `email` as verified
    fn mark_verified(&self, email: &str) -> StoreResult<()>;

    /// Block or unblock a user. `None` if there is no such user.
    fn set_blocked(&self, user_id: UserId, blocked: bool) -> StoreResult<Option<User>>;

    /// Store a verification, replacing any existing one for the same email
    fn upsert_verification(&self, verification: EmailVerification) -> StoreResult<()>;

    /// Get the pending verification for an email
    fn get_verification(&self, email: &str) -> StoreResult<Option<EmailVerification>>;

    /// Delete the pending verification for an email
    fn delete_verification(&self, email: &str) -> StoreResult<()>;
}

/// Menu items
pub trait CatalogStore: Send + Sync {
    fn create_pizza(&self, pizza: NewPizza) -> StoreResult<Pizza>;

    fn get_pizza(&self, pizza_id: PizzaId) -> StoreResult<Option<Pizza>>;

    /// Pizzas in creation order, optionally only the available ones
    fn list_pizzas(&self, available_only: bool) -> StoreResult<Vec<Pizza>>;

    /// Apply a partial update. `None` if there is no such pizza.
    fn update_pizza(&self, pizza_id: PizzaId, changes: PizzaChanges) -> StoreResult<Option<Pizza>>;

    /// Delete a pizza. Returns whether it existed.
    fn delete_pizza(&self, pizza_id: PizzaId) -> StoreResult<bool>;
}

/// Orders
pub trait OrderStore: Send + Sync {
    /// Place an order at `PENDING`
    fn create_order(&self, order: NewOrder) -> StoreResult<Order>;

    fn get_order(&self, order_id: OrderId) -> StoreResult<Option<Order>>;

    /// A user's orders, newest first
    fn list_orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>>;

    /// Every order, newest first
    fn list_orders(&self) -> StoreResult<Vec<Order>>;

    /// Persist a status change. Stage stamps already stored are never
    /// overwritten; empty ones are filled from `timeline`. `None` if there
    /// is no such order.
    fn record_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        timeline: &StatusTimeline,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Order>>;
}

// Shared stores (one SQLite connection behind all three traits)

impl<T: UserStore + ?Sized> UserStore for Arc<T> {
    fn create_user(&self, user: NewUser) -> StoreResult<User> {
        (**self).create_user(user)
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        (**self).get_user(user_id)
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        (**self).get_user_by_email(email)
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        (**self).list_users()
    }

    fn mark_verified(&self, email: &str) -> StoreResult<()> {
        (**self).mark_verified(email)
    }

    fn set_blocked(&self, user_id: UserId, blocked: bool) -> StoreResult<Option<User>> {
        (**self).set_blocked(user_id, blocked)
    }

    fn upsert_verification(&self, verification: EmailVerification) -> StoreResult<()> {
        (**self).upsert_verification(verification)
    }

    fn get_verification(&self, email: &str) -> StoreResult<Option<EmailVerification>> {
        (**self).get_verification(email)
    }

    fn delete_verification(&self, email: &str) -> StoreResult<()> {
        (**self).delete_verification(email)
    }
}

impl<T: CatalogStore + ?Sized> CatalogStore for Arc<T> {
    fn create_pizza(&self, pizza: NewPizza) -> StoreResult<Pizza> {
        (**self).create_pizza(pizza)
    }

    fn get_pizza(&self, pizza_id: PizzaId) -> StoreResult<Option<Pizza>> {
        (**self).get_pizza(pizza_id)
    }

    fn list_pizzas(&self, available_only: bool) -> StoreResult<Vec<Pizza>> {
        (**self).list_pizzas(available_only)
    }

    fn update_pizza(&self, pizza_id: PizzaId, changes: PizzaChanges) -> StoreResult<Option<Pizza>> {
        (**self).update_pizza(pizza_id, changes)
    }

    fn delete_pizza(&self, pizza_id: PizzaId) -> StoreResult<bool> {
        (**self).delete_pizza(pizza_id)
    }
}

impl<T: OrderStore + ?Sized> OrderStore for Arc<T> {
    fn create_order(&self, order: NewOrder) -> StoreResult<Order> {
        (**self).create_order(order)
    }

    fn get_order(&self, order_id: OrderId) -> StoreResult<Option<Order>> {
        (**self).get_order(order_id)
    }

    fn list_orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>> {
        (**self).list_orders_for_user(user_id)
    }

    fn list_orders(&self) -> StoreResult<Vec<Order>> {
        (**self).list_orders()
    }

    fn record_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        timeline: &StatusTimeline,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Order>> {
        (**self).record_status(order_id, status, timeline, at)
    }
}
