//! Data models for service storage

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use pizzahub_core::catalog::{self, display_price};
use pizzahub_core::{Category, OrderStatus, Price, Role, SizePrices, StatusTimeline};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// How long a verification code stays valid
pub const VERIFICATION_CODE_TTL_MINUTES: i64 = 15;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

id_type!(
    /// Unique user identifier
    UserId
);
id_type!(
    /// Unique pizza identifier
    PizzaId
);
id_type!(
    /// Unique order identifier
    OrderId
);

/// A customer or admin account
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub verified: bool,
    pub blocked: bool,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: Role,
    pub verified: bool,
}

/// Public projection of a user, safe to return to clients
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Owner details attached to orders in the admin views
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

/// A pending email verification. At most one per email.
#[derive(Debug, Clone)]
pub struct EmailVerification {
    pub email: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl EmailVerification {
    /// A verification for `email` issued at `issued_at`
    pub fn issue(email: &str, code_hash: String, issued_at: DateTime<Utc>) -> Self {
        Self {
            email: email.to_string(),
            code_hash,
            expires_at: issued_at + Duration::minutes(VERIFICATION_CODE_TTL_MINUTES),
        }
    }

    /// Expired at and after `expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A menu item
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pizza {
    pub id: PizzaId,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub base_price: Price,
    pub sizes: SizePrices,
    pub toppings: Vec<String>,
    pub category: Category,
    pub popular: bool,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pizza {
    /// Price shown on the menu
    pub fn display_price(&self) -> Price {
        display_price(&self.sizes, self.base_price)
    }
}

/// Fields needed to create a menu item
#[derive(Debug, Clone)]
pub struct NewPizza {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub base_price: Price,
    pub sizes: SizePrices,
    pub toppings: Vec<String>,
    pub category: Category,
    pub popular: bool,
    pub available: bool,
}

impl NewPizza {
    /// Every size gets a price, defaulting to the base price
    pub fn with_complete_sizes(mut self) -> Self {
        catalog::fill_sizes(&mut self.sizes, self.base_price);
        self
    }
}

/// Partial update of a menu item. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct PizzaChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<Option<String>>,
    pub base_price: Option<Price>,
    pub sizes: Option<SizePrices>,
    pub toppings: Option<Vec<String>>,
    pub category: Option<Category>,
    pub popular: Option<bool>,
    pub available: Option<bool>,
}

impl PizzaChanges {
    /// Apply the changes to `pizza`, keeping all three sizes priced
    pub fn apply(self, pizza: &mut Pizza, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            pizza.name = name;
        }
        if let Some(description) = self.description {
            pizza.description = description;
        }
        if let Some(image) = self.image {
            pizza.image = image;
        }
        if let Some(base_price) = self.base_price {
            pizza.base_price = base_price;
        }
        if let Some(sizes) = self.sizes {
            pizza.sizes = sizes;
        }
        if let Some(toppings) = self.toppings {
            pizza.toppings = toppings;
        }
        if let Some(category) = self.category {
            pizza.category = category;
        }
        if let Some(popular) = self.popular {
            pizza.popular = popular;
        }
        if let Some(available) = self.available {
            pizza.available = available;
        }
        catalog::fill_sizes(&mut pizza.sizes, pizza.base_price);
        pizza.updated_at = now;
    }
}

/// One line of an order, snapshotted from the cart at order time.
///
/// Only the fields the service reasons about are typed. Everything else the
/// client sent (crust, cart ids) rides along in `extra` so the stored
/// snapshot matches what was ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pizza_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default)]
    pub toppings: Vec<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default, alias = "unitPrice", skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    /// Unit price of the customised pizza (size, crust and toppings)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization_price: Option<Price>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_quantity() -> u32 {
    1
}

impl LineItem {
    /// The customised price when the cart sent one, else the plain price
    pub fn unit_price(&self) -> Option<Price> {
        self.customization_price.or(self.price)
    }

    /// Unit price times quantity, when the unit price is known
    pub fn subtotal(&self) -> Option<i64> {
        self.unit_price().map(|p| p.amount() * i64::from(self.quantity))
    }
}

/// Sum of the line subtotals before tax, or `None` if any line lacks a unit price
pub fn items_total(items: &[LineItem]) -> Option<i64> {
    items.iter().map(LineItem::subtotal).sum()
}

/// A placed order
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub total: i64,
    pub payment: Option<String>,
    pub address: String,
    pub phone: String,
    pub status: OrderStatus,
    #[serde(flatten)]
    pub timeline: StatusTimeline,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to place an order
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub total: i64,
    pub payment: Option<String>,
    pub address: String,
    pub phone: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pizzahub_core::Size;
    use serde_json::json;

    #[test]
    fn test_verification_expires_at_exactly_fifteen_minutes() {
        let issued = Utc::now();
        let v = EmailVerification::issue("a@x.com", "hash".into(), issued);

        assert!(!v.is_expired_at(issued));
        assert!(!v.is_expired_at(issued + Duration::minutes(15) - Duration::milliseconds(1)));
        assert!(v.is_expired_at(issued + Duration::minutes(15)));
        assert!(v.is_expired_at(issued + Duration::minutes(16)));
    }

    #[test]
    fn test_line_item_keeps_unknown_fields() {
        let raw = json!({
            "id": "cart-1",
            "pizzaId": "p-1",
            "size": "large",
            "crust": "thin",
            "toppings": ["1", "3"],
            "quantity": 2,
            "price": 299
        });
        let item: LineItem = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(item.quantity, 2);
        assert_eq!(item.subtotal(), Some(598));
        assert_eq!(item.extra["crust"], "thin");
        assert_eq!(serde_json::to_value(&item).unwrap(), raw);
    }

    #[test]
    fn test_customization_price_is_the_unit_price() {
        let raw = json!({
            "pizzaId": "p-1",
            "size": "large",
            "crust": "cheese-burst",
            "quantity": 2,
            "customizationPrice": 449
        });
        let item: LineItem = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(item.unit_price(), Some(Price(449)));
        assert_eq!(item.subtotal(), Some(898));
        assert!(item.extra.get("customizationPrice").is_none());
        assert_eq!(serde_json::to_value(&item).unwrap(), raw);
    }

    #[test]
    fn test_items_total_requires_every_price() {
        let priced: LineItem =
            serde_json::from_value(json!({"name": "Margherita", "price": 299})).unwrap();
        let unpriced: LineItem = serde_json::from_value(json!({"name": "Farmhouse"})).unwrap();

        assert_eq!(items_total(&[priced.clone(), priced.clone()]), Some(598));
        assert_eq!(items_total(&[priced, unpriced]), None);
    }

    #[test]
    fn test_pizza_changes_keep_sizes_complete() {
        let now = Utc::now();
        let mut pizza = NewPizza {
            name: "Margherita".into(),
            description: String::new(),
            image: None,
            base_price: Price(299),
            sizes: SizePrices::new(),
            toppings: vec![],
            category: Category::Veg,
            popular: false,
            available: true,
        }
        .with_complete_sizes();
        assert_eq!(pizza.sizes.len(), 3);

        let mut stored = Pizza {
            id: PizzaId::new(),
            name: pizza.name.clone(),
            description: pizza.description.clone(),
            image: None,
            base_price: pizza.base_price,
            sizes: std::mem::take(&mut pizza.sizes),
            toppings: vec![],
            category: pizza.category,
            popular: false,
            available: true,
            created_at: now,
            updated_at: now,
        };

        let mut sizes = SizePrices::new();
        sizes.insert(Size::Medium, Price(349));
        PizzaChanges {
            sizes: Some(sizes),
            available: Some(false),
            ..Default::default()
        }
        .apply(&mut stored, now);

        assert!(!stored.available);
        assert_eq!(stored.sizes.len(), 3);
        assert_eq!(stored.sizes[&Size::Small], Price(299));
        assert_eq!(stored.display_price(), Price(349));
        assert_eq!(stored.name, "Margherita");
    }
}
