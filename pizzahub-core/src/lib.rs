//! PizzaHub Core Library
//!
//! Domain rules for the PizzaHub ordering service, free of any I/O:
//! - The order lifecycle: status labels, first-arrival timestamps, and the
//!   transition policy
//! - Account roles
//! - Menu pricing (sizes, categories, lenient price parsing)
//! - Stateless session tokens

pub mod catalog;
pub mod error;
pub mod order;
pub mod role;
pub mod token;

pub use catalog::{Category, Price, Size, SizePrices};
pub use error::Error;
pub use order::{Lifecycle, OrderStatus, StatusTimeline, Transition, TransitionPolicy};
pub use role::Role;
pub use token::{SessionClaims, TokenService};

/// Result type for pizzahub-core operations
pub type Result<T> = std::result::Result<T, Error>;
