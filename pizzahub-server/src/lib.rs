//! PizzaHub ordering service
//!
//! Customers browse the menu and place orders. Admins manage the menu,
//! move orders through their lifecycle and block accounts.

pub mod auth;
pub mod config;
pub mod crypto;
pub mod email;
pub mod error;
pub mod routes;
pub mod seed;
pub mod state;
pub mod store;

pub use auth::Identity;
pub use config::Config;
pub use email::{ConsoleEmailSender, EmailSender, Notifier, SmtpConfig, SmtpEmailSender};
pub use error::ApiError;
pub use state::{AppState, UploadSettings};
pub use store::{
    CatalogStore, InMemoryCatalogStore, InMemoryOrderStore, InMemoryUserStore, OrderStore,
    SqliteStore, UserStore,
};
