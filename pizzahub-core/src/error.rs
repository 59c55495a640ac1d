//! Error types for PizzaHub domain logic

use thiserror::Error;

use crate::order::OrderStatus;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Illegal status transition from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}
