//! Order lifecycle
//!
//! An order starts at `PENDING` and normally walks
//! `CONFIRMED → PREPARING → BAKING → OUT_FOR_DELIVERY → DELIVERED`.
//! `CANCELLED` is a side exit. `DELIVERED` and `CANCELLED` are terminal.
//!
//! Each stage after `PENDING` has a timestamp that records the first time
//! the order reached it. Moving back and forth never rewrites a stamp.
//!
//! By default any label may follow any other: the admin panel is operated
//! by people who sometimes need to correct a mistake. [`TransitionPolicy::ForwardOnly`]
//! is available for deployments that want the engine to refuse regressions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Status of an order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Baking,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Baking,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Baking => "BAKING",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// No transitions are defined out of a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Position on the happy path. `None` for the cancellation side exit.
    fn stage(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Preparing => Some(2),
            OrderStatus::Baking => Some(3),
            OrderStatus::OutForDelivery => Some(4),
            OrderStatus::Delivered => Some(5),
            OrderStatus::Cancelled => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::InvalidStatus(s.to_string()))
    }
}

/// First-arrival time for each stage after `PENDING`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTimeline {
    pub confirmed_at: Option<DateTime<Utc>>,
    pub preparing_at: Option<DateTime<Utc>>,
    pub baking_at: Option<DateTime<Utc>>,
    pub out_for_delivery_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl StatusTimeline {
    /// When the order first reached `status`. Always `None` for `PENDING`,
    /// whose time is the order's creation time.
    pub fn reached_at(&self, status: OrderStatus) -> Option<DateTime<Utc>> {
        match status {
            OrderStatus::Pending => None,
            OrderStatus::Confirmed => self.confirmed_at,
            OrderStatus::Preparing => self.preparing_at,
            OrderStatus::Baking => self.baking_at,
            OrderStatus::OutForDelivery => self.out_for_delivery_at,
            OrderStatus::Delivered => self.delivered_at,
            OrderStatus::Cancelled => self.cancelled_at,
        }
    }

    fn slot(&mut self, status: OrderStatus) -> Option<&mut Option<DateTime<Utc>>> {
        match status {
            OrderStatus::Pending => None,
            OrderStatus::Confirmed => Some(&mut self.confirmed_at),
            OrderStatus::Preparing => Some(&mut self.preparing_at),
            OrderStatus::Baking => Some(&mut self.baking_at),
            OrderStatus::OutForDelivery => Some(&mut self.out_for_delivery_at),
            OrderStatus::Delivered => Some(&mut self.delivered_at),
            OrderStatus::Cancelled => Some(&mut self.cancelled_at),
        }
    }

    /// Stamp `status` with `at` unless it already has a stamp.
    /// Returns whether a stamp was written.
    pub fn stamp(&mut self, status: OrderStatus, at: DateTime<Utc>) -> bool {
        match self.slot(status) {
            Some(slot) if slot.is_none() => {
                *slot = Some(at);
                true
            }
            _ => false,
        }
    }

    /// Fill every empty stamp from `other`. Existing stamps win.
    pub fn merge_missing(&mut self, other: &StatusTimeline) {
        for status in OrderStatus::ALL {
            if let Some(at) = other.reached_at(status) {
                self.stamp(status, at);
            }
        }
    }
}

/// Which transitions the engine accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Any recognised status from any status
    #[default]
    Permissive,
    /// Only moves further along the happy path, or cancellation, from a
    /// non-terminal status
    ForwardOnly,
}

impl TransitionPolicy {
    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::ForwardOnly => {
                if from.is_terminal() {
                    return false;
                }
                match (from.stage(), to.stage()) {
                    (_, None) => true,
                    (Some(a), Some(b)) => b > a,
                    (None, Some(_)) => false,
                }
            }
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(TransitionPolicy::Permissive),
            "forward-only" | "forward_only" | "strict" => Ok(TransitionPolicy::ForwardOnly),
            other => Err(format!("unknown order status policy: {}", other)),
        }
    }
}

/// Outcome of a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,
    /// True when this was the first arrival at `to` and a stamp was written
    pub stamped: bool,
}

/// The order lifecycle engine
#[derive(Debug, Clone, Copy, Default)]
pub struct Lifecycle {
    policy: TransitionPolicy,
}

impl Lifecycle {
    pub fn new(policy: TransitionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Move an order to `target` at time `at`.
    ///
    /// Updates `status` and stamps the matching timeline entry on first
    /// arrival. Under the permissive policy this never fails.
    pub fn advance(
        &self,
        status: &mut OrderStatus,
        timeline: &mut StatusTimeline,
        target: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<Transition> {
        let from = *status;
        if !self.policy.allows(from, target) {
            return Err(Error::IllegalTransition { from, to: target });
        }

        *status = target;
        let stamped = timeline.stamp(target, at);

        Ok(Transition {
            from,
            to: target,
            stamped,
        })
    }

    /// Parse a status label and move the order to it
    pub fn advance_to_label(
        &self,
        status: &mut OrderStatus,
        timeline: &mut StatusTimeline,
        label: &str,
        at: DateTime<Utc>,
    ) -> Result<Transition> {
        let target = label.parse::<OrderStatus>()?;
        self.advance(status, timeline, target, at)
    }
}
