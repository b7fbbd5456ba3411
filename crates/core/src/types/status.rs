//! Order status taxonomy.

use serde::{Deserialize, Serialize};

/// Fulfilment status of a finalized order.
///
/// The progression is linear (`UnderReview` → `InProduction` →
/// `ReadyForPickup` → `Delivered`); `Canceled` is reachable from any
/// non-terminal status. `Delivered` and `Canceled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Payment confirmed, artwork and order details awaiting review.
    UnderReview,
    /// Order is being printed.
    InProduction,
    /// Finished goods waiting for the customer.
    ReadyForPickup,
    /// Handed over to the customer.
    Delivered,
    /// Canceled by an administrator.
    Canceled,
}

impl OrderStatus {
    /// The status every order enters when payment is confirmed.
    pub const INITIAL: Self = Self::UnderReview;

    /// The next status in the linear progression, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::UnderReview => Some(Self::InProduction),
            Self::InProduction => Some(Self::ReadyForPickup),
            Self::ReadyForPickup => Some(Self::Delivered),
            Self::Delivered | Self::Canceled => None,
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Canceled)
    }

    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnderReview => "under_review",
            Self::InProduction => "in_production",
            Self::ReadyForPickup => "ready_for_pickup",
            Self::Delivered => "delivered",
            Self::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "under_review" => Ok(Self::UnderReview),
            "in_production" => Ok(Self::InProduction),
            "ready_for_pickup" => Ok(Self::ReadyForPickup),
            "delivered" => Ok(Self::Delivered),
            "canceled" => Ok(Self::Canceled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progression_ends_at_delivered() {
        let mut status = OrderStatus::INITIAL;
        let mut steps = 0;
        while let Some(next) = status.next() {
            status = next;
            steps += 1;
        }
        assert_eq!(status, OrderStatus::Delivered);
        assert_eq!(steps, 3);
    }

    #[test]
    fn terminal_statuses() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(!OrderStatus::ReadyForPickup.is_terminal());
        assert_eq!(OrderStatus::Canceled.next(), None);
    }

    #[test]
    fn storage_round_trip() {
        for status in [
            OrderStatus::UnderReview,
            OrderStatus::InProduction,
            OrderStatus::ReadyForPickup,
            OrderStatus::Delivered,
            OrderStatus::Canceled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }
}
