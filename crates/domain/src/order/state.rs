//! Order status machine.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The status of an order in its lifecycle.
///
/// Status transitions:
/// ```text
/// New ──► Paid ──► Shipped
///  │        │
///  └────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order has been placed and stock taken.
    #[default]
    New,

    /// Payment was received.
    Paid,

    /// Order left the warehouse (terminal state).
    Shipped,

    /// Order was cancelled and its stock returned (terminal state).
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::New,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Cancelled,
    ];

    /// Returns true if the transition table permits `from -> to`.
    ///
    /// Same-status requests are never permitted.
    pub fn allowed(from: OrderStatus, to: OrderStatus) -> bool {
        matches!(
            (from, to),
            (OrderStatus::New, OrderStatus::Paid)
                | (OrderStatus::New, OrderStatus::Cancelled)
                | (OrderStatus::Paid, OrderStatus::Shipped)
                | (OrderStatus::Paid, OrderStatus::Cancelled)
        )
    }

    /// Returns true if the order may move from this status to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        Self::allowed(*self, next)
    }

    /// Returns true if the order can be cancelled in this status.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::New | OrderStatus::Paid)
    }

    /// Returns the status name as stored and displayed.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Paid => "PAID",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = DomainError;

    /// Parses a status name, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::validation("status", format!("unknown status '{wanted}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_new() {
        assert_eq!(OrderStatus::default(), OrderStatus::New);
    }

    #[test]
    fn test_transition_table() {
        use OrderStatus::*;

        let permitted = [(New, Paid), (New, Cancelled), (Paid, Shipped), (Paid, Cancelled)];

        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                assert_eq!(
                    OrderStatus::allowed(from, to),
                    permitted.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_same_status_is_not_a_transition() {
        for status in OrderStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_new_cannot_skip_to_shipped() {
        assert!(!OrderStatus::New.can_transition_to(OrderStatus::Shipped));
    }

    #[test]
    fn test_can_cancel() {
        assert!(OrderStatus::New.can_cancel());
        assert!(OrderStatus::Paid.can_cancel());
        assert!(!OrderStatus::Shipped.can_cancel());
        assert!(!OrderStatus::Cancelled.can_cancel());
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!(" Paid ".parse::<OrderStatus>().unwrap(), OrderStatus::Paid);
        assert!(matches!(
            "LOST".parse::<OrderStatus>(),
            Err(DomainError::Validation { field: "status", .. })
        ));
    }

    #[test]
    fn test_serialization_uses_upper_case_names() {
        let json = serde_json::to_string(&OrderStatus::Cancelled).unwrap();
        assert_eq!(json, "\"CANCELLED\"");
        let parsed: OrderStatus = serde_json::from_str("\"PAID\"").unwrap();
        assert_eq!(parsed, OrderStatus::Paid);
    }
}
