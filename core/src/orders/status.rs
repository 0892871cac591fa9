//! Order status canonicalization
//!
//! Orders arrive with free-form status labels: the French labels the
//! dashboard writes back, English codes, and a few Spanish/Portuguese
//! variants from older kiosks. Everything folds into four states.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Accepted,
    Ready,
    Closed,
}

impl OrderStatus {
    /// Fold any status label into a canonical status.
    ///
    /// Unknown or empty labels are treated as a new order.
    pub fn canonicalize(label: &str) -> Self {
        let raw = label.trim();
        if raw.is_empty() {
            return OrderStatus::Pending;
        }

        match raw {
            "Nouvelle" => return OrderStatus::Pending,
            "En cours" => return OrderStatus::Accepted,
            "Prêt" => return OrderStatus::Ready,
            "CLOSED" | "Fermé" => return OrderStatus::Closed,
            _ => {}
        }

        let upper = raw.to_uppercase();
        let has = |needles: &[&str]| needles.iter().any(|n| upper.contains(n));

        if has(&["ACCEP"]) {
            OrderStatus::Accepted
        } else if has(&["PRET", "PRÊT", "READY"]) {
            OrderStatus::Ready
        } else if has(&["CLOS", "FERM", "CLOT"]) {
            OrderStatus::Closed
        } else {
            // NOUV/NEW/NUEV/NOVA, "PENDING" and anything unrecognized
            OrderStatus::Pending
        }
    }

    /// Canonical upper-case code
    pub fn code(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Ready => "READY",
            OrderStatus::Closed => "CLOSED",
        }
    }

    /// Label written back to the backend when the order advances
    pub fn next_label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "En cours",
            OrderStatus::Accepted => "Prêt",
            OrderStatus::Ready => "CLOSED",
            OrderStatus::Closed => "En cours",
        }
    }

    /// Label shown on the order card
    pub fn display_label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Nouvelle",
            OrderStatus::Accepted => "En cours",
            OrderStatus::Ready => "Prêt",
            OrderStatus::Closed => "CLOSED",
        }
    }

    /// Orders the kitchen is still working on; only these have a countdown
    pub fn is_in_progress(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Accepted)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Label to write back when advancing an order from `current`
pub fn next_status_label(current: &str) -> &'static str {
    OrderStatus::canonicalize(current).next_label()
}

/// Card label for any incoming status label
pub fn status_display(label: &str) -> &'static str {
    OrderStatus::canonicalize(label).display_label()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_label_is_pending() {
        assert_eq!(OrderStatus::canonicalize(""), OrderStatus::Pending);
        assert_eq!(OrderStatus::canonicalize("   "), OrderStatus::Pending);
    }

    #[test]
    fn french_labels_map_exactly() {
        assert_eq!(OrderStatus::canonicalize("Nouvelle"), OrderStatus::Pending);
        assert_eq!(OrderStatus::canonicalize("En cours"), OrderStatus::Accepted);
        assert_eq!(OrderStatus::canonicalize(" Prêt "), OrderStatus::Ready);
        assert_eq!(OrderStatus::canonicalize("Fermé"), OrderStatus::Closed);
    }

    #[test]
    fn loose_labels_fold_by_substring() {
        assert_eq!(OrderStatus::canonicalize("acceptée"), OrderStatus::Accepted);
        assert_eq!(OrderStatus::canonicalize("prête"), OrderStatus::Ready);
        assert_eq!(OrderStatus::canonicalize("ready_for_pickup"), OrderStatus::Ready);
        assert_eq!(OrderStatus::canonicalize("cloturee"), OrderStatus::Closed);
        assert_eq!(OrderStatus::canonicalize("fermée"), OrderStatus::Closed);
        assert_eq!(OrderStatus::canonicalize("nueva"), OrderStatus::Pending);
        assert_eq!(OrderStatus::canonicalize("READY"), OrderStatus::Ready);
    }

    #[test]
    fn unknown_label_is_pending() {
        assert_eq!(OrderStatus::canonicalize("on hold"), OrderStatus::Pending);
    }

    #[test]
    fn next_label_advances_workflow() {
        assert_eq!(next_status_label("Nouvelle"), "En cours");
        assert_eq!(next_status_label("En cours"), "Prêt");
        assert_eq!(next_status_label("Prêt"), "CLOSED");
        assert_eq!(next_status_label("CLOSED"), "En cours");
    }

    #[test]
    fn display_label_round_trips_through_canonicalize() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Accepted,
            OrderStatus::Ready,
            OrderStatus::Closed,
        ] {
            assert_eq!(OrderStatus::canonicalize(status.display_label()), status);
        }
        assert_eq!(status_display("accepted"), "En cours");
    }

    #[test]
    fn serializes_as_code() {
        let json = serde_json::to_string(&OrderStatus::Accepted).unwrap();
        assert_eq!(json, "\"ACCEPTED\"");
        assert_eq!(OrderStatus::Ready.to_string(), "READY");
    }
}
