//! Order helpers for the kitchen dashboard
//!
//! This module provides:
//! - **Status**: canonical order states from multilingual labels
//! - **Items**: item lists from heterogeneous payload shapes
//! - **Countdown**: remaining preparation time against the kitchen budget

pub mod countdown;
pub mod items;
pub mod status;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

pub use countdown::{
    Countdown, OrderList, OrderTimerView, OrderTimers, TimerSweep, clock_label, format_countdown,
    format_elapsed, remaining_seconds, update_timers,
};
pub use items::{OrderItem, parse_items, parse_items_str, parse_order_details};
pub use status::{OrderStatus, next_status_label, status_display};

/// An order row as delivered by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KitchenOrder {
    /// Rows from older kiosks carry a numeric id
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Client-side creation time in epoch milliseconds; wins over `created_at`
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at_ms: Option<i64>,
    /// Extra minutes granted to this order on top of the kitchen budget
    #[serde(default)]
    pub additional_prep_time: Option<f64>,
    /// Older rows carry the extra minutes here
    #[serde(default)]
    pub prep_time: Option<f64>,
    #[serde(default)]
    pub order_details: Value,
    #[serde(default)]
    pub notes: Option<String>,
}

impl KitchenOrder {
    pub fn status(&self) -> OrderStatus {
        OrderStatus::canonicalize(self.status.as_deref().unwrap_or_default())
    }

    pub fn items(&self) -> Vec<OrderItem> {
        parse_order_details(&self.order_details)
    }

    /// When the order came in, preferring `createdAt` over `created_at`
    pub fn created_time(&self) -> Option<DateTime<Utc>> {
        self.created_at_ms
            .and_then(DateTime::from_timestamp_millis)
            .or(self.created_at)
    }

    /// Extra preparation minutes; `additional_prep_time` wins even when zero
    pub fn extra_prep_minutes(&self) -> f64 {
        self.additional_prep_time
            .or(self.prep_time)
            .filter(|m| m.is_finite())
            .unwrap_or(0.0)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(de::Error::custom(format!(
            "order id must be a string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use serde_json::json;

    use super::*;

    #[test]
    fn numeric_id_is_stringified() {
        let order: KitchenOrder =
            serde_json::from_value(json!({ "id": 42, "status": "Nouvelle" })).unwrap();
        assert_eq!(order.id, "42");
        assert_eq!(order.status(), OrderStatus::Pending);

        let order: KitchenOrder = serde_json::from_value(json!({ "id": "A-7" })).unwrap();
        assert_eq!(order.id, "A-7");
    }

    #[test]
    fn non_scalar_id_is_rejected() {
        assert!(serde_json::from_value::<KitchenOrder>(json!({ "id": [1] })).is_err());
    }

    #[test]
    fn client_timestamp_wins_over_row_timestamp() {
        let now = Utc::now();
        let client = now - TimeDelta::minutes(30);
        let order: KitchenOrder = serde_json::from_value(json!({
            "id": 1,
            "createdAt": client.timestamp_millis(),
            "created_at": now.to_rfc3339(),
        }))
        .unwrap();

        assert_eq!(
            order.created_time().map(|t| t.timestamp_millis()),
            Some(client.timestamp_millis())
        );
    }

    #[test]
    fn row_timestamp_used_without_client_timestamp() {
        let order: KitchenOrder = serde_json::from_value(json!({
            "id": 1,
            "created_at": "2024-03-09T12:00:00Z",
        }))
        .unwrap();
        assert_eq!(order.created_time(), order.created_at);
        assert!(order.created_time().is_some());
    }
}
