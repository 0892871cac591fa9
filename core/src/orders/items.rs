//! Order item extraction
//!
//! Item lists reach the dashboard in several shapes depending on which
//! ordering channel produced them: a JSON string, a bare array, an order
//! row with `order_details`/`products`/`items`, or a single item object.
//! Every shape is flattened into [`OrderItem`]s; anything unusable yields
//! an empty list rather than an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name shown when an item carries no usable name
pub const FALLBACK_ITEM_NAME: &str = "Produit";

/// One line of an order as displayed on the kitchen card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    /// Drink attached to a menu
    pub boisson_name: Option<String>,
    /// Side attached to a menu
    pub accompagnement_name: Option<String>,
    #[serde(default)]
    pub customizations: Vec<Value>,
}

/// First non-empty string among the candidates
fn first_text<'a>(candidates: impl IntoIterator<Item = Option<&'a Value>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn nested_name<'a>(item: &'a Value, field: &str) -> Option<&'a Value> {
    item.get(field).and_then(|nested| nested.get("name"))
}

/// Positive quantity, given as a number or a numeric string; anything else is 1.
///
/// Fractional quantities round up: half a portion still has to be made.
fn quantity_of(item: &Value) -> u32 {
    let quantity = match item.get("quantity") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    quantity
        .filter(|q| q.is_finite() && *q > 0.0)
        .map(|q| q.ceil().min(f64::from(u32::MAX)) as u32)
        .unwrap_or(1)
}

impl OrderItem {
    /// Build an item from one JSON element, tolerating every known field layout.
    pub fn from_value(item: &Value) -> Self {
        Self {
            name: first_text([
                nested_name(item, "product"),
                item.get("product_name"),
                item.get("name"),
            ])
            .unwrap_or_else(|| FALLBACK_ITEM_NAME.to_string()),
            quantity: quantity_of(item),
            boisson_name: first_text([nested_name(item, "boisson"), item.get("boisson_name")]),
            accompagnement_name: first_text([
                nested_name(item, "accompagnement"),
                item.get("accompagnement_name"),
            ]),
            customizations: item
                .get("customizations")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

fn map_items(items: &[Value]) -> Vec<OrderItem> {
    items.iter().map(OrderItem::from_value).collect()
}

/// Flatten any supported payload into order items.
pub fn parse_items(payload: &Value) -> Vec<OrderItem> {
    match payload {
        Value::Null => Vec::new(),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => map_items(&items),
            _ => Vec::new(),
        },
        Value::Array(items) => map_items(items),
        Value::Object(order) => {
            let Some(details) = ["order_details", "products", "items"]
                .iter()
                .filter_map(|field| order.get(*field))
                .find(|value| is_present(value))
            else {
                tracing::debug!("No product data found in order payload");
                return Vec::new();
            };
            parse_order_details(details)
        }
        _ => Vec::new(),
    }
}

/// Parse a raw JSON document as an item payload.
pub fn parse_items_str(raw: &str) -> Vec<OrderItem> {
    match serde_json::from_str::<Value>(raw) {
        Ok(payload) => parse_items(&payload),
        Err(err) => {
            tracing::debug!(error = %err, "Order payload is not valid JSON");
            Vec::new()
        }
    }
}

/// Falsy values (null, false, 0, "") count as missing, like an unset column
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Parse the contents of an `order_details` column (string, array or object).
pub fn parse_order_details(details: &Value) -> Vec<OrderItem> {
    let parsed;
    let details = match details {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(value) => {
                parsed = value;
                &parsed
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to parse order_details JSON");
                return Vec::new();
            }
        },
        other => other,
    };

    match details {
        Value::Array(items) => map_items(items),
        Value::Object(object) => match object.get("items") {
            Some(Value::Array(items)) => map_items(items),
            _ => vec![OrderItem::from_value(details)],
        },
        _ => Vec::new(),
    }
}
