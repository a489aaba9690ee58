//! Push channel messages
//!
//! Every mutation is announced to connected clients as a text frame
//! `{"type": "...", "data": ...}`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Order;

/// Push event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    OrderCreated,
    OrderUpdated,
    OrderDeleted,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::OrderCreated => "order_created",
            EventType::OrderUpdated => "order_updated",
            EventType::OrderDeleted => "order_deleted",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of `order_deleted`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedOrder {
    pub id: String,
}

/// Server to client push event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PushEvent {
    OrderCreated(Order),
    OrderUpdated(Order),
    OrderDeleted(DeletedOrder),
}

impl PushEvent {
    pub fn deleted(id: impl Into<String>) -> Self {
        PushEvent::OrderDeleted(DeletedOrder { id: id.into() })
    }

    pub fn event_type(&self) -> EventType {
        match self {
            PushEvent::OrderCreated(_) => EventType::OrderCreated,
            PushEvent::OrderUpdated(_) => EventType::OrderUpdated,
            PushEvent::OrderDeleted(_) => EventType::OrderDeleted,
        }
    }

    /// Id of the affected order
    pub fn order_id(&self) -> &str {
        match self {
            PushEvent::OrderCreated(order) | PushEvent::OrderUpdated(order) => &order.id,
            PushEvent::OrderDeleted(deleted) => &deleted.id,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderCreate, OrderStatus};

    fn order() -> Order {
        OrderCreate {
            customer: "Fatou".into(),
            items: vec!["Pagne".into(), "Boubou".into()],
            total_amount: 15_000,
            paid_amount: 15_000,
            ..Default::default()
        }
        .into_order("abc".into(), chrono::Utc::now())
    }

    #[test]
    fn created_event_wire_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&PushEvent::OrderCreated(order()).to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "order_created");
        assert_eq!(json["data"]["id"], "abc");
        assert_eq!(json["data"]["status"], "paid");
    }

    #[test]
    fn deleted_event_carries_only_the_id() {
        let text = PushEvent::deleted("abc").to_json().unwrap();
        assert_eq!(text, r#"{"type":"order_deleted","data":{"id":"abc"}}"#);
    }

    #[test]
    fn parses_frames_from_the_server() {
        let text = r#"{"type":"order_updated","data":{"id":"1","customer":"A","items":[],
            "totalAmount":10,"paidAmount":0,"status":"pending","note":null,"images":null,
            "createdAt":"2025-03-01T10:00:00Z"}}"#;
        let event = PushEvent::from_json(text).unwrap();
        assert_eq!(event.event_type(), EventType::OrderUpdated);
        assert_eq!(event.order_id(), "1");
        match event {
            PushEvent::OrderUpdated(o) => assert_eq!(o.status, OrderStatus::Pending),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_event_types() {
        assert!(PushEvent::from_json(r#"{"type":"order_archived","data":{"id":"1"}}"#).is_err());
        assert!(PushEvent::from_json("not json").is_err());
    }
}
