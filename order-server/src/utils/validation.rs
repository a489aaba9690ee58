//! Input validation helpers
//!
//! Create/update payloads are checked field by field and every violation is
//! reported at once, e.g. `customer must not be empty; totalAmount must be >= 0`.
//! The offending field names are also listed in `details.fields`.

use crate::utils::AppError;
use shared::models::{OrderCreate, OrderUpdate};

// ── Text length limits ──────────────────────────────────────────────

/// Customer name
pub const MAX_NAME_LEN: usize = 200;

/// Order note
pub const MAX_NOTE_LEN: usize = 500;

/// One item description
pub const MAX_ITEM_LEN: usize = 200;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

/// Collected violations for one payload
#[derive(Debug, Default)]
pub struct Violations {
    entries: Vec<(&'static str, String)>,
}

impl Violations {
    fn push(&mut self, field: &'static str, message: String) {
        self.entries.push((field, message));
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.entries.is_empty() {
            return Ok(());
        }
        let message = self
            .entries
            .iter()
            .map(|(_, m)| m.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        let mut fields: Vec<&str> = self.entries.iter().map(|(f, _)| *f).collect();
        fields.dedup();
        Err(AppError::validation(message).with_detail("fields", fields))
    }

    // ── Field rules ─────────────────────────────────────────────────

    pub fn required_text(&mut self, value: &str, field: &'static str, max_len: usize) {
        if value.trim().is_empty() {
            self.push(field, format!("{field} must not be empty"));
        } else {
            self.max_len(value, field, max_len);
        }
    }

    pub fn max_len(&mut self, value: &str, field: &'static str, max_len: usize) {
        let len = value.chars().count();
        if len > max_len {
            self.push(
                field,
                format!("{field} is too long ({len} chars, max {max_len})"),
            );
        }
    }

    pub fn non_negative(&mut self, value: i64, field: &'static str) {
        if value < 0 {
            self.push(field, format!("{field} must be >= 0"));
        }
    }

    pub fn items(&mut self, items: &[String]) {
        if items.is_empty() {
            self.push("items", "items must contain at least one entry".into());
        } else if items.iter().any(|i| i.trim().is_empty()) {
            self.push("items", "items must not contain empty entries".into());
        } else if let Some(long) = items.iter().find(|i| i.chars().count() > MAX_ITEM_LEN) {
            self.max_len(long, "items", MAX_ITEM_LEN);
        }
    }

    pub fn images(&mut self, images: &[String]) {
        if let Some(url) = images
            .iter()
            .find(|url| url.trim().is_empty() || url.len() > MAX_URL_LEN)
        {
            self.push(
                "images",
                format!("images entries must be 1..={MAX_URL_LEN} chars, got {}", url.len()),
            );
        }
    }
}

pub fn validate_order_create(payload: &OrderCreate) -> Result<(), AppError> {
    let mut v = Violations::default();
    v.required_text(&payload.customer, "customer", MAX_NAME_LEN);
    v.items(&payload.items);
    v.non_negative(payload.total_amount, "totalAmount");
    v.non_negative(payload.paid_amount, "paidAmount");
    if let Some(note) = &payload.note {
        v.max_len(note, "note", MAX_NOTE_LEN);
    }
    if let Some(images) = &payload.images {
        v.images(images);
    }
    v.into_result()
}

pub fn validate_order_update(payload: &OrderUpdate) -> Result<(), AppError> {
    let mut v = Violations::default();
    if let Some(customer) = &payload.customer {
        v.required_text(customer, "customer", MAX_NAME_LEN);
    }
    if let Some(items) = &payload.items {
        v.items(items);
    }
    if let Some(total) = payload.total_amount {
        v.non_negative(total, "totalAmount");
    }
    if let Some(paid) = payload.paid_amount {
        v.non_negative(paid, "paidAmount");
    }
    if let Some(Some(note)) = &payload.note {
        v.max_len(note, "note", MAX_NOTE_LEN);
    }
    if let Some(Some(images)) = &payload.images {
        v.images(images);
    }
    v.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ErrorCode;

    fn valid() -> OrderCreate {
        OrderCreate {
            customer: "Awa".into(),
            items: vec!["Robe".into()],
            total_amount: 10_000,
            paid_amount: 4_000,
            ..Default::default()
        }
    }

    #[test]
    fn accepts_valid_payload() {
        assert!(validate_order_create(&valid()).is_ok());
    }

    #[test]
    fn reports_every_violation() {
        let payload = OrderCreate {
            customer: "  ".into(),
            total_amount: -1,
            ..valid()
        };
        let err = validate_order_create(&payload).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(
            err.message,
            "customer must not be empty; totalAmount must be >= 0"
        );
        let details = err.details.unwrap();
        assert_eq!(details["fields"], serde_json::json!(["customer", "totalAmount"]));
    }

    #[test]
    fn empty_items_rejected() {
        let payload = OrderCreate {
            items: vec![],
            ..valid()
        };
        assert!(validate_order_create(&payload).is_err());
    }

    #[test]
    fn update_only_checks_present_fields() {
        assert!(validate_order_update(&OrderUpdate::default()).is_ok());

        let update = OrderUpdate {
            paid_amount: Some(-5),
            note: Some(Some("x".repeat(MAX_NOTE_LEN + 1))),
            ..Default::default()
        };
        let err = validate_order_update(&update).unwrap_err();
        assert!(err.message.contains("paidAmount must be >= 0"));
        assert!(err.message.contains("note is too long"));

        let clear_note = OrderUpdate {
            note: Some(None),
            ..Default::default()
        };
        assert!(validate_order_update(&clear_note).is_ok());
    }
}
