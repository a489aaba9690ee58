//! Order Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Payment status, derived from paid vs total amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum OrderStatus {
    Paid,
    Partial,
    Pending,
}

impl OrderStatus {
    /// `paid` once the total is covered, `pending` while nothing is paid,
    /// `partial` in between.
    pub fn derive(paid_amount: i64, total_amount: i64) -> Self {
        if paid_amount >= total_amount {
            Self::Paid
        } else if paid_amount == 0 {
            Self::Pending
        } else {
            Self::Partial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Partial => "partial",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer: String,
    pub items: Vec<String>,
    pub total_amount: i64,
    pub paid_amount: i64,
    pub status: OrderStatus,
    pub note: Option<String>,
    pub images: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Amount still owed (negative when overpaid)
    pub fn remaining_amount(&self) -> i64 {
        self.total_amount.saturating_sub(self.paid_amount)
    }

    /// Merge a partial update into this order and re-derive the status.
    ///
    /// `id` and `created_at` never change.
    pub fn apply(&mut self, update: OrderUpdate) {
        if let Some(customer) = update.customer {
            self.customer = customer;
        }
        if let Some(items) = update.items {
            self.items = items;
        }
        if let Some(total) = update.total_amount {
            self.total_amount = total;
        }
        if let Some(paid) = update.paid_amount {
            self.paid_amount = paid;
        }
        if let Some(note) = update.note {
            self.note = note;
        }
        if let Some(images) = update.images {
            self.images = images;
        }
        self.status = OrderStatus::derive(self.paid_amount, self.total_amount);
    }
}

/// Create order payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OrderCreate {
    pub customer: String,
    pub items: Vec<String>,
    pub total_amount: i64,
    #[serde(default)]
    pub paid_amount: i64,
    /// Accepted for compatibility; the stored status is always derived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl OrderCreate {
    pub fn derived_status(&self) -> OrderStatus {
        OrderStatus::derive(self.paid_amount, self.total_amount)
    }

    /// Build the stored order with a server-assigned id and timestamp.
    pub fn into_order(self, id: String, created_at: DateTime<Utc>) -> Order {
        let status = self.derived_status();
        Order {
            id,
            customer: self.customer,
            items: self.items,
            total_amount: self.total_amount,
            paid_amount: self.paid_amount,
            status,
            note: self.note,
            images: self.images,
            created_at,
        }
    }
}

/// Partial update payload
///
/// `note` and `images` distinguish "absent" (keep) from `null` (clear).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OrderUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub note: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub images: Option<Option<Vec<String>>>,
}

impl OrderUpdate {
    pub fn is_empty(&self) -> bool {
        self.customer.is_none()
            && self.items.is_none()
            && self.total_amount.is_none()
            && self.paid_amount.is_none()
            && self.status.is_none()
            && self.note.is_none()
            && self.images.is_none()
    }
}

// A field that is present maps to `Some`, even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
