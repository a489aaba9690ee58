//! SQL dump: wipe then one INSERT per order.

use chrono::{DateTime, SecondsFormat, Utc};

use super::SqlDialect;
use crate::db::repository::order::format_timestamp;
use shared::models::Order;

/// `backup-<timestamp>.sql`, colons replaced so the name is portable
pub fn file_name(now: DateTime<Utc>) -> String {
    format!(
        "backup-{}.sql",
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-")
    )
}

/// Single-quoted SQL string literal
pub fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn list(values: &[String], dialect: SqlDialect) -> String {
    match dialect {
        SqlDialect::Postgres => format!(
            "ARRAY[{}]::text[]",
            values.iter().map(|v| literal(v)).collect::<Vec<_>>().join(", ")
        ),
        // Stored as a JSON array in TEXT
        SqlDialect::Sqlite => {
            literal(&serde_json::to_string(values).unwrap_or_else(|_| "[]".into()))
        }
    }
}

pub fn render(orders: &[Order], dialect: SqlDialect, now: DateTime<Utc>) -> String {
    let mut sql = format!(
        "-- Orders database export\n-- Date: {}\n-- Orders: {}\n\n-- Cleanup\n{}\n\n-- Data\n",
        now.to_rfc3339_opts(SecondsFormat::Millis, true),
        orders.len(),
        match dialect {
            SqlDialect::Sqlite => "DELETE FROM orders;",
            SqlDialect::Postgres => "TRUNCATE TABLE orders CASCADE;",
        }
    );

    for order in orders {
        let note = order
            .note
            .as_deref()
            .map(literal)
            .unwrap_or_else(|| "NULL".into());
        let images = order
            .images
            .as_deref()
            .map(|images| list(images, dialect))
            .unwrap_or_else(|| "NULL".into());
        sql.push_str(&format!(
            "INSERT INTO orders (id, customer, items, total_amount, paid_amount, status, note, images, created_at) VALUES (\n  {},\n  {},\n  {},\n  {},\n  {},\n  {},\n  {},\n  {},\n  {}\n);\n\n",
            literal(&order.id),
            literal(&order.customer),
            list(&order.items, dialect),
            order.total_amount,
            order.paid_amount,
            literal(order.status.as_str()),
            note,
            images,
            literal(&format_timestamp(&order.created_at)),
        ));
    }
    sql
}
