//! Spreadsheet export: UTF-8 BOM, `;` delimiter, French headers.

use shared::models::{Order, OrderStatus};

pub const BOM: char = '\u{FEFF}';
pub const DELIMITER: &str = ";";

const HEADERS: [&str; 8] = [
    "Date",
    "Client",
    "Articles",
    "Montant Total",
    "Montant Payé",
    "Reste à Payer",
    "Statut",
    "Note",
];

pub fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Paid => "Payée",
        OrderStatus::Partial => "Partielle",
        OrderStatus::Pending => "En attente",
    }
}

/// Always-quoted text cell with embedded quotes doubled
fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn row(order: &Order) -> String {
    [
        order.created_at.format("%d/%m/%Y").to_string(),
        quoted(&order.customer),
        quoted(&order.items.join(" | ")),
        order.total_amount.to_string(),
        order.paid_amount.to_string(),
        order.remaining_amount().to_string(),
        status_label(order.status).to_string(),
        quoted(order.note.as_deref().unwrap_or("")),
    ]
    .join(DELIMITER)
}

pub fn render(orders: &[Order]) -> String {
    let mut out = String::new();
    out.push(BOM);
    out.push_str(&HEADERS.join(DELIMITER));
    for order in orders {
        out.push('\n');
        out.push_str(&row(order));
    }
    out
}
