//! Archive export: summary envelope plus one entry per order.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::ExportPeriod;
use shared::models::{Order, OrderStatus};

#[derive(Debug, Serialize)]
pub struct ExportEnvelope<'a> {
    pub periode: String,
    pub date_export: String,
    pub total_commandes: usize,
    /// Sum of `i64` amounts, never overflows
    pub total_revenu: i128,
    pub total_dette: i128,
    pub commandes: Vec<ExportedOrder<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ExportedOrder<'a> {
    pub id: &'a str,
    pub date: String,
    pub client: &'a str,
    pub articles: &'a [String],
    pub montant_total: i64,
    pub montant_paye: i64,
    pub reste_a_payer: i64,
    pub statut: OrderStatus,
    pub note: Option<&'a str>,
    pub images: Option<&'a [String]>,
}

pub fn envelope(orders: &[Order], period: ExportPeriod, now: DateTime<Utc>) -> ExportEnvelope<'_> {
    ExportEnvelope {
        periode: period.label(),
        date_export: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        total_commandes: orders.len(),
        total_revenu: orders.iter().map(|o| i128::from(o.paid_amount)).sum(),
        total_dette: orders.iter().map(|o| i128::from(o.remaining_amount())).sum(),
        commandes: orders
            .iter()
            .map(|o| ExportedOrder {
                id: &o.id,
                date: o.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                client: &o.customer,
                articles: &o.items,
                montant_total: o.total_amount,
                montant_paye: o.paid_amount,
                reste_a_payer: o.remaining_amount(),
                statut: o.status,
                note: o.note.as_deref(),
                images: o.images.as_deref(),
            })
            .collect(),
    }
}

pub fn render(
    orders: &[Order],
    period: ExportPeriod,
    now: DateTime<Utc>,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&envelope(orders, period, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fixtures::order;

    #[test]
    fn summary_totals() {
        let orders = vec![order("1", "Awa", 10_000, 4_000), order("2", "Binta", 3_000, 3_000)];
        let text = render(&orders, ExportPeriod::month(2025, 3), Utc::now()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(json["periode"], "3 2025");
        assert_eq!(json["total_commandes"], 2);
        assert_eq!(json["total_revenu"], 7_000);
        assert_eq!(json["total_dette"], 6_000);
        assert_eq!(json["commandes"][0]["reste_a_payer"], 6_000);
        assert_eq!(json["commandes"][0]["statut"], "partial");
        assert_eq!(json["commandes"][1]["client"], "Binta");
        assert_eq!(json["commandes"][1]["articles"][0], "Robe");
        assert!(json["commandes"][1]["note"].is_null());
    }

    #[test]
    fn totals_beyond_i64_do_not_overflow() {
        let orders = vec![order("1", "Awa", i64::MAX, i64::MAX), order("2", "Binta", i64::MAX, i64::MAX)];
        let text = render(&orders, ExportPeriod::all(), Utc::now()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(json["total_revenu"].as_u64(), Some(i64::MAX as u64 * 2));
        assert_eq!(json["total_dette"], 0);
        assert_eq!(json["commandes"][0]["statut"], "paid");
    }
}
