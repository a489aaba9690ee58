//! Order export
//!
//! File-format contracts for spreadsheet (CSV), archive (JSON) and
//! database dump (SQL) exports. Used by `GET /api/export` and `order-admin`.

pub mod csv;
pub mod json;
pub mod sql;

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::repository::{RepoError, order};
use crate::utils::{AppError, ErrorCode};
use shared::models::Order;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("No orders found for the selected period")]
    Empty,

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::InvalidPeriod(msg) => AppError::validation(msg),
            ExportError::Empty => AppError::new(ErrorCode::ExportEmpty),
            ExportError::Repo(e) => e.into(),
            ExportError::Json(e) => AppError::internal(format!("Export serialization failed: {e}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Sql,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Sql => "sql",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
            ExportFormat::Sql => "application/sql; charset=utf-8",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    /// Restorable into this server's schema
    #[default]
    Sqlite,
    Postgres,
}

/// Calendar filter on `createdAt` (UTC)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ExportPeriod {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl ExportPeriod {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn year(year: i32) -> Self {
        Self {
            year: Some(year),
            month: None,
        }
    }

    pub fn month(year: i32, month: u32) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
        }
    }

    /// `[start, end)` of the period, `None` for everything
    pub fn bounds(&self) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, ExportError> {
        let start_of = |y: i32, m: u32| {
            Utc.with_ymd_and_hms(y, m, 1, 0, 0, 0)
                .single()
                .ok_or_else(|| ExportError::InvalidPeriod(format!("{m}/{y} is not a valid month")))
        };
        match (self.year, self.month) {
            (None, None) => Ok(None),
            (None, Some(_)) => Err(ExportError::InvalidPeriod(
                "month requires a year".into(),
            )),
            (Some(y), None) => Ok(Some((start_of(y, 1)?, start_of(y + 1, 1)?))),
            (Some(y), Some(m)) => {
                if !(1..=12).contains(&m) {
                    return Err(ExportError::InvalidPeriod(format!(
                        "month must be between 1 and 12, got {m}"
                    )));
                }
                let end = if m == 12 {
                    start_of(y + 1, 1)?
                } else {
                    start_of(y, m + 1)?
                };
                Ok(Some((start_of(y, m)?, end)))
            }
        }
    }

    /// Human label: `"3 2025"`, `"2025"` or `"all"`
    pub fn label(&self) -> String {
        match (self.year, self.month) {
            (Some(y), Some(m)) => format!("{m} {y}"),
            (Some(y), None) => y.to_string(),
            _ => "all".to_string(),
        }
    }

    pub fn file_stem(&self) -> String {
        match (self.year, self.month) {
            (Some(y), Some(m)) => format!("commandes_{m}_{y}"),
            (Some(y), None) => format!("commandes_{y}"),
            _ => "commandes".to_string(),
        }
    }
}

/// A rendered export ready to be written or downloaded
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: String,
    pub orders: usize,
}

pub async fn load_orders(pool: &SqlitePool, period: ExportPeriod) -> Result<Vec<Order>, ExportError> {
    let orders = match period.bounds()? {
        Some((from, to)) => order::find_created_between(pool, from, to).await?,
        None => order::find_all(pool).await?,
    };
    Ok(orders)
}

/// Render `orders` in `format`. CSV and JSON refuse an empty selection.
pub fn render(
    format: ExportFormat,
    period: ExportPeriod,
    dialect: SqlDialect,
    orders: &[Order],
    now: DateTime<Utc>,
) -> Result<ExportArtifact, ExportError> {
    let body = match format {
        ExportFormat::Csv if orders.is_empty() => return Err(ExportError::Empty),
        ExportFormat::Json if orders.is_empty() => return Err(ExportError::Empty),
        ExportFormat::Csv => csv::render(orders),
        ExportFormat::Json => json::render(orders, period, now)?,
        ExportFormat::Sql => sql::render(orders, dialect, now),
    };
    let file_name = match format {
        ExportFormat::Sql => sql::file_name(now),
        _ => format!("{}.{}", period.file_stem(), format.extension()),
    };
    Ok(ExportArtifact {
        file_name,
        content_type: format.content_type(),
        body,
        orders: orders.len(),
    })
}

/// Load and render in one step
pub async fn export(
    pool: &SqlitePool,
    format: ExportFormat,
    period: ExportPeriod,
    dialect: SqlDialect,
) -> Result<ExportArtifact, ExportError> {
    let orders = load_orders(pool, period).await?;
    let artifact = render(format, period, dialect, &orders, Utc::now())?;
    tracing::info!(
        format = format.extension(),
        period = %period.label(),
        orders = artifact.orders,
        "Orders exported"
    );
    Ok(artifact)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds_cover_exactly_one_month() {
        let (from, to) = ExportPeriod::month(2025, 12).bounds().unwrap().unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());

        let (from, to) = ExportPeriod::year(2024).bounds().unwrap().unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());

        assert!(ExportPeriod::all().bounds().unwrap().is_none());
    }

    #[test]
    fn invalid_periods_are_rejected() {
        assert!(ExportPeriod::month(2025, 13).bounds().is_err());
        assert!(ExportPeriod::month(2025, 0).bounds().is_err());
        let month_only = ExportPeriod {
            year: None,
            month: Some(3),
        };
        assert!(month_only.bounds().is_err());
    }

    #[test]
    fn labels_and_file_names() {
        assert_eq!(ExportPeriod::month(2025, 3).label(), "3 2025");
        assert_eq!(ExportPeriod::year(2025).label(), "2025");
        assert_eq!(ExportPeriod::all().label(), "all");

        let orders = vec![fixtures::order("1", "Awa", 100, 50)];
        let artifact = render(
            ExportFormat::Csv,
            ExportPeriod::month(2025, 3),
            SqlDialect::Sqlite,
            &orders,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(artifact.file_name, "commandes_3_2025.csv");
        assert_eq!(artifact.orders, 1);
    }

    #[test]
    fn empty_selection_only_allowed_for_sql() {
        let now = Utc::now();
        let period = ExportPeriod::month(2025, 3);
        assert!(matches!(
            render(ExportFormat::Csv, period, SqlDialect::Sqlite, &[], now),
            Err(ExportError::Empty)
        ));
        assert!(matches!(
            render(ExportFormat::Json, period, SqlDialect::Sqlite, &[], now),
            Err(ExportError::Empty)
        ));
        assert!(render(ExportFormat::Sql, period, SqlDialect::Sqlite, &[], now).is_ok());
    }
}
