//! Order Repository

use super::{RepoError, RepoResult};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use shared::models::{Order, OrderCreate, OrderStatus, OrderUpdate};
use shared::util::new_order_id;
use sqlx::SqlitePool;

const SELECT_COLUMNS: &str = "SELECT id, customer, items, total_amount, paid_amount, status, note, images, created_at FROM orders";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    customer: String,
    items: String,
    total_amount: i64,
    paid_amount: i64,
    status: OrderStatus,
    note: Option<String>,
    images: Option<String>,
    created_at: String,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepoError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| {
                RepoError::Serialization(format!("order {} created_at: {e}", row.id))
            })?
            .with_timezone(&Utc);
        let images = row
            .images
            .as_deref()
            .map(serde_json::from_str::<Vec<String>>)
            .transpose()?;
        Ok(Order {
            items: serde_json::from_str(&row.items)?,
            id: row.id,
            customer: row.customer,
            total_amount: row.total_amount,
            paid_amount: row.paid_amount,
            status: row.status,
            note: row.note,
            images,
            created_at,
        })
    }
}

/// Fixed-width RFC 3339 (UTC, microseconds) so text order matches time order
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn collect(rows: Vec<OrderRow>) -> RepoResult<Vec<Order>> {
    rows.into_iter().map(Order::try_from).collect()
}

/// All orders, oldest first
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_COLUMNS} ORDER BY created_at, id"))
        .fetch_all(pool)
        .await?;
    collect(rows)
}

/// Orders created in `[from, to)`, oldest first
pub async fn find_created_between(
    pool: &SqlitePool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> RepoResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "{SELECT_COLUMNS} WHERE created_at >= ? AND created_at < ? ORDER BY created_at, id"
    ))
    .bind(format_timestamp(&from))
    .bind(format_timestamp(&to))
    .fetch_all(pool)
    .await?;
    collect(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(Order::try_from).transpose()
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

async fn insert<'e, E>(executor: E, order: &Order) -> RepoResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let images = order.images.as_ref().map(serde_json::to_string).transpose()?;
    sqlx::query(
        "INSERT INTO orders (id, customer, items, total_amount, paid_amount, status, note, images, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&order.id)
    .bind(&order.customer)
    .bind(serde_json::to_string(&order.items)?)
    .bind(order.total_amount)
    .bind(order.paid_amount)
    .bind(order.status)
    .bind(&order.note)
    .bind(images)
    .bind(format_timestamp(&order.created_at))
    .execute(executor)
    .await?;
    Ok(())
}

/// Insert a new order. Id and createdAt are assigned here, status is derived.
pub async fn create(pool: &SqlitePool, data: OrderCreate) -> RepoResult<Order> {
    let order = data.into_order(new_order_id(), Utc::now().trunc_subsecs(6));
    insert(pool, &order).await?;
    Ok(order)
}

/// Merge `data` into the stored order and write it back.
pub async fn update(pool: &SqlitePool, id: &str, data: OrderUpdate) -> RepoResult<Order> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))?;
    let mut order = Order::try_from(row)?;
    order.apply(data);

    let images = order.images.as_ref().map(serde_json::to_string).transpose()?;
    sqlx::query(
        "UPDATE orders SET customer = ?, items = ?, total_amount = ?, paid_amount = ?, status = ?, note = ?, images = ? \
         WHERE id = ?",
    )
    .bind(&order.customer)
    .bind(serde_json::to_string(&order.items)?)
    .bind(order.total_amount)
    .bind(order.paid_amount)
    .bind(order.status)
    .bind(&order.note)
    .bind(images)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(order)
}

/// Hard delete. Returns false when no row matched.
pub async fn delete(pool: &SqlitePool, id: &str) -> RepoResult<bool> {
    let result = sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Replace the whole table with `orders`, atomically. Used by restore.
pub async fn replace_all(pool: &SqlitePool, orders: &[Order]) -> RepoResult<usize> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM orders").execute(&mut *tx).await?;
    for order in orders {
        insert(&mut *tx, order).await?;
    }
    tx.commit().await?;
    Ok(orders.len())
}
