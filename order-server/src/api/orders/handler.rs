//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::core::ServerState;
use crate::db::repository::{RepoError, order};
use crate::utils::validation::{validate_order_create, validate_order_update};
use crate::utils::{AppError, AppResult};
use shared::message::PushEvent;
use shared::models::{Order, OrderCreate, OrderStatus, OrderUpdate};

/// Unwrap a JSON body, reporting syntax and type errors as 400
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

fn log_ignored_status(id: Option<&str>, sent: Option<OrderStatus>, derived: OrderStatus) {
    if let Some(sent) = sent
        && sent != derived
    {
        tracing::debug!(order_id = ?id, %sent, %derived, "Client status ignored, using derived status");
    }
}

/// GET /api/orders - 获取所有订单
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Order>>> {
    let orders = order::find_all(&state.pool).await?;
    Ok(Json(orders))
}

/// GET /api/orders/:id - 获取单个订单
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let found = order::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::order_not_found(&id))?;
    Ok(Json(found))
}

/// POST /api/orders - 创建订单
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<OrderCreate>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let payload = json_body(payload)?;
    validate_order_create(&payload)?;
    log_ignored_status(None, payload.status, payload.derived_status());

    let created = order::create(&state.pool, payload).await?;

    let report = state.broadcast(&PushEvent::OrderCreated(created.clone()));
    tracing::info!(
        order_id = %created.id,
        status = %created.status,
        delivered = report.delivered,
        failed = report.failed,
        "Order created"
    );

    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/orders/:id - 部分更新订单
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Result<Json<OrderUpdate>, JsonRejection>,
) -> AppResult<Json<Order>> {
    let payload = json_body(payload)?;
    validate_order_update(&payload)?;
    let sent_status = payload.status;

    let updated = match order::update(&state.pool, &id, payload).await {
        Ok(updated) => updated,
        Err(RepoError::NotFound(_)) => return Err(AppError::order_not_found(&id)),
        Err(e) => return Err(e.into()),
    };
    log_ignored_status(Some(&id), sent_status, updated.status);

    let report = state.broadcast(&PushEvent::OrderUpdated(updated.clone()));
    tracing::info!(
        order_id = %id,
        status = %updated.status,
        delivered = report.delivered,
        failed = report.failed,
        "Order updated"
    );

    Ok(Json(updated))
}

/// DELETE /api/orders/:id - 删除订单
///
/// Only a delete that removed a row is broadcast.
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if !order::delete(&state.pool, &id).await? {
        return Err(AppError::order_not_found(&id));
    }

    let report = state.broadcast(&PushEvent::deleted(id.clone()));
    tracing::info!(
        order_id = %id,
        delivered = report.delivered,
        failed = report.failed,
        "Order deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
