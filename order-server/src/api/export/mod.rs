//! Export Routes
//!
//! `GET /api/export?format=csv|json|sql&year=YYYY&month=M[&dialect=sqlite|postgres]`

use axum::{
    Router,
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
    routing::get,
};
use http::header;
use serde::Deserialize;

use crate::core::ServerState;
use crate::export::{self, ExportFormat, ExportPeriod, SqlDialect};
use crate::utils::{AppError, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/export", get(download))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: ExportFormat,
    pub year: Option<i32>,
    pub month: Option<u32>,
    #[serde(default)]
    pub dialect: SqlDialect,
}

/// GET /api/export - 下载导出文件
async fn download(
    State(state): State<ServerState>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> AppResult<Response> {
    let Query(query) = query.map_err(|rejection| AppError::validation(rejection.body_text()))?;
    let period = ExportPeriod {
        year: query.year,
        month: query.month,
    };
    let artifact = export::export(&state.pool, query.format, period, query.dialect).await?;

    Ok((
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.file_name),
            ),
        ],
        artifact.body,
    )
        .into_response())
}
