//! HTTP client for the order REST API

use reqwest::{Client, Response, StatusCode, multipart};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::{ClientConfig, ClientError, ClientResult};
use shared::models::{Order, OrderCreate, OrderUpdate};

/// Server-side export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Sql,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Sql => "sql",
        }
    }
}

/// A downloaded export
#[derive(Debug, Clone)]
pub struct ExportDownload {
    /// File name from `Content-Disposition`, if any
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// `GET /health` body
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    /// Open push connections on the server
    pub connections: usize,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

/// Error body shape returned by the server
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// HTTP client for the order server
#[derive(Debug, Clone)]
pub struct OrderApi {
    client: Client,
    config: ClientConfig,
}

impl OrderApi {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn health(&self) -> ClientResult<HealthStatus> {
        let response = self.client.get(self.config.url("/health")).send().await?;
        Self::handle_response(response).await
    }

    // ========== Orders ==========

    pub async fn list_orders(&self) -> ClientResult<Vec<Order>> {
        let response = self.client.get(self.config.url("/api/orders")).send().await?;
        Self::handle_response(response).await
    }

    pub async fn get_order(&self, id: &str) -> ClientResult<Order> {
        let response = self
            .client
            .get(self.config.url(&format!("/api/orders/{id}")))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn create_order(&self, order: &OrderCreate) -> ClientResult<Order> {
        let response = self
            .client
            .post(self.config.url("/api/orders"))
            .json(order)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn update_order(&self, id: &str, update: &OrderUpdate) -> ClientResult<Order> {
        let response = self
            .client
            .patch(self.config.url(&format!("/api/orders/{id}")))
            .json(update)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn delete_order(&self, id: &str) -> ClientResult<()> {
        let response = self
            .client
            .delete(self.config.url(&format!("/api/orders/{id}")))
            .send()
            .await?;
        Self::check_status(response).await.map(|_| ())
    }

    // ========== Upload / Export ==========

    /// Upload one image, returns its `/uploads/...` URL
    pub async fn upload_image(
        &self,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> ClientResult<String> {
        let part = multipart::Part::bytes(bytes).file_name(file_name.into());
        let form = multipart::Form::new().part("image", part);
        let response = self
            .client
            .post(self.config.url("/api/upload"))
            .multipart(form)
            .send()
            .await?;
        let body: UploadResponse = Self::handle_response(response).await?;
        Ok(body.url)
    }

    pub async fn export(
        &self,
        format: ExportFormat,
        year: Option<i32>,
        month: Option<u32>,
    ) -> ClientResult<ExportDownload> {
        let mut query = vec![("format", format.as_str().to_string())];
        if let Some(year) = year {
            query.push(("year", year.to_string()));
        }
        if let Some(month) = month {
            query.push(("month", month.to_string()));
        }

        let response = self
            .client
            .get(self.config.url("/api/export"))
            .query(&query)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let file_name = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_attachment_name);
        let bytes = response.bytes().await?.to_vec();
        Ok(ExportDownload { file_name, bytes })
    }

    // ========== Response handling ==========

    /// Map non-2xx statuses to `ClientError`
    async fn check_status(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await?;
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.message)
            .unwrap_or_else(|_| text.clone());

        Err(match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::BAD_REQUEST => ClientError::Validation(message),
            s if s.is_server_error() => ClientError::Internal(message),
            s => ClientError::Unexpected {
                status: s.as_u16(),
                body: text,
            },
        })
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// `attachment; filename="x.csv"` -> `x.csv`
fn parse_attachment_name(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
}
