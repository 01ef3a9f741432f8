/// reqwest client for the record-management backend
///
/// Endpoints (relative to the configured base URL):
/// 1. Fetch: POST /v1/projects/{project}/tables/{table}/records/query
/// 2. Get:   GET  /v1/projects/{project}/tables/{table}/records/{id}?fields=..
/// 3. Create/Update/Delete: POST/PATCH/DELETE /v1/projects/{project}/tables/{table}/records
use reqwest::{Client as HttpClient, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::{Record, RecordOutcome, RecordQuery, RecordStore};
use crate::config::RemoteCredentials;
use crate::error::{AppError, AppResult};

const PUBLIC_KEY_HEADER: &str = "x-public-key";

#[derive(Debug, Deserialize)]
struct FetchEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Vec<Record>>,
}

#[derive(Debug, Deserialize)]
struct GetEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Record>,
}

#[derive(Debug, Deserialize)]
struct BatchEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    results: Option<Vec<RecordOutcome>>,
}

fn envelope_failure(table: &str, message: Option<String>) -> AppError {
    let message = message.unwrap_or_else(|| "request failed".to_string());
    tracing::error!(table = %table, message = %message, "Record store reported failure");
    AppError::Remote(message)
}

pub(crate) fn parse_fetch_envelope(table: &str, body: &str) -> AppResult<Vec<Record>> {
    let envelope: FetchEnvelope = serde_json::from_str(body).map_err(|e| {
        tracing::error!(error = %e, response = %body, "Failed to deserialize fetch response");
        AppError::Remote(format!("Failed to parse fetch response: {}", e))
    })?;

    if !envelope.success {
        return Err(envelope_failure(table, envelope.message));
    }
    Ok(envelope.data.unwrap_or_default())
}

pub(crate) fn parse_get_envelope(table: &str, body: &str) -> AppResult<Option<Record>> {
    let envelope: GetEnvelope = serde_json::from_str(body).map_err(|e| {
        tracing::error!(error = %e, response = %body, "Failed to deserialize get response");
        AppError::Remote(format!("Failed to parse get response: {}", e))
    })?;

    if !envelope.success {
        return Err(envelope_failure(table, envelope.message));
    }
    Ok(envelope.data.filter(|record| !record.is_empty()))
}

pub(crate) fn parse_batch_envelope(table: &str, body: &str) -> AppResult<Vec<RecordOutcome>> {
    let envelope: BatchEnvelope = serde_json::from_str(body).map_err(|e| {
        tracing::error!(error = %e, response = %body, "Failed to deserialize batch response");
        AppError::Remote(format!("Failed to parse batch response: {}", e))
    })?;

    if !envelope.success {
        return Err(envelope_failure(table, envelope.message));
    }
    Ok(envelope.results.unwrap_or_default())
}

#[derive(Clone)]
pub struct HttpRecordStore {
    http_client: HttpClient,
    api_url: String,
    project_id: String,
    public_key: String,
}

impl HttpRecordStore {
    pub fn new(credentials: RemoteCredentials) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: credentials.api_url.trim_end_matches('/').to_string(),
            project_id: credentials.project_id,
            public_key: credentials.public_key,
        }
    }

    fn records_url(&self, table: &str) -> String {
        format!(
            "{}/v1/projects/{}/tables/{}/records",
            self.api_url, self.project_id, table
        )
    }

    /// Sends the request and returns the body, rejecting non-2xx statuses
    ///
    /// Error statuses still carry an envelope most of the time, so its
    /// message is preferred over the raw body.
    async fn send(
        &self,
        table: &str,
        method: Method,
        url: String,
        body: Option<serde_json::Value>,
    ) -> AppResult<(StatusCode, String)> {
        self.send_with_query(table, method, url, &[], body).await
    }

    fn request(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> RequestBuilder {
        let mut request = self
            .http_client
            .request(method, url)
            .header(PUBLIC_KEY_HEADER, &self.public_key);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        request
    }

    async fn send_with_query(
        &self,
        table: &str,
        method: Method,
        url: String,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> AppResult<(StatusCode, String)> {
        let response = self
            .request(method.clone(), &url, query, body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        tracing::debug!(
            table = %table,
            method = %method,
            status = %status,
            "Record store response"
        );

        Ok((status, text))
    }

    fn status_error(table: &str, status: StatusCode, body: &str) -> AppError {
        #[derive(Deserialize)]
        struct ErrorEnvelope {
            message: Option<String>,
        }

        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| body.to_string());
        tracing::error!(table = %table, status = %status, message = %message, "Record store returned error status");
        AppError::Remote(format!("Record store returned status {}: {}", status, message))
    }
}

#[async_trait::async_trait]
impl RecordStore for HttpRecordStore {
    async fn fetch_records(&self, table: &str, query: RecordQuery) -> AppResult<Vec<Record>> {
        let url = format!("{}/query", self.records_url(table));
        let (status, body) = self
            .send(table, Method::POST, url, Some(serde_json::to_value(&query)?))
            .await?;
        if !status.is_success() {
            return Err(Self::status_error(table, status, &body));
        }

        let records = parse_fetch_envelope(table, &body)?;
        tracing::info!(table = %table, results = records.len(), "Records fetched");
        Ok(records)
    }

    async fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        fields: Vec<String>,
    ) -> AppResult<Option<Record>> {
        let url = format!("{}/{}", self.records_url(table), id);
        let (status, body) = self
            .send_with_query(table, Method::GET, url, &[("fields", fields.join(","))], None)
            .await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Self::status_error(table, status, &body));
        }
        parse_get_envelope(table, &body)
    }

    async fn create_records(
        &self,
        table: &str,
        records: Vec<Record>,
    ) -> AppResult<Vec<RecordOutcome>> {
        let (status, body) = self
            .send(
                table,
                Method::POST,
                self.records_url(table),
                Some(json!({ "records": records })),
            )
            .await?;
        if !status.is_success() {
            return Err(Self::status_error(table, status, &body));
        }
        parse_batch_envelope(table, &body)
    }

    async fn update_records(
        &self,
        table: &str,
        records: Vec<Record>,
    ) -> AppResult<Vec<RecordOutcome>> {
        let (status, body) = self
            .send(
                table,
                Method::PATCH,
                self.records_url(table),
                Some(json!({ "records": records })),
            )
            .await?;
        if !status.is_success() {
            return Err(Self::status_error(table, status, &body));
        }
        parse_batch_envelope(table, &body)
    }

    async fn delete_records(&self, table: &str, ids: Vec<i64>) -> AppResult<Vec<RecordOutcome>> {
        let (status, body) = self
            .send(
                table,
                Method::DELETE,
                self.records_url(table),
                Some(json!({ "recordIds": ids })),
            )
            .await?;
        if !status.is_success() {
            return Err(Self::status_error(table, status, &body));
        }
        parse_batch_envelope(table, &body)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
