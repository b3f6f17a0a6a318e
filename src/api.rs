//! Admin dashboard API client.
//!
//! Defines the collaborator contract the list controller talks to
//! (`ListingService`, `MutationService`) and the HTTP+JSON implementation
//! that calls the dashboard's PHP endpoints.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::config::AppConfig;
use crate::error::ListError;
use crate::filters::FilterCriteria;
use crate::paging::PageRequest;
use crate::wire::{lenient_opt_u64, value_bool, value_str};

/// Default timeout for API requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const API_KEY_HEADER: &str = "X-Admin-Api-Key";
const REQUEST_ID_HEADER: &str = "X-Request-Id";
const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

// ---------------------------------------------------------------------------
// URL handling
// ---------------------------------------------------------------------------

/// Normalise the admin dashboard URL:
/// - ensure a scheme is present (https, or http for localhost)
/// - strip trailing slashes
/// - strip a trailing `/api` segment
pub fn normalize_admin_url(url: &str) -> String {
    let mut url = url.trim().to_string();
    if url.is_empty() {
        return url;
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }
    if url.ends_with("/api") {
        url.truncate(url.len() - 4);
    }
    while url.ends_with('/') {
        url.pop();
    }

    url
}

/// Resource names map to `/api/{resource}.php`; only `[a-z0-9_]` is allowed.
pub fn validate_resource(resource: &str) -> Result<(), ListError> {
    let trimmed = resource.trim();
    if trimmed.is_empty() {
        return Err(ListError::Validation("Missing resource name".into()));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(ListError::Validation(format!(
            "Invalid resource name: {trimmed}"
        )));
    }
    Ok(())
}

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Build `path?page=..&page_size=..&<criteria>`. Unset criteria never appear.
pub fn build_list_query(path: &str, criteria: &FilterCriteria, request: PageRequest) -> String {
    let mut query: Vec<(String, String)> = vec![
        ("page".into(), request.page.to_string()),
        ("page_size".into(), request.page_size.to_string()),
    ];
    query.extend(
        criteria
            .to_query_pairs()
            .into_iter()
            .filter(|(k, v)| !v.is_empty() && k != "page" && k != "page_size"),
    );

    let mut out = String::from(path);
    out.push('?');
    out.push_str(
        &query
            .iter()
            .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
            .collect::<Vec<String>>()
            .join("&"),
    );
    out
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Convert a `reqwest::Error` into a user-friendly network error.
fn friendly_error(url: &str, err: &reqwest::Error) -> ListError {
    if err.is_connect() {
        return ListError::Network(format!("Cannot reach admin dashboard at {url}"));
    }
    if err.is_timeout() {
        return ListError::Network(format!("Connection to {url} timed out"));
    }
    if err.is_builder() {
        return ListError::Network(format!("Invalid admin dashboard URL: {url}"));
    }
    ListError::Network(format!(
        "Network error communicating with {url}: {err}"
    ))
}

/// Convert an HTTP status code into a user-friendly message.
fn status_error(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "API key is invalid or expired".to_string(),
        403 => "Not authorized for this screen".to_string(),
        404 => "Admin dashboard endpoint not found".to_string(),
        s if s >= 500 => format!("Admin dashboard server error (HTTP {s})"),
        s => format!("Unexpected response from admin dashboard (HTTP {s})"),
    }
}

/// Server error for a non-2xx reply, keeping the body's message if present.
fn http_failure(status: StatusCode, body_text: &str) -> ListError {
    match serde_json::from_str::<Value>(body_text)
        .ok()
        .and_then(|json| value_str(&json, &["message", "error", "mensagem"]))
    {
        Some(message) => ListError::Server(format!("{message} (HTTP {})", status.as_u16())),
        None => ListError::Server(status_error(status)),
    }
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct PaginationMeta {
    #[serde(default, deserialize_with = "lenient_opt_u64", alias = "total")]
    total_records: Option<u64>,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    total_pages: Option<u64>,
}

/// A successful listing reply with undecoded rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEnvelope {
    pub items: Vec<Value>,
    pub total_records: u64,
    pub total_pages: Option<u64>,
    pub message: Option<String>,
}

impl ListEnvelope {
    pub fn new(items: Vec<Value>, total_records: u64) -> Self {
        Self {
            items,
            total_records,
            total_pages: None,
            message: None,
        }
    }
}

/// Read `{ success, items|data, pagination, message? }`.
pub fn parse_list_envelope(body: &Value) -> Result<ListEnvelope, ListError> {
    let message = value_str(body, &["message", "error", "mensagem"]);
    let items = body.get("items").or_else(|| body.get("data"));
    let success = value_bool(body, &["success"]).unwrap_or(items.is_some());
    if !success {
        return Err(ListError::Server(
            message.unwrap_or_else(|| "Admin dashboard reported a failure".into()),
        ));
    }

    let items = match items {
        Some(Value::Array(rows)) => rows.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            return Err(ListError::Decode(format!(
                "expected an array of rows, got {other}"
            )))
        }
    };

    let meta = match body.get("pagination") {
        Some(v) if !v.is_null() => serde_json::from_value::<PaginationMeta>(v.clone())?,
        _ => PaginationMeta::default(),
    };

    Ok(ListEnvelope {
        total_records: meta.total_records.unwrap_or(items.len() as u64),
        total_pages: meta.total_pages,
        items,
        message,
    })
}

/// Mutation kinds accepted by the dashboard endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationOp {
    Create,
    Update,
    Delete,
}

impl MutationOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationOp::Create => "create",
            MutationOp::Update => "update",
            MutationOp::Delete => "delete",
        }
    }
}

/// A successful mutation reply.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationReply {
    pub message: Option<String>,
    pub data: Value,
}

/// Read `{ success, message?, data? }`.
pub fn parse_mutation_envelope(body: &Value) -> Result<MutationReply, ListError> {
    let message = value_str(body, &["message", "error", "mensagem"]);
    if !value_bool(body, &["success"]).unwrap_or(false) {
        return Err(ListError::Server(
            message.unwrap_or_else(|| "Admin dashboard rejected the change".into()),
        ));
    }
    Ok(MutationReply {
        message,
        data: body.get("data").cloned().unwrap_or(Value::Null),
    })
}

// ---------------------------------------------------------------------------
// Collaborator contract
// ---------------------------------------------------------------------------

/// Fetches one page of a resource.
pub trait ListingService {
    fn list_page(
        &self,
        resource: &str,
        criteria: &FilterCriteria,
        request: PageRequest,
    ) -> impl Future<Output = Result<ListEnvelope, ListError>> + Send;
}

/// Creates, updates or deletes a record of a resource.
pub trait MutationService {
    fn mutate(
        &self,
        resource: &str,
        op: MutationOp,
        payload: &Value,
    ) -> impl Future<Output = Result<MutationReply, ListError>> + Send;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// Authenticated HTTP client for the dashboard's PHP endpoints.
pub struct AdminClient {
    base: String,
    api_key: Zeroizing<String>,
    client: Client,
}

impl AdminClient {
    pub fn new(admin_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ListError> {
        let base = normalize_admin_url(admin_url);
        if base.is_empty() {
            return Err(ListError::Validation("Admin dashboard URL is not configured".into()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ListError::Network(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            base,
            api_key: Zeroizing::new(api_key.trim().to_string()),
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ListError> {
        Self::new(&config.admin_url, config.api_key(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn endpoint(&self, resource: &str) -> Result<String, ListError> {
        validate_resource(resource)?;
        Ok(format!("/api/{}.php", resource.trim()))
    }

    async fn read_json(&self, resp: reqwest::Response) -> Result<Value, ListError> {
        let status = resp.status();
        let body = resp.text().await;
        if !status.is_success() {
            // Reported by status even when the body was cut short.
            return Err(http_failure(status, body.as_deref().unwrap_or("")));
        }
        let body_text = body.map_err(|e| friendly_error(&self.base, &e))?;
        if body_text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body_text).map_err(ListError::from)
    }
}

impl ListingService for AdminClient {
    async fn list_page(
        &self,
        resource: &str,
        criteria: &FilterCriteria,
        request: PageRequest,
    ) -> Result<ListEnvelope, ListError> {
        let path = build_list_query(&self.endpoint(resource)?, criteria, request);
        let url = format!("{}{path}", self.base);
        let request_id = Uuid::new_v4().to_string();
        debug!(%resource, %request_id, page = request.page, page_size = request.page_size, "listing request");

        let start = Instant::now();
        let resp = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .header(REQUEST_ID_HEADER, &request_id)
            .send()
            .await
            .map_err(|e| friendly_error(&self.base, &e))?;
        let body = self.read_json(resp).await?;
        let envelope = parse_list_envelope(&body)?;

        info!(
            %resource,
            %request_id,
            page = request.page,
            rows = envelope.items.len(),
            total_records = envelope.total_records,
            latency_ms = start.elapsed().as_millis() as u64,
            "listing page received"
        );
        Ok(envelope)
    }
}

impl MutationService for AdminClient {
    async fn mutate(
        &self,
        resource: &str,
        op: MutationOp,
        payload: &Value,
    ) -> Result<MutationReply, ListError> {
        let url = format!("{}{}", self.base, self.endpoint(resource)?);
        let request_id = Uuid::new_v4().to_string();
        let idempotency_key = format!("{resource}:{}:{}", op.as_str(), Uuid::new_v4());
        let body = serde_json::json!({ "action": op.as_str(), "data": payload });

        let resp = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .header(REQUEST_ID_HEADER, &request_id)
            .header(IDEMPOTENCY_HEADER, &idempotency_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| friendly_error(&self.base, &e))?;
        let body = self.read_json(resp).await?;
        let reply = parse_mutation_envelope(&body);
        match &reply {
            Ok(_) => info!(%resource, op = op.as_str(), %request_id, "mutation applied"),
            Err(e) => warn!(%resource, op = op.as_str(), %request_id, error = %e, "mutation rejected"),
        }
        reply
    }
}
