//! REST client for the remote highlight store.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::{ApiConfig, FETCH_TIMEOUT, HEALTH_TIMEOUT, MUTATION_TIMEOUT};
use crate::error::{Error, Result};
use crate::models::{Highlight, HighlightColor, HighlightId, SyncStatus};
use crate::util::compact_text;

/// A highlight record as the remote collaborator stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteHighlight {
    /// Canonical id assigned by the remote store.
    #[serde(alias = "_id")]
    pub id: String,
    pub text: String,
    pub document_id: String,
    #[serde(default)]
    pub document_title: String,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Palette name; tolerated as missing or unknown (falls back to yellow).
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl RemoteHighlight {
    /// Convert a server record into a synced local highlight.
    ///
    /// A fresh local id is minted; callers that already track this record
    /// keep their existing local identity via the store's merge.
    #[must_use]
    pub fn into_highlight(self, fallback_owner: &str) -> Highlight {
        Highlight {
            id: HighlightId::new(),
            remote_id: Some(self.id),
            text: self.text,
            document_id: self.document_id,
            document_title: self.document_title,
            owner_id: self
                .user_id
                .unwrap_or_else(|| fallback_owner.to_string()),
            color: self
                .color
                .as_deref()
                .map(HighlightColor::parse)
                .unwrap_or_default(),
            created_at: self.created_at.unwrap_or_else(Utc::now),
            sync_status: SyncStatus::Synced,
        }
    }
}

/// Body of `POST /highlights`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHighlightRequest {
    pub text: String,
    pub document_id: String,
    pub document_title: String,
    pub color: HighlightColor,
}

impl CreateHighlightRequest {
    #[must_use]
    pub fn from_highlight(highlight: &Highlight) -> Self {
        Self {
            text: highlight.text.clone(),
            document_id: highlight.document_id.clone(),
            document_title: highlight.document_title.clone(),
            color: highlight.color,
        }
    }
}

/// Body of `PUT /stats` - per-document reading stats kept best-effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatsUpdate {
    pub user_id: String,
    pub document_id: String,
    pub document_title: String,
    pub last_read_at: DateTime<Utc>,
    pub highlights_count: usize,
}

/// The remote collaborator's highlight operations.
///
/// Seam for the reconciliation engine; production code uses [`HighlightsApi`]
/// and tests substitute an in-memory fake.
#[allow(async_fn_in_trait)]
pub trait RemoteHighlights {
    /// `GET /highlights?userId&documentId`
    async fn list(
        &self,
        token: &str,
        user_id: &str,
        document_id: &str,
    ) -> Result<Vec<RemoteHighlight>>;

    /// `POST /highlights`
    async fn create(
        &self,
        token: &str,
        request: &CreateHighlightRequest,
    ) -> Result<RemoteHighlight>;

    /// `DELETE /highlights/{id}`
    async fn delete(&self, token: &str, remote_id: &str) -> Result<()>;

    /// `PUT /stats` (best-effort, callers ignore failures)
    async fn update_stats(&self, token: &str, stats: &DocumentStatsUpdate) -> Result<()>;

    /// `GET /health` - connectivity probe, never an error.
    async fn health(&self) -> bool;
}

/// `reqwest`-backed client for the highlight store API.
#[derive(Debug, Clone)]
pub struct HighlightsApi {
    base_url: String,
    client: reqwest::Client,
}

impl HighlightsApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.base_url().to_string(),
            client: reqwest::Client::builder().build()?,
        })
    }
}

impl RemoteHighlights for HighlightsApi {
    async fn list(
        &self,
        token: &str,
        user_id: &str,
        document_id: &str,
    ) -> Result<Vec<RemoteHighlight>> {
        let url = format!(
            "{}/highlights?userId={}&documentId={}",
            self.base_url,
            urlencoding::encode(user_id),
            urlencoding::encode(document_id),
        );
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn create(
        &self,
        token: &str,
        request: &CreateHighlightRequest,
    ) -> Result<RemoteHighlight> {
        let response = self
            .client
            .post(format!("{}/highlights", self.base_url))
            .bearer_auth(token)
            .json(request)
            .timeout(MUTATION_TIMEOUT)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, token: &str, remote_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!(
                "{}/highlights/{}",
                self.base_url,
                urlencoding::encode(remote_id)
            ))
            .bearer_auth(token)
            .timeout(MUTATION_TIMEOUT)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn update_stats(&self, token: &str, stats: &DocumentStatsUpdate) -> Result<()> {
        let response = self
            .client
            .put(format!("{}/stats", self.base_url))
            .bearer_auth(token)
            .json(stats)
            .timeout(MUTATION_TIMEOUT)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn health(&self) -> bool {
        let request = self
            .client
            .get(format!("{}/health", self.base_url))
            .timeout(HEALTH_TIMEOUT);
        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Api(parse_api_error(status, &body)))
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", compact_text(trimmed), status.as_u16())
    }
}
