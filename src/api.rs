use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Endpoint, RequestError};
use crate::types::{AnalysisRequest, AnalysisResult, AnalysisType, ConversationHistory, DocumentUpload};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/legal-assistant";

/// The remote legal-analysis service, one method per endpoint.
#[async_trait]
pub trait LegalBackend: Send + Sync {
    async fn health(&self) -> Result<String, RequestError>;
    async fn quick_analysis(&self, query: &str) -> Result<String, RequestError>;
    async fn full_analysis(&self, request: &AnalysisRequest) -> Result<AnalysisResult, RequestError>;
    async fn analyze_document(
        &self,
        upload: &DocumentUpload,
        analysis_type: AnalysisType,
        session_id: Option<&str>,
    ) -> Result<AnalysisResult, RequestError>;
    async fn conversation_history(&self, session_id: &str) -> Result<ConversationHistory, RequestError>;
    async fn clear_conversation_history(&self, session_id: &str) -> Result<(), RequestError>;
}

/// HTTP client for the backend. Single round trip per call: no retries,
/// no timeouts.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn from_env() -> Result<Self> {
        let base_url = dotenv::var("LEGAL_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and hand back the response only if it is a 2xx.
    async fn send(
        &self,
        endpoint: Endpoint,
        req: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, RequestError> {
        let resp = req
            .send()
            .await
            .map_err(|e| RequestError::transport(endpoint, e))?;
        let status = resp.status();
        debug!(?endpoint, status = status.as_u16(), "backend responded");
        if !status.is_success() {
            return Err(RequestError::status(endpoint, status.as_u16()));
        }
        Ok(resp)
    }

    async fn send_text(&self, endpoint: Endpoint, req: reqwest::RequestBuilder) -> Result<String, RequestError> {
        let resp = self.send(endpoint, req).await?;
        resp.text().await.map_err(|e| RequestError::transport(endpoint, e))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        req: reqwest::RequestBuilder,
    ) -> Result<T, RequestError> {
        let resp = self.send(endpoint, req).await?;
        resp.json::<T>().await.map_err(|e| RequestError::transport(endpoint, e))
    }
}

#[async_trait]
impl LegalBackend for ApiClient {
    async fn health(&self) -> Result<String, RequestError> {
        let req = self.client.get(self.url("health"));
        self.send_text(Endpoint::Health, req).await
    }

    async fn quick_analysis(&self, query: &str) -> Result<String, RequestError> {
        let req = self
            .client
            .post(self.url("quick-analysis"))
            .query(&[("query", query)]);
        self.send_text(Endpoint::QuickAnalysis, req).await
    }

    async fn full_analysis(&self, request: &AnalysisRequest) -> Result<AnalysisResult, RequestError> {
        let req = self.client.post(self.url("analyze")).json(request);
        self.send_json(Endpoint::FullAnalysis, req).await
    }

    async fn analyze_document(
        &self,
        upload: &DocumentUpload,
        analysis_type: AnalysisType,
        session_id: Option<&str>,
    ) -> Result<AnalysisResult, RequestError> {
        let endpoint = Endpoint::DocumentAnalysis;
        let mut part = Part::bytes(upload.bytes.clone()).file_name(upload.file_name.clone());
        if let Some(content_type) = &upload.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| RequestError::transport(endpoint, e))?;
        }

        let mut form = Form::new()
            .part("file", part)
            .text("analysisType", analysis_type.as_str());
        if let Some(id) = session_id {
            form = form.text("sessionId", id.to_string());
        }

        let req = self.client.post(self.url("analyze-document")).multipart(form);
        self.send_json(endpoint, req).await
    }

    async fn conversation_history(&self, session_id: &str) -> Result<ConversationHistory, RequestError> {
        let req = self.client.get(self.url(&format!("conversation/{}", session_id)));
        self.send_json(Endpoint::GetHistory, req).await
    }

    async fn clear_conversation_history(&self, session_id: &str) -> Result<(), RequestError> {
        let req = self.client.delete(self.url(&format!("conversation/{}", session_id)));
        self.send(Endpoint::ClearHistory, req).await?;
        Ok(())
    }
}
