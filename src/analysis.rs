use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::api::LegalBackend;
use crate::error::AnalysisError;
use crate::loading::LoadingFlag;
use crate::types::{AnalysisRequest, AnalysisResult, AnalysisType, DocumentUpload};

/// Content types accepted for document analysis: PDF, DOC, DOCX, plain text.
pub const ALLOWED_DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

pub fn is_allowed_document_type(content_type: &str) -> bool {
    // Drop parameters such as "; charset=utf-8"
    let essence = content_type.split(';').next().unwrap_or("").trim();
    ALLOWED_DOCUMENT_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(essence))
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Loading flag and last error message for one operation.
#[derive(Debug, Default)]
pub struct OperationState {
    loading: LoadingFlag,
    error: Mutex<Option<String>>,
}

impl OperationState {
    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        lock(&self.error).clone()
    }

    fn set_error(&self, message: Option<String>) {
        *lock(&self.error) = message;
    }

    /// Run `fut` with the loading flag held, recording its error message.
    async fn track<T, F>(&self, op: &'static str, fut: F) -> Result<T, AnalysisError>
    where
        F: std::future::Future<Output = Result<T, AnalysisError>>,
    {
        let _loading = self.loading.begin();
        self.set_error(None);
        let outcome = fut.await;
        if let Err(e) = &outcome {
            warn!(op, error = %e, "analysis call failed");
            self.set_error(Some(e.to_string()));
        }
        outcome
    }
}

/// Sits between the commands and the backend for the three analysis modes.
///
/// Each mode has its own [`OperationState`]; calls to different modes never
/// wait on each other. The most recent full or document result is kept for
/// display, last response wins.
pub struct AnalysisOrchestrator {
    backend: Arc<dyn LegalBackend>,
    quick: OperationState,
    full: OperationState,
    document: OperationState,
    result: Mutex<Option<AnalysisResult>>,
}

impl AnalysisOrchestrator {
    pub fn new(backend: Arc<dyn LegalBackend>) -> Self {
        Self {
            backend,
            quick: OperationState::default(),
            full: OperationState::default(),
            document: OperationState::default(),
            result: Mutex::new(None),
        }
    }

    pub fn quick_state(&self) -> &OperationState {
        &self.quick
    }

    pub fn full_state(&self) -> &OperationState {
        &self.full
    }

    pub fn document_state(&self) -> &OperationState {
        &self.document
    }

    /// True while any of the three operations is in flight.
    pub fn is_loading(&self) -> bool {
        self.quick.is_loading() || self.full.is_loading() || self.document.is_loading()
    }

    /// First recorded error in fixed order: full, then document, then quick.
    /// Not ordered by time.
    pub fn last_error(&self) -> Option<String> {
        self.full
            .error()
            .or_else(|| self.document.error())
            .or_else(|| self.quick.error())
    }

    pub fn last_result(&self) -> Option<AnalysisResult> {
        lock(&self.result).clone()
    }

    pub fn clear_result(&self) {
        *lock(&self.result) = None;
        self.quick.set_error(None);
        self.full.set_error(None);
        self.document.set_error(None);
    }

    pub async fn quick_analyze(&self, query: &str) -> Result<String, AnalysisError> {
        self.quick
            .track("quick", async {
                let query = query.trim();
                if query.is_empty() {
                    return Err(AnalysisError::EmptyQuery);
                }
                let answer = self.backend.quick_analysis(query).await?;
                info!(answer_len = answer.len(), "quick analysis complete");
                Ok(answer)
            })
            .await
    }

    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        self.full
            .track("full", async {
                if request.query.trim().is_empty() {
                    return Err(AnalysisError::EmptyQuery);
                }
                let result = self.backend.full_analysis(&request).await?;
                info!(
                    session_id = %result.session_id,
                    confidence = result.confidence_percent(),
                    "full analysis complete"
                );
                *lock(&self.result) = Some(result.clone());
                Ok(result)
            })
            .await
    }

    pub async fn analyze_document(
        &self,
        upload: &DocumentUpload,
        analysis_type: AnalysisType,
        session_id: Option<&str>,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.document
            .track("document", async {
                let content_type = upload.content_type.as_deref().unwrap_or("");
                if !is_allowed_document_type(content_type) {
                    let shown = if content_type.is_empty() { "unknown" } else { content_type };
                    return Err(AnalysisError::UnsupportedFileType(shown.to_string()));
                }
                let result = self
                    .backend
                    .analyze_document(upload, analysis_type, session_id)
                    .await?;
                info!(
                    file = %upload.file_name,
                    confidence = result.confidence_percent(),
                    "document analysis complete"
                );
                *lock(&self.result) = Some(result.clone());
                Ok(result)
            })
            .await
    }
}
