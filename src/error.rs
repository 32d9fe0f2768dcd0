use thiserror::Error;

/// Backend endpoints this client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Health,
    QuickAnalysis,
    FullAnalysis,
    DocumentAnalysis,
    GetHistory,
    ClearHistory,
}

impl Endpoint {
    /// Fixed user-facing message for a failed call.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Endpoint::Health => "Health check failed",
            Endpoint::QuickAnalysis => "Quick analysis failed",
            Endpoint::FullAnalysis => "Full analysis failed",
            Endpoint::DocumentAnalysis => "Document analysis failed",
            Endpoint::GetHistory => "Failed to get conversation history",
            Endpoint::ClearHistory => "Failed to clear conversation history",
        }
    }
}

/// A backend call that did not produce a usable success response.
#[derive(Debug, Error)]
#[error("{}", .endpoint.failure_message())]
pub struct RequestError {
    pub endpoint: Endpoint,
    /// Set when the backend answered with a non-success status.
    pub status: Option<u16>,
    #[source]
    pub source: Option<reqwest::Error>,
}

impl RequestError {
    pub fn status(endpoint: Endpoint, status: u16) -> Self {
        Self {
            endpoint,
            status: Some(status),
            source: None,
        }
    }

    pub fn transport(endpoint: Endpoint, source: reqwest::Error) -> Self {
        Self {
            endpoint,
            status: None,
            source: Some(source),
        }
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Please enter a legal question")]
    EmptyQuery,
    #[error("Unsupported file type: {0}. Supported: PDF, DOC, DOCX, TXT")]
    UnsupportedFileType(String),
    #[error(transparent)]
    Request(#[from] RequestError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("local storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("local storage is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}
