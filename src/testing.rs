//! Scriptable in-process backend for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::api::LegalBackend;
use crate::error::{Endpoint, RequestError};
use crate::types::{AnalysisRequest, AnalysisResult, AnalysisType, ConversationHistory, DocumentUpload};

/// Each reply is `Some(value)` for success or `None` for a failed call.
#[derive(Default)]
pub struct StubBackend {
    pub health_reply: Mutex<Option<String>>,
    /// Consumed before `health_reply`: (delay, reply) per call.
    pub health_script: Mutex<VecDeque<(Duration, Option<String>)>>,
    pub quick_reply: Mutex<Option<String>>,
    pub analysis_reply: Mutex<Option<AnalysisResult>>,
    pub history_reply: Mutex<Option<ConversationHistory>>,
    pub clear_succeeds: Mutex<bool>,
    /// When set, every analysis call waits for a notification before replying.
    pub gate: Mutex<Option<Arc<Notify>>>,
    /// Same as `gate`, for history fetches.
    pub history_gate: Mutex<Option<Arc<Notify>>>,
    pub calls: Mutex<Vec<Endpoint>>,
    pub last_request: Mutex<Option<AnalysisRequest>>,
    pub last_upload: Mutex<Option<(String, AnalysisType, Option<String>)>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T>(slot: &Mutex<T>, value: T) {
        *slot.lock().unwrap() = value;
    }

    pub fn calls(&self) -> Vec<Endpoint> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.calls().iter().filter(|e| **e == endpoint).count()
    }

    fn record(&self, endpoint: Endpoint) {
        self.calls.lock().unwrap().push(endpoint);
    }

    async fn wait_gate(&self) {
        Self::wait_on(&self.gate).await;
    }

    async fn wait_on(slot: &Mutex<Option<Arc<Notify>>>) {
        let gate = slot.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn reply<T: Clone>(slot: &Mutex<Option<T>>, endpoint: Endpoint) -> Result<T, RequestError> {
        slot.lock()
            .unwrap()
            .clone()
            .ok_or_else(|| RequestError::status(endpoint, 500))
    }
}

#[async_trait]
impl LegalBackend for StubBackend {
    async fn health(&self) -> Result<String, RequestError> {
        self.record(Endpoint::Health);
        let scripted = self.health_script.lock().unwrap().pop_front();
        match scripted {
            Some((delay, reply)) => {
                tokio::time::sleep(delay).await;
                reply.ok_or_else(|| RequestError::status(Endpoint::Health, 500))
            }
            None => Self::reply(&self.health_reply, Endpoint::Health),
        }
    }

    async fn quick_analysis(&self, _query: &str) -> Result<String, RequestError> {
        self.record(Endpoint::QuickAnalysis);
        self.wait_gate().await;
        Self::reply(&self.quick_reply, Endpoint::QuickAnalysis)
    }

    async fn full_analysis(&self, request: &AnalysisRequest) -> Result<AnalysisResult, RequestError> {
        self.record(Endpoint::FullAnalysis);
        *self.last_request.lock().unwrap() = Some(request.clone());
        self.wait_gate().await;
        Self::reply(&self.analysis_reply, Endpoint::FullAnalysis)
    }

    async fn analyze_document(
        &self,
        upload: &DocumentUpload,
        analysis_type: AnalysisType,
        session_id: Option<&str>,
    ) -> Result<AnalysisResult, RequestError> {
        self.record(Endpoint::DocumentAnalysis);
        *self.last_upload.lock().unwrap() = Some((
            upload.file_name.clone(),
            analysis_type,
            session_id.map(str::to_string),
        ));
        self.wait_gate().await;
        Self::reply(&self.analysis_reply, Endpoint::DocumentAnalysis)
    }

    async fn conversation_history(&self, _session_id: &str) -> Result<ConversationHistory, RequestError> {
        self.record(Endpoint::GetHistory);
        Self::wait_on(&self.history_gate).await;
        Self::reply(&self.history_reply, Endpoint::GetHistory)
    }

    async fn clear_conversation_history(&self, _session_id: &str) -> Result<(), RequestError> {
        self.record(Endpoint::ClearHistory);
        if *self.clear_succeeds.lock().unwrap() {
            Ok(())
        } else {
            Err(RequestError::status(Endpoint::ClearHistory, 500))
        }
    }
}
