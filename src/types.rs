use serde::{Deserialize, Serialize};

/// Ordered, human-readable conversation log for one session.
pub type ConversationHistory = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Contract,
    EmploymentContract,
    LeaseAgreement,
    ComplianceReview,
    Comprehensive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

/// How the backend should treat an uploaded document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisType {
    ContractReview,
    #[default]
    Comprehensive,
}

impl AnalysisType {
    /// Form value sent in the multipart body.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::ContractReview => "CONTRACT_REVIEW",
            AnalysisType::Comprehensive => "COMPREHENSIVE",
        }
    }
}

/// Full analysis request. Only `query` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl AnalysisRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    ContractAnalysis,
    Compliance,
    LegalResearch,
    LegalStrategy,
    Comprehensive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    #[default]
    Success,
    Error,
    Partial,
    /// Emitted when the backend wants an attorney to look at the result.
    RequiresReview,
}

impl AnalysisStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisStatus::Success => "SUCCESS",
            AnalysisStatus::Error => "ERROR",
            AnalysisStatus::Partial => "PARTIAL",
            AnalysisStatus::RequiresReview => "REQUIRES_REVIEW",
        }
    }
}

/// Coarse band used when showing a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

/// Structured analysis produced by the backend. Immutable once received.
///
/// The backend omits null fields, so every text and list field falls back to
/// empty when missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisResult {
    pub session_id: String,
    pub query: String,
    pub query_type: Option<QueryType>,
    /// Backend format is `yyyy-MM-dd HH:mm:ss`.
    pub timestamp: String,
    pub executive_summary: String,
    pub research_findings: Option<String>,
    pub contract_analysis: String,
    pub compliance_analysis: String,
    pub strategic_recommendations: String,
    pub key_insights: Vec<String>,
    pub risk_assessment: String,
    pub action_items: Vec<String>,
    pub confidence_score: f64,
    pub requires_human_review: bool,
    pub error_message: Option<String>,
    pub status: AnalysisStatus,
}

impl AnalysisResult {
    /// Confidence as a whole percentage, always within `0..=100`.
    pub fn confidence_percent(&self) -> u8 {
        if self.confidence_score.is_nan() {
            return 0;
        }
        self.confidence_score.clamp(0.0, 100.0).round() as u8
    }

    pub fn confidence_tier(&self) -> ConfidenceTier {
        match self.confidence_percent() {
            80..=100 => ConfidenceTier::High,
            60..=79 => ConfidenceTier::Medium,
            _ => ConfidenceTier::Low,
        }
    }

    /// Parsed timestamp, when the backend sent one we understand.
    pub fn generated_at(&self) -> Option<chrono::NaiveDateTime> {
        chrono::NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%d %H:%M:%S").ok()
    }

    /// File name used when exporting this result.
    pub fn report_file_name(&self) -> String {
        format!("legal-analysis-{}.txt", self.session_id)
    }

    /// Plain-text report of every section, suitable for download.
    pub fn report(&self) -> String {
        let generated = self
            .generated_at()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| self.timestamp.clone());

        let mut out = String::from("Legal Analysis Report\n");
        out.push_str(&format!("Generated: {}\n", generated));
        out.push_str(&format!("Session ID: {}\n", self.session_id));
        out.push_str(&format!(
            "Confidence: {}% | Status: {}\n",
            self.confidence_percent(),
            self.status.label()
        ));

        let sections = [
            ("EXECUTIVE SUMMARY", &self.executive_summary),
            ("CONTRACT ANALYSIS", &self.contract_analysis),
            ("COMPLIANCE ANALYSIS", &self.compliance_analysis),
            ("STRATEGIC RECOMMENDATIONS", &self.strategic_recommendations),
            ("RISK ASSESSMENT", &self.risk_assessment),
        ];
        for (title, body) in sections {
            out.push_str(&format!("\n{}\n{}\n", title, body));
        }

        out.push_str("\nKEY INSIGHTS\n");
        for insight in &self.key_insights {
            out.push_str(&format!("• {}\n", insight));
        }
        out.push_str("\nACTION ITEMS\n");
        for item in &self.action_items {
            out.push_str(&format!("• {}\n", item));
        }
        out
    }
}

/// A file picked for document analysis.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    /// MIME type as reported by the source of the file.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_omits_absent_fields() {
        let req = AnalysisRequest::new("Is this NDA enforceable?");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({ "query": "Is this NDA enforceable?" }));
    }

    #[test]
    fn test_request_uses_backend_field_names() {
        let req = AnalysisRequest {
            query: "Review the lease".to_string(),
            document_type: Some(DocumentType::LeaseAgreement),
            jurisdiction: Some("California".to_string()),
            urgency: Some(Urgency::High),
            session_id: Some("session-1".to_string()),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["documentType"], "LEASE_AGREEMENT");
        assert_eq!(json["urgency"], "HIGH");
        assert_eq!(json["sessionId"], "session-1");
    }

    #[test]
    fn test_result_tolerates_missing_fields() {
        let body = r#"{
            "sessionId": "abc",
            "query": "q",
            "queryType": "COMPLIANCE",
            "timestamp": "2024-05-01 10:30:00",
            "executiveSummary": "Summary",
            "keyInsights": ["one"],
            "confidenceScore": 72.4,
            "requiresHumanReview": true,
            "status": "PARTIAL"
        }"#;
        let result: AnalysisResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.query_type, Some(QueryType::Compliance));
        assert_eq!(result.status, AnalysisStatus::Partial);
        assert!(result.action_items.is_empty());
        assert!(result.contract_analysis.is_empty());
        assert!(result.generated_at().is_some());
    }

    #[test]
    fn test_confidence_is_bounded() {
        let mut result = AnalysisResult {
            confidence_score: 142.0,
            ..Default::default()
        };
        assert_eq!(result.confidence_percent(), 100);
        result.confidence_score = -3.0;
        assert_eq!(result.confidence_percent(), 0);
        result.confidence_score = f64::NAN;
        assert_eq!(result.confidence_percent(), 0);
        result.confidence_score = 79.6;
        assert_eq!(result.confidence_percent(), 80);
        assert_eq!(result.confidence_tier(), ConfidenceTier::High);
        result.confidence_score = 61.0;
        assert_eq!(result.confidence_tier(), ConfidenceTier::Medium);
    }

    #[test]
    fn test_report_lists_insights_and_actions() {
        let result = AnalysisResult {
            session_id: "s-9".to_string(),
            executive_summary: "Low risk overall".to_string(),
            key_insights: vec!["Termination clause is one-sided".to_string()],
            action_items: vec!["Negotiate notice period".to_string()],
            confidence_score: 88.0,
            ..Default::default()
        };
        let report = result.report();
        assert!(report.starts_with("Legal Analysis Report\n"));
        assert!(report.contains("Session ID: s-9"));
        assert!(report.contains("EXECUTIVE SUMMARY\nLow risk overall"));
        assert!(report.contains("• Termination clause is one-sided"));
        assert!(report.contains("• Negotiate notice period"));
        assert_eq!(result.report_file_name(), "legal-analysis-s-9.txt");
    }
}
