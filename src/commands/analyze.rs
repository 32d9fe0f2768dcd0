use poise::serenity_prelude as serenity;
use tracing::info;

use super::{render, send_chunked};
use crate::state::Context;
use crate::types::{AnalysisRequest, AnalysisType, DocumentType, DocumentUpload, Urgency};

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum DocumentTypeChoice {
    #[name = "Contract"]
    Contract,
    #[name = "Employment Contract"]
    EmploymentContract,
    #[name = "Lease Agreement"]
    LeaseAgreement,
    #[name = "Compliance Review"]
    ComplianceReview,
    #[name = "Comprehensive"]
    Comprehensive,
}

impl From<DocumentTypeChoice> for DocumentType {
    fn from(choice: DocumentTypeChoice) -> Self {
        match choice {
            DocumentTypeChoice::Contract => DocumentType::Contract,
            DocumentTypeChoice::EmploymentContract => DocumentType::EmploymentContract,
            DocumentTypeChoice::LeaseAgreement => DocumentType::LeaseAgreement,
            DocumentTypeChoice::ComplianceReview => DocumentType::ComplianceReview,
            DocumentTypeChoice::Comprehensive => DocumentType::Comprehensive,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum UrgencyChoice {
    #[name = "Low"]
    Low,
    #[name = "Medium"]
    Medium,
    #[name = "High"]
    High,
}

impl From<UrgencyChoice> for Urgency {
    fn from(choice: UrgencyChoice) -> Self {
        match choice {
            UrgencyChoice::Low => Urgency::Low,
            UrgencyChoice::Medium => Urgency::Medium,
            UrgencyChoice::High => Urgency::High,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum AnalysisTypeChoice {
    #[name = "Contract Review"]
    ContractReview,
    #[name = "Comprehensive"]
    Comprehensive,
}

impl From<AnalysisTypeChoice> for AnalysisType {
    fn from(choice: AnalysisTypeChoice) -> Self {
        match choice {
            AnalysisTypeChoice::ContractReview => AnalysisType::ContractReview,
            AnalysisTypeChoice::Comprehensive => AnalysisType::Comprehensive,
        }
    }
}

/// Build a full-analysis request from form input. Blank jurisdiction is sent
/// as absent; urgency defaults to medium.
fn build_request(
    query: String,
    document_type: Option<DocumentTypeChoice>,
    jurisdiction: Option<String>,
    urgency: Option<UrgencyChoice>,
    session_id: &str,
) -> AnalysisRequest {
    AnalysisRequest {
        document_type: document_type.map(Into::into),
        jurisdiction: jurisdiction
            .map(|j| j.trim().to_string())
            .filter(|j| !j.is_empty()),
        urgency: Some(urgency.map(Into::into).unwrap_or_default()),
        session_id: Some(session_id.to_string()),
        ..AnalysisRequest::new(query)
    }
}

/// Quick answer to a legal question
#[poise::command(slash_command, guild_only)]
pub async fn quick(
    ctx: Context<'_>,
    #[description = "Your legal question"] query: String,
) -> Result<(), anyhow::Error> {
    ctx.defer().await?;
    let sc = ctx.data().session_for(ctx.author().id.get()).await?;

    info!(user = ctx.author().name, session_id = sc.session.id(), "quick analysis requested");

    match sc.analysis.quick_analyze(&query).await {
        Ok(answer) => {
            sc.session.append_local(format!("Quick Analysis: {}", query));
            sc.session.append_local(format!("Result: {}", answer));
            send_chunked(&ctx, &render::quick_answer(&query, &answer)).await
        }
        Err(e) => {
            ctx.say(render::error_alert(&e.to_string())).await?;
            Ok(())
        }
    }
}

/// Full multi-agent analysis of a legal query
#[poise::command(slash_command, guild_only)]
pub async fn analyze(
    ctx: Context<'_>,
    #[description = "Describe your legal question or situation"] query: String,
    #[description = "Kind of document involved"] document_type: Option<DocumentTypeChoice>,
    #[description = "Jurisdiction, e.g. California"] jurisdiction: Option<String>,
    #[description = "Urgency (default: Medium)"] urgency: Option<UrgencyChoice>,
) -> Result<(), anyhow::Error> {
    ctx.defer().await?;
    let sc = ctx.data().session_for(ctx.author().id.get()).await?;

    let request = build_request(query, document_type, jurisdiction, urgency, sc.session.id());
    let query = request.query.clone();

    info!(
        user = ctx.author().name,
        session_id = sc.session.id(),
        urgency = ?request.urgency,
        "full analysis requested"
    );

    match sc.analysis.analyze(request).await {
        Ok(result) => {
            sc.session.append_local(format!("Full Analysis: {}", query));
            send_chunked(&ctx, &render::analysis_result(&result)).await
        }
        Err(e) => {
            ctx.say(render::error_alert(&e.to_string())).await?;
            Ok(())
        }
    }
}

/// Analyze an uploaded PDF, DOC, DOCX or TXT document
#[poise::command(slash_command, guild_only)]
pub async fn document(
    ctx: Context<'_>,
    #[description = "Document (PDF, DOC, DOCX, TXT)"] file: serenity::Attachment,
    #[description = "Analysis type (default: Comprehensive)"] analysis_type: Option<AnalysisTypeChoice>,
) -> Result<(), anyhow::Error> {
    ctx.defer().await?;
    let sc = ctx.data().session_for(ctx.author().id.get()).await?;

    info!(
        user = ctx.author().name,
        file = file.filename,
        size = file.size,
        content_type = ?file.content_type,
        "document analysis requested"
    );

    let upload = DocumentUpload {
        file_name: file.filename.clone(),
        content_type: file.content_type.clone(),
        bytes: file.download().await?,
    };
    let analysis_type: AnalysisType = analysis_type.map(Into::into).unwrap_or_default();

    match sc
        .analysis
        .analyze_document(&upload, analysis_type, Some(sc.session.id()))
        .await
    {
        Ok(result) => {
            sc.session.append_local(format!("Document Analysis: {}", upload.file_name));
            send_chunked(&ctx, &render::analysis_result(&result)).await
        }
        Err(e) => {
            ctx.say(render::error_alert(&e.to_string())).await?;
            Ok(())
        }
    }
}
