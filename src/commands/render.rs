use crate::health::{HealthSnapshot, HealthStatus};
use crate::types::{AnalysisResult, AnalysisStatus, ConfidenceTier};

/// How many history entries a reply lists before eliding older ones.
const HISTORY_TAIL: usize = 20;

pub fn error_alert(message: &str) -> String {
    format!(":warning: {}", message)
}

pub fn quick_answer(query: &str, answer: &str) -> String {
    format!("**Q:** {}\n\n{}", query, answer)
}

fn confidence_label(tier: ConfidenceTier) -> &'static str {
    match tier {
        ConfidenceTier::High => "high",
        ConfidenceTier::Medium => "medium",
        ConfidenceTier::Low => "low",
    }
}

fn status_icon(status: AnalysisStatus) -> &'static str {
    match status {
        AnalysisStatus::Success => ":white_check_mark:",
        AnalysisStatus::Partial => ":large_orange_diamond:",
        AnalysisStatus::Error => ":x:",
        AnalysisStatus::RequiresReview => ":scales:",
    }
}

fn push_section(out: &mut String, title: &str, body: &str) {
    if !body.trim().is_empty() {
        out.push_str(&format!("\n**{}**\n{}\n", title, body.trim()));
    }
}

fn push_list(out: &mut String, title: &str, items: &[String]) {
    if !items.is_empty() {
        out.push_str(&format!("\n**{}**\n", title));
        for item in items {
            out.push_str(&format!("- {}\n", item));
        }
    }
}

/// Markdown rendering of a full or document analysis.
pub fn analysis_result(result: &AnalysisResult) -> String {
    let mut out = format!(
        "{} **Legal Analysis** ({})\nConfidence: **{}%** ({}) | Session: `{}`\n",
        status_icon(result.status),
        result.status.label(),
        result.confidence_percent(),
        confidence_label(result.confidence_tier()),
        result.session_id,
    );
    if let Some(at) = result.generated_at() {
        out.push_str(&format!("Generated: {}\n", at.format("%Y-%m-%d %H:%M")));
    }
    if result.requires_human_review {
        out.push_str("\n:warning: **Human attorney review recommended.**\n");
    }
    if let Some(err) = result.error_message.as_deref().filter(|e| !e.is_empty()) {
        out.push_str(&format!("\n{}\n", error_alert(err)));
    }

    push_section(&mut out, "Executive Summary", &result.executive_summary);
    push_section(&mut out, "Contract Analysis", &result.contract_analysis);
    push_section(&mut out, "Compliance Analysis", &result.compliance_analysis);
    push_section(
        &mut out,
        "Research Findings",
        result.research_findings.as_deref().unwrap_or(""),
    );
    push_section(&mut out, "Strategic Recommendations", &result.strategic_recommendations);
    push_section(&mut out, "Risk Assessment", &result.risk_assessment);
    push_list(&mut out, "Key Insights", &result.key_insights);
    push_list(&mut out, "Action Items", &result.action_items);
    out
}

pub fn health(snapshot: &HealthSnapshot) -> String {
    let icon = match snapshot.status {
        HealthStatus::Checking => ":hourglass:",
        HealthStatus::Healthy => ":green_circle:",
        HealthStatus::Unhealthy => ":red_circle:",
    };
    if snapshot.message.is_empty() {
        format!("{} Backend: **{}**", icon, snapshot.status.label())
    } else {
        format!(
            "{} Backend: **{}** - {}",
            icon,
            snapshot.status.label(),
            snapshot.message
        )
    }
}

pub fn history(session_id: &str, entries: &[String]) -> String {
    if entries.is_empty() {
        return format!("No conversation history yet for session `{}`.", session_id);
    }
    let mut out = format!(
        "**Conversation History** (`{}`, {} entries)\n",
        session_id,
        entries.len()
    );
    let skipped = entries.len().saturating_sub(HISTORY_TAIL);
    if skipped > 0 {
        out.push_str(&format!("_...{} earlier entries_\n", skipped));
    }
    for (i, entry) in entries.iter().enumerate().skip(skipped) {
        out.push_str(&format!("{}. {}\n", i + 1, entry));
    }
    out
}

/// Split `text` into pieces of at most `max` bytes, preferring newline then
/// space boundaries.
pub fn chunks(text: &str, max: usize) -> Vec<&str> {
    let mut out = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        if remaining.len() <= max {
            push_visible(&mut out, remaining);
            break;
        }
        let mut end = max;
        while end > 0 && !remaining.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            end = remaining.chars().next().map_or(1, char::len_utf8);
        }
        let head = &remaining[..end];
        let split_at = head
            .rfind('\n')
            .filter(|&i| i > 0)
            .or_else(|| head.rfind(' ').filter(|&i| i > 0))
            .map(|i| i + 1)
            .unwrap_or(end);
        push_visible(&mut out, &remaining[..split_at]);
        remaining = &remaining[split_at..];
    }
    out
}

// Discord rejects messages with no visible content.
fn push_visible<'a>(out: &mut Vec<&'a str>, chunk: &'a str) {
    if !chunk.trim().is_empty() {
        out.push(chunk);
    }
}
