use poise::serenity_prelude as serenity;

use super::{render, send_chunked};
use crate::state::Context;

/// Show your conversation history
#[poise::command(slash_command, guild_only)]
pub async fn history(
    ctx: Context<'_>,
    #[description = "Refetch from the backend first"] refresh: Option<bool>,
) -> Result<(), anyhow::Error> {
    ctx.defer().await?;
    let sc = ctx.data().session_for(ctx.author().id.get()).await?;
    if refresh.unwrap_or(false) {
        sc.session.load_history().await;
    }
    send_chunked(&ctx, &render::history(sc.session.id(), &sc.session.history())).await
}

/// Clear your conversation history
#[poise::command(slash_command, guild_only)]
pub async fn clear(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    ctx.defer().await?;
    let sc = ctx.data().session_for(ctx.author().id.get()).await?;
    if sc.session.history().is_empty() {
        ctx.say("Nothing to clear.").await?;
        return Ok(());
    }

    match sc.session.clear_history().await {
        Ok(()) => {
            sc.analysis.clear_result();
            ctx.say("Conversation cleared.").await?;
        }
        Err(e) => {
            ctx.say(render::error_alert(&e.to_string())).await?;
        }
    }
    Ok(())
}

/// Download the last analysis as a text report
#[poise::command(slash_command, guild_only)]
pub async fn export(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    ctx.defer().await?;
    let sc = ctx.data().session_for(ctx.author().id.get()).await?;
    let Some(result) = sc.analysis.last_result() else {
        ctx.say("No analysis to export yet. Run `/legal analyze` or `/legal document` first.")
            .await?;
        return Ok(());
    };

    let attachment = serenity::CreateAttachment::bytes(result.report().into_bytes(), result.report_file_name());
    ctx.send(
        poise::CreateReply::default()
            .content(format!("Report for session `{}`", result.session_id))
            .attachment(attachment),
    )
    .await?;
    Ok(())
}

/// Show your session id
#[poise::command(slash_command, guild_only)]
pub async fn session(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    ctx.defer().await?;
    let sc = ctx.data().session_for(ctx.author().id.get()).await?;
    let mut reply = format!(
        "Session: `{}` ({} history entries)",
        sc.session.id(),
        sc.session.history().len()
    );

    if sc.session.is_loading() {
        reply.push_str("\nHistory sync in progress");
    }

    let analysis = &sc.analysis;
    let running: Vec<&str> = [
        ("quick", analysis.quick_state()),
        ("full", analysis.full_state()),
        ("document", analysis.document_state()),
    ]
    .into_iter()
    .filter(|(_, state)| state.is_loading())
    .map(|(name, _)| name)
    .collect();
    if analysis.is_loading() {
        reply.push_str(&format!("\nRunning: {}", running.join(", ")));
    }
    if let Some(err) = analysis.last_error() {
        reply.push_str(&format!("\nLast error: {}", err));
    }
    ctx.say(reply).await?;
    Ok(())
}
