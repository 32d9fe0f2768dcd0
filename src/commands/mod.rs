mod analyze;
mod health;
mod history;
pub mod render;

use crate::state::Context;

/// Smart Legal Assistant - legal analysis from the assistant backend
#[poise::command(
    slash_command,
    subcommands(
        "analyze::quick",
        "analyze::analyze",
        "analyze::document",
        "history::history",
        "history::clear",
        "history::export",
        "history::session",
        "health::health"
    )
)]
pub async fn legal(_ctx: Context<'_>) -> Result<(), anyhow::Error> {
    Ok(())
}

/// Send a message in Discord-safe chunks (max 1990 chars), splitting on
/// line or word boundaries where possible.
async fn send_chunked(ctx: &Context<'_>, text: &str) -> Result<(), anyhow::Error> {
    for chunk in render::chunks(text, 1990) {
        ctx.say(chunk).await?;
    }
    Ok(())
}
