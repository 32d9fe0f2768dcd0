use super::render;
use crate::state::Context;

/// Show backend health
#[poise::command(slash_command, guild_only)]
pub async fn health(
    ctx: Context<'_>,
    #[description = "Run a fresh check now"] recheck: Option<bool>,
) -> Result<(), anyhow::Error> {
    let monitor = &ctx.data().health;
    let snapshot = if recheck.unwrap_or(false) {
        ctx.defer().await?;
        monitor.trigger().await?
    } else {
        monitor.snapshot()
    };
    ctx.say(render::health(&snapshot)).await?;
    Ok(())
}
