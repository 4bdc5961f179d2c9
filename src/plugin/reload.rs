use crate::{event::*, helper::MessageHelper, log_internal, plugin::*};
use anyhow::Result;

pub struct Reload;

#[serenity::async_trait]
impl Plugin for Reload {
    fn name(&self) -> &'static str {
        "reload"
    }

    async fn usage(&self, ctx: &Context<'_>) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{}{} - reload config (bot owner only)",
            prefix,
            self.name()
        ))
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        let Some((msg, _)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        if !msg.is_from_owner(ctx).await {
            msg.reply(ctx.cache_http, "Only bot owners may reload the configuration.")
                .await?;
            return Ok(EventHandled::Yes);
        }

        let reloaded = ctx.cfg.write().await.reload().await;
        let response = match reloaded {
            Ok(()) => {
                // Waits for a ledger merge in progress, which finishes against the old directory
                let ledger_dir = ctx.cfg.read().await.clan_chat.ledger_dir()?;
                ctx.ledger.lock().await.set_dir(&ledger_dir);
                log_internal!(
                    "Configuration reloaded, ledger directory: {}",
                    ledger_dir.to_string_lossy()
                );
                "Configuration reloaded successfully".to_owned()
            }
            Err(e) => format!("Could not reload configuration: {}", e),
        };

        msg.reply(ctx.cache_http, response).await?;
        Ok(EventHandled::Yes)
    }
}
