use crate::{
    clan_chat::{
        compile::{compile, CompileRequest},
        date_range::DateRange,
        history::ChannelHistory,
        ledger::LedgerOutcome,
    },
    event::*,
    helper::{parse_channel_arg, MessageHelper},
    log_internal,
    logging::{AsyncPrintColor, PrintColor},
    plugin::*,
};
use anyhow::Result;
use serenity::all::ChannelId;

/// Tallies clan notification lines in a channel over a date range, folds them into the monthly
/// ledger, and replies with the results.
pub struct CompileClanChat;

#[serenity::async_trait]
impl Plugin for CompileClanChat {
    fn name(&self) -> &'static str {
        "compilecc"
    }

    async fn usage(&self, ctx: &Context<'_>) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{}{} <#channel> <start YYYY-MM-DD> <end YYYY-MM-DD> - tally clan chat events and \
             update the monthly ledger",
            prefix,
            self.name()
        ))
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        let Some((msg, args)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        let [channel, start, end] = args.as_slice() else {
            let prefix = &ctx.cfg.read().await.general.command_prefix;
            msg.reply(
                ctx.cache_http,
                format!(
                    "Usage: {}{} <#channel> <start YYYY-MM-DD> <end YYYY-MM-DD>",
                    prefix,
                    self.name()
                ),
            )
            .await?;
            return Ok(EventHandled::Yes);
        };

        let Some(channel_id) = parse_channel_arg(channel) else {
            msg.reply(ctx.cache_http, format!("Error: `{}` is not a channel", channel))
                .await?;
            return Ok(EventHandled::Yes);
        };

        // Validate before touching history
        let range = match DateRange::parse(start, end) {
            Ok(range) => range,
            Err(e) => {
                msg.reply(ctx.cache_http, format!("Error: {}", e)).await?;
                return Ok(EventHandled::Yes);
            }
        };

        let chunks = match run(ctx, channel_id, range).await {
            Ok(chunks) => chunks,
            Err(e) => vec![describe_failure(ctx, channel_id, &e).await],
        };

        msg.reply_in_chunks(ctx, chunks).await?;
        Ok(EventHandled::Yes)
    }
}

async fn run(ctx: &Context<'_>, channel_id: ChannelId, range: DateRange) -> Result<Vec<String>> {
    let channel_name = channel_id.name(ctx.cache_http).await?;
    let (pacing, chunk_budget, page_size) = {
        let cfg = ctx.cfg.read().await;
        (
            cfg.clan_chat.pacing(),
            cfg.clan_chat.chunk_budget,
            cfg.clan_chat.history_page_size,
        )
    };

    log_internal!(
        "Compiling clan chat in \"{}\" for {}",
        channel_id.color(ctx.http).await,
        range.color(),
    );

    let typing = channel_id.start_typing(ctx.http);
    let mut source = ChannelHistory::new(ctx.cache_http, channel_id, &range, page_size);
    let request = CompileRequest {
        channel_name: &channel_name,
        range,
    };

    let compilation = compile(&mut source, ctx.ledger, &request, &pacing, chunk_budget).await;
    typing.stop();
    let compilation = compilation?;

    let ledger_status = match &compilation.ledger {
        LedgerOutcome::Saved { location } => format!("saved to {}", location),
        LedgerOutcome::Skipped => "unchanged".to_owned(),
        LedgerOutcome::Failed { error } => format!("failed: {}", error),
    };
    log_internal!(
        "Compiled {} events for {} players in \"{}\", ledger {}, replying in {} message(s)",
        compilation.tally.total(),
        compilation.tally.player_count(),
        channel_name,
        ledger_status,
        compilation.chunks.len(),
    );

    Ok(compilation.chunks)
}

/// User-facing message for a run that could not complete
async fn describe_failure(ctx: &Context<'_>, channel_id: ChannelId, err: &anyhow::Error) -> String {
    let forbidden = matches!(
        err.downcast_ref::<serenity::Error>(),
        Some(serenity::Error::Http(http_err))
            if http_err.status_code().map(|status| status.as_u16()) == Some(403)
    );

    if forbidden {
        let channel = channel_id
            .name(ctx.cache_http)
            .await
            .unwrap_or_else(|_| channel_id.to_string());
        format!(
            "Error: I don't have permission to read message history in #{}.",
            channel
        )
    } else {
        log_internal!("Error in compilecc: {}", err);
        format!("An unexpected error occurred: {}", err)
    }
}
