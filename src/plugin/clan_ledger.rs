use crate::{
    clan_chat::{
        ledger::{LedgerStore, Period, PeriodRecord},
        report::{Report, ScoredEntry},
    },
    event::*,
    helper::MessageHelper,
    plugin::*,
};
use anyhow::Result;

/// Shows the stored totals for a month
pub struct ClanLedger;

#[serenity::async_trait]
impl Plugin for ClanLedger {
    fn name(&self) -> &'static str {
        "clanledger"
    }

    async fn usage(&self, ctx: &Context<'_>) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{}{} <YYYY-MM> - show a month's clan chat ledger",
            prefix,
            self.name()
        ))
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        let Some((msg, args)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        let Some(period) = args.first().and_then(|arg| Period::parse(arg)) else {
            msg.reply(ctx.cache_http, "Error: expected a month as YYYY-MM")
                .await?;
            return Ok(EventHandled::Yes);
        };

        let read = ctx.ledger.lock().await.read(&period).await;
        let chunk_budget = ctx.cfg.read().await.clan_chat.chunk_budget;

        let chunks = match read {
            Ok(record) => ledger_report(&period, &record).chunks(chunk_budget),
            Err(e) => vec![format!("Error: could not read the ledger for {}: {}", period, e)],
        };

        msg.reply_in_chunks(ctx, chunks).await?;
        Ok(EventHandled::Yes)
    }
}

/// Stored totals, points as recorded rather than rescored
fn ledger_report(period: &Period, record: &PeriodRecord) -> Report {
    if record.is_empty() {
        return Report::default()
            .header_line(format!("No ledger entries recorded for {}.", period));
    }

    let entries = record
        .sorted()
        .into_iter()
        .map(|(name, entry)| ScoredEntry {
            name: name.to_owned(),
            count: entry.count,
            points: entry.points,
        })
        .collect::<Vec<_>>();
    let players = entries.len();

    Report::new(entries)
        .header_line(format!("**Clan Chat Ledger for {}**", period))
        .header_line(format!("Players: {}", players))
        .header_line("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clan_chat::report::DEFAULT_CHUNK_BUDGET;

    #[test]
    fn stored_points_are_shown_as_recorded() {
        let record = PeriodRecord::parse(
            "Clan Chat Statistics for October 2025\n\
             ==================================================\n\
             \n\
             Zed: 451 messages, awarding 100xp\n\
             Amy: 3 messages, awarding 0xp\n",
        );
        let period = Period::parse("2025-10").unwrap();

        assert_eq!(
            ledger_report(&period, &record).chunks(DEFAULT_CHUNK_BUDGET),
            vec![
                "**Clan Chat Ledger for October 2025**\n\
                 Players: 2\n\
                 \n\
                 Zed: 451 messages, awarding 100xp\n\
                 Amy: 3 messages, awarding 0xp\n"
            ]
        );
    }

    #[test]
    fn empty_period() {
        let period = Period::parse("2024-02").unwrap();
        assert_eq!(
            ledger_report(&period, &PeriodRecord::default()).chunks(DEFAULT_CHUNK_BUDGET),
            vec!["No ledger entries recorded for February 2024.\n"]
        );
    }
}
