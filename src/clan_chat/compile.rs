use super::{
    date_range::DateRange,
    ledger::{merge_period, LedgerOutcome, LedgerStore, Period},
    report::{Report, ScoredEntry},
    tally::{MessageSource, Pacing, PlayerTally},
};
use anyhow::Result;
use tokio::sync::Mutex;

/// What to compile
pub struct CompileRequest<'a> {
    pub channel_name: &'a str,
    pub range: DateRange,
}

/// Outcome of one run
pub struct Compilation {
    pub tally: PlayerTally,
    pub ledger: LedgerOutcome,
    pub chunks: Vec<String>,
}

/// Tally the channel's history, fold it into the ledger for the month the range starts in, and
/// render the run's report.
///
/// The ledger is only locked for the merge, not while history is being read.  Only a failing
/// message source is an error.  Ledger trouble is reported inside the report.
pub async fn compile<S, L>(
    source: &mut S,
    ledger: &Mutex<L>,
    request: &CompileRequest<'_>,
    pacing: &Pacing,
    chunk_budget: usize,
) -> Result<Compilation>
where
    S: MessageSource + ?Sized,
    L: LedgerStore,
{
    let tally = PlayerTally::collect(source, pacing).await?;
    let title = format!(
        "**Clan Chat Compilation for #{} ({})**",
        request.channel_name, request.range
    );

    if tally.messages() == 0 {
        let chunks = Report::default()
            .header_line(title)
            .header_line("No messages with text content found.")
            .chunks(chunk_budget);
        return Ok(Compilation {
            tally,
            ledger: LedgerOutcome::Skipped,
            chunks,
        });
    }

    let period = Period::containing(request.range.start);
    let ledger = merge_period(&mut *ledger.lock().await, &period, &tally).await;

    let mut report = Report::new(ScoredEntry::from_tally(&tally))
        .header_line(title)
        .header_line(format!("Messages with content: {}", tally.messages()))
        .header_line(format!("Lines checked: {}", tally.lines()));

    if tally.is_empty() {
        report = report.header_line("No attributable events found.");
    } else {
        let breakdown = tally
            .categories()
            .iter()
            .map(|(category, count)| format!("{} {}", category, count))
            .collect::<Vec<String>>()
            .join(", ");

        report = report
            .header_line(format!("Attributed events: {}", tally.total()))
            .header_line(format!("Players: {}", tally.player_count()))
            .header_line(format!("Breakdown: {}", breakdown));
    }

    report = match &ledger {
        LedgerOutcome::Saved { .. } => report.header_line(format!("Ledger updated for {}", period)),
        LedgerOutcome::Skipped => report,
        LedgerOutcome::Failed { error } => report.header_line(format!(
            "Warning: could not update the ledger for {}: {}",
            period, error
        )),
    };

    let chunks = report.header_line("").chunks(chunk_budget);

    Ok(Compilation {
        tally,
        ledger,
        chunks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clan_chat::{
        ledger::tests::MemoryLedger,
        report::DEFAULT_CHUNK_BUDGET,
        tally::tests::{CannedSource, NO_PAUSE},
    };
    use std::collections::VecDeque;

    fn request(start: &str, end: &str) -> CompileRequest<'static> {
        CompileRequest {
            channel_name: "clan-chat",
            range: DateRange::parse(start, end).unwrap(),
        }
    }

    fn strings(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    async fn run(
        messages: &[String],
        ledger: &Mutex<MemoryLedger>,
        request: &CompileRequest<'_>,
    ) -> Compilation {
        let mut source = CannedSource::single(messages);
        compile(&mut source, ledger, request, &NO_PAUSE, DEFAULT_CHUNK_BUDGET)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn one_day_two_players() {
        let messages = strings(&[
            "**Alice**: gz",
            "Bob has defeated a boss",
            "",
            "not a game line",
        ]);
        let ledger = Mutex::new(MemoryLedger::default());
        let compilation = run(&messages, &ledger, &request("2025-10-05", "2025-10-05")).await;

        assert_eq!(compilation.tally.get("Alice"), 1);
        assert_eq!(compilation.tally.get("Bob"), 1);
        assert_eq!(compilation.tally.total(), 2);
        assert_eq!(
            compilation.chunks,
            vec![
                "**Clan Chat Compilation for #clan-chat (2025-10-05 to 2025-10-05)**\n\
                 Messages with content: 3\n\
                 Lines checked: 3\n\
                 Attributed events: 2\n\
                 Players: 2\n\
                 Breakdown: chat 1, pvp kill 1\n\
                 Ledger updated for October 2025\n\
                 \n\
                 Alice: 1 messages, awarding 0xp\n\
                 Bob: 1 messages, awarding 0xp\n"
            ]
        );
    }

    #[tokio::test]
    async fn heavy_player_then_rerun() {
        let october = Period::parse("2025-10").unwrap();
        let ledger = Mutex::new(MemoryLedger::default());

        let first: Vec<String> = (0..401).map(|i| format!("Zed has defeated X{i}")).collect();
        let compilation = run(&first, &ledger, &request("2025-10-01", "2025-10-15")).await;
        assert!(compilation.chunks[0].contains("\nZed: 401 messages, awarding 100xp\n"));
        assert!(ledger.lock().await.records[&october]
            .contains("Zed: 401 messages, awarding 100xp"));

        // A later day in the same month lands in the same record
        let second: Vec<String> = (0..50).map(|i| format!("Zed has defeated Y{i}")).collect();
        let compilation = run(&second, &ledger, &request("2025-10-20", "2025-11-02")).await;
        assert!(compilation.chunks[0].contains("\nZed: 50 messages, awarding 0xp\n"));

        let ledger = ledger.into_inner();
        assert!(ledger.records[&october].contains("Zed: 451 messages, awarding 100xp"));
        assert_eq!(ledger.records.len(), 1);
    }

    #[tokio::test]
    async fn ledger_failure_becomes_a_warning() {
        let ledger = Mutex::new(MemoryLedger {
            fail_writes: true,
            ..Default::default()
        });
        let messages = strings(&["Zed has defeated X"]);
        let compilation = run(&messages, &ledger, &request("2025-10-01", "2025-10-01")).await;

        assert!(matches!(compilation.ledger, LedgerOutcome::Failed { .. }));
        assert!(compilation.chunks[0]
            .contains("Warning: could not update the ledger for October 2025: disk full"));
        assert!(compilation.chunks[0].contains("Zed: 1 messages, awarding 0xp"));
    }

    #[tokio::test]
    async fn nothing_attributable() {
        let ledger = Mutex::new(MemoryLedger::default());
        let messages = strings(&["hello", "", "still\nnothing"]);
        let compilation = run(&messages, &ledger, &request("2025-10-01", "2025-10-01")).await;

        assert_eq!(compilation.ledger, LedgerOutcome::Skipped);
        assert!(ledger.into_inner().records.is_empty());
        assert_eq!(
            compilation.chunks,
            vec![
                "**Clan Chat Compilation for #clan-chat (2025-10-01 to 2025-10-01)**\n\
                 Messages with content: 2\n\
                 Lines checked: 3\n\
                 No attributable events found.\n\
                 \n"
            ]
        );
    }

    #[tokio::test]
    async fn no_text_content() {
        let ledger = Mutex::new(MemoryLedger::default());
        let messages = strings(&["", "  ", ""]);
        let compilation = run(&messages, &ledger, &request("2025-10-01", "2025-10-03")).await;

        assert_eq!(compilation.ledger, LedgerOutcome::Skipped);
        assert!(ledger.into_inner().records.is_empty());
        assert_eq!(
            compilation.chunks,
            vec![
                "**Clan Chat Compilation for #clan-chat (2025-10-01 to 2025-10-03)**\n\
                 No messages with text content found.\n"
            ]
        );
    }

    /// Checks whether the ledger can be locked each time a batch is requested
    struct LockCheckingSource<'a> {
        ledger: &'a Mutex<MemoryLedger>,
        batches: VecDeque<Vec<String>>,
        ledger_free: Vec<bool>,
    }

    #[serenity::async_trait]
    impl MessageSource for LockCheckingSource<'_> {
        async fn next_batch(&mut self) -> Result<Option<Vec<String>>> {
            self.ledger_free.push(self.ledger.try_lock().is_ok());
            Ok(self.batches.pop_front())
        }
    }

    #[tokio::test]
    async fn ledger_is_unlocked_while_history_is_read() {
        let ledger = Mutex::new(MemoryLedger::default());
        let mut source = LockCheckingSource {
            ledger: &ledger,
            batches: VecDeque::from([
                strings(&["Zed has defeated X"]),
                strings(&["Amy received a drop: Bones"]),
            ]),
            ledger_free: Vec::new(),
        };

        let compilation = compile(
            &mut source,
            &ledger,
            &request("2025-10-01", "2025-10-01"),
            &NO_PAUSE,
            DEFAULT_CHUNK_BUDGET,
        )
        .await
        .unwrap();

        assert_eq!(source.ledger_free, vec![true, true, true]);
        assert!(matches!(compilation.ledger, LedgerOutcome::Saved { .. }));
        assert_eq!(ledger.into_inner().records.len(), 1);
    }
}
