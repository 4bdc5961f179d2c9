//! Month-keyed cumulative player statistics.
//!
//! Each period is stored as a human-readable text record which is both written and parsed back
//! by this module, so the line format must remain stable:
//!
//! ```text
//! Clan Chat Statistics for October 2025
//! ==================================================
//!
//! Zed: 451 messages, awarding 100xp
//! Alice: 12 messages, awarding 0xp
//!
//! ==================================================
//! ```
//!
//! Merging is read-modify-write with no locking across processes; only one writer may run at a
//! time.

use super::{reward::score, tally::PlayerTally};
use crate::{log_internal, logging::PrintColor};
use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::LazyLock,
};

const SEPARATOR: &str = "==================================================";

static ENTRY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>.+): (?P<count>\d+) messages, awarding (?P<points>\d+)xp$")
        .expect("invalid ledger entry pattern")
});

/// A calendar month
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// The month containing `date`
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse a `YYYY-MM` period
    pub fn parse(text: &str) -> Option<Self> {
        NaiveDate::parse_from_str(&format!("{}-01", text.trim()), "%Y-%m-%d")
            .ok()
            .map(Self::containing)
    }

    /// Storage key, e.g. `2025-10`
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Human-facing name, e.g. `October 2025`
    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(date) => date.format("%B %Y").to_string(),
            None => self.key(),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Cumulative totals for one player within a period
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerEntry {
    pub count: u64,
    pub points: u64,
}

/// Every player's totals for one period
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeriodRecord(HashMap<String, LedgerEntry>);

impl PeriodRecord {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fold one run's tally in.  Counts add up.  Points for the run are scored from the run's
    /// own count and added to the prior points; they are not rescored from the cumulative count.
    pub fn merge(&mut self, tally: &PlayerTally) {
        for (player, count) in tally.players() {
            let entry = self.0.entry(player.to_owned()).or_default();
            entry.count += count;
            entry.points += score(count);
        }
    }

    /// Entries by descending count, ties by name
    pub fn sorted(&self) -> Vec<(&str, LedgerEntry)> {
        let mut entries: Vec<(&str, LedgerEntry)> = self
            .0
            .iter()
            .map(|(name, entry)| (name.as_str(), *entry))
            .collect();
        entries.sort_by(|(a_name, a), (b_name, b)| b.count.cmp(&a.count).then(a_name.cmp(b_name)));
        entries
    }

    /// Recover entries from a stored record.  Lines which are not entries are ignored.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .filter_map(|line| {
                let captures = ENTRY_LINE.captures(line.trim_end())?;
                let name = captures["name"].trim().to_owned();
                let count = captures["count"].parse().ok()?;
                let points = captures["points"].parse().ok()?;
                Some((name, LedgerEntry { count, points }))
            })
            .collect();
        Self(entries)
    }

    pub fn render(&self, period: &Period) -> String {
        let mut text = format!("Clan Chat Statistics for {}\n{}\n\n", period, SEPARATOR);
        for (name, entry) in self.sorted() {
            text.push_str(&entry_line(name, entry.count, entry.points));
            text.push('\n');
        }
        text.push('\n');
        text.push_str(SEPARATOR);
        text.push('\n');
        text
    }
}

/// A single player line as it appears in both the ledger and reports
pub fn entry_line(name: &str, count: u64, points: u64) -> String {
    format!("{}: {} messages, awarding {}xp", name, count, points)
}

/// Storage for period records
#[serenity::async_trait]
pub trait LedgerStore: Send + Sync {
    /// Stored record for `period`.  A period never written to is an empty record.
    async fn read(&self, period: &Period) -> Result<PeriodRecord>;
    /// Replace the record for `period`.  Returns where it was written.
    async fn write(&mut self, period: &Period, record: &PeriodRecord) -> Result<String>;
}

/// One text file per period in a directory
pub struct FileLedger {
    dir: PathBuf,
}

impl FileLedger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn set_dir(&mut self, dir: impl Into<PathBuf>) {
        self.dir = dir.into();
    }

    fn path(&self, period: &Period) -> PathBuf {
        self.dir.join(format!("clan_chat_{}.txt", period.key()))
    }
}

#[serenity::async_trait]
impl LedgerStore for FileLedger {
    async fn read(&self, period: &Period) -> Result<PeriodRecord> {
        let path = self.path(period);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(PeriodRecord::parse(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PeriodRecord::default()),
            Err(e) => Err(anyhow!(
                "Could not read ledger `{}`: {}",
                path.to_string_lossy(),
                e
            )),
        }
    }

    async fn write(&mut self, period: &Period, record: &PeriodRecord) -> Result<String> {
        let path = self.path(period);

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            anyhow!(
                "Could not create directory `{}`: {}",
                self.dir.to_string_lossy(),
                e
            )
        })?;

        // Write next to the target, then rename over it, so a failed write leaves the prior
        // record intact.
        let tmp_path = path.with_extension("txt.new");

        tokio::fs::write(&tmp_path, record.render(period))
            .await
            .map_err(|e| {
                anyhow!(
                    "Could not write ledger to temporary file `{}`: {}",
                    tmp_path.to_string_lossy(),
                    e
                )
            })?;

        tokio::fs::rename(&tmp_path, &path).await.map_err(|e| {
            anyhow!(
                "Could not rename temporary file `{}` to `{}`: {}",
                tmp_path.to_string_lossy(),
                path.to_string_lossy(),
                e
            )
        })?;

        Ok(path.to_string_lossy().into_owned())
    }
}

/// Result of folding a run into its period
#[derive(Debug, PartialEq, Eq)]
pub enum LedgerOutcome {
    Saved { location: String },
    /// Nothing to record
    Skipped,
    Failed { error: String },
}

/// Read, merge and rewrite the record for `period`.  Never fails; I/O errors are reported through
/// the outcome so the caller can still deliver its report.
pub async fn merge_period<L: LedgerStore + ?Sized>(
    store: &mut L,
    period: &Period,
    tally: &PlayerTally,
) -> LedgerOutcome {
    if tally.is_empty() {
        return LedgerOutcome::Skipped;
    }

    match read_merge_write(store, period, tally).await {
        Ok(location) => {
            log_internal!("Ledger for {} saved to {}", period.color(), location);
            LedgerOutcome::Saved { location }
        }
        Err(e) => {
            log_internal!("Ledger for {} not saved: {}", period.color(), e);
            LedgerOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}

async fn read_merge_write<L: LedgerStore + ?Sized>(
    store: &mut L,
    period: &Period,
    tally: &PlayerTally,
) -> Result<String> {
    let mut record = store.read(period).await?;
    record.merge(tally);
    store.write(period, &record).await
}

#[cfg(test)]
impl PeriodRecord {
    pub fn get(&self, player: &str) -> Option<LedgerEntry> {
        self.0.get(player).copied()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Keeps rendered records in memory so the text format is still exercised
    #[derive(Default)]
    pub(crate) struct MemoryLedger {
        pub records: HashMap<Period, String>,
        pub fail_writes: bool,
    }

    #[serenity::async_trait]
    impl LedgerStore for MemoryLedger {
        async fn read(&self, period: &Period) -> Result<PeriodRecord> {
            Ok(self
                .records
                .get(period)
                .map(|text| PeriodRecord::parse(text))
                .unwrap_or_default())
        }

        async fn write(&mut self, period: &Period, record: &PeriodRecord) -> Result<String> {
            if self.fail_writes {
                return Err(anyhow!("disk full"));
            }
            self.records.insert(*period, record.render(period));
            Ok(format!("memory:{}", period.key()))
        }
    }

    fn october() -> Period {
        Period::parse("2025-10").unwrap()
    }

    fn tally_of(player: &str, count: usize) -> PlayerTally {
        let mut tally = PlayerTally::new();
        for _ in 0..count {
            tally.record_line(&format!("{player} has defeated X"));
        }
        tally
    }

    #[test]
    fn period_granularity_is_the_month() {
        let a = Period::containing(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
        let b = Period::containing(NaiveDate::from_ymd_opt(2025, 10, 31).unwrap());
        let c = Period::containing(NaiveDate::from_ymd_opt(2025, 11, 1).unwrap());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.key(), "2025-10");
        assert_eq!(a.label(), "October 2025");
        assert_eq!(Period::parse("2025-10"), Some(a));
        assert_eq!(Period::parse("2025-13"), None);
        assert_eq!(Period::parse("October"), None);
    }

    #[test]
    fn render_then_parse() {
        let mut record = PeriodRecord::default();
        let mut tally = tally_of("Zed", 3);
        tally.record_line("**Big-Bad Wolf_2**: hi");
        record.merge(&tally);

        let text = record.render(&october());
        assert!(text.starts_with("Clan Chat Statistics for October 2025\n"));
        assert!(text.contains("\nZed: 3 messages, awarding 0xp\n"));
        assert_eq!(PeriodRecord::parse(&text), record);
    }

    #[test]
    fn render_sorts_by_descending_count_then_name() {
        let mut record = PeriodRecord::default();
        record.merge(&tally_of("Bob", 2));
        record.merge(&tally_of("Amy", 2));
        record.merge(&tally_of("Cal", 5));

        let text = record.render(&october());
        let names: Vec<&str> = text
            .lines()
            .filter_map(|line| line.split_once(": ").map(|(name, _)| name))
            .collect();
        assert_eq!(names, vec!["Cal", "Amy", "Bob"]);
    }

    #[tokio::test]
    async fn first_merge_creates_the_record() {
        let mut store = MemoryLedger::default();
        let outcome = merge_period(&mut store, &october(), &tally_of("Zed", 401)).await;

        assert_eq!(
            outcome,
            LedgerOutcome::Saved {
                location: "memory:2025-10".to_owned()
            }
        );
        assert!(store.records[&october()].contains("Zed: 401 messages, awarding 100xp"));
    }

    #[tokio::test]
    async fn rerun_adds_counts_and_independently_scored_points() {
        let mut store = MemoryLedger::default();
        merge_period(&mut store, &october(), &tally_of("Zed", 401)).await;
        merge_period(&mut store, &october(), &tally_of("Zed", 50)).await;

        let record = store.read(&october()).await.unwrap();
        assert_eq!(
            record.get("Zed"),
            Some(LedgerEntry {
                count: 451,
                points: 100
            })
        );
        assert!(store.records[&october()].contains("Zed: 451 messages, awarding 100xp"));
    }

    /// Points are scored per run and summed, so two runs of 60 earn nothing even though 120 in
    /// one run would earn a tier.  Counts still add up either way.
    #[tokio::test]
    async fn split_runs_do_not_accumulate_tiers() {
        let mut split = MemoryLedger::default();
        merge_period(&mut split, &october(), &tally_of("Zed", 60)).await;
        merge_period(&mut split, &october(), &tally_of("Zed", 60)).await;

        let mut combined = MemoryLedger::default();
        merge_period(&mut combined, &october(), &tally_of("Zed", 120)).await;

        let split = split.read(&october()).await.unwrap().get("Zed").unwrap();
        let combined = combined.read(&october()).await.unwrap().get("Zed").unwrap();
        assert_eq!(split.count, combined.count);
        assert_eq!(split.points, 0);
        assert_eq!(combined.points, 25);
    }

    #[tokio::test]
    async fn periods_are_independent() {
        let mut store = MemoryLedger::default();
        let november = Period::parse("2025-11").unwrap();
        merge_period(&mut store, &october(), &tally_of("Zed", 3)).await;
        merge_period(&mut store, &november, &tally_of("Zed", 4)).await;

        assert_eq!(store.read(&october()).await.unwrap().get("Zed").unwrap().count, 3);
        assert_eq!(store.read(&november).await.unwrap().get("Zed").unwrap().count, 4);
    }

    #[tokio::test]
    async fn empty_tally_is_skipped() {
        let mut store = MemoryLedger::default();
        let outcome = merge_period(&mut store, &october(), &PlayerTally::new()).await;
        assert_eq!(outcome, LedgerOutcome::Skipped);
        assert!(store.records.is_empty());
    }

    #[tokio::test]
    async fn write_failure_is_soft() {
        let mut store = MemoryLedger {
            fail_writes: true,
            ..Default::default()
        };
        let outcome = merge_period(&mut store, &october(), &tally_of("Zed", 1)).await;
        assert_eq!(
            outcome,
            LedgerOutcome::Failed {
                error: "disk full".to_owned()
            }
        );
        assert!(matches!(outcome, LedgerOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn file_ledger_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileLedger::new(dir.path().join("ledger"));

        assert!(store.read(&october()).await.unwrap().is_empty());

        merge_period(&mut store, &october(), &tally_of("Zed", 401)).await;
        merge_period(&mut store, &october(), &tally_of("Zed", 50)).await;

        let path = dir.path().join("ledger").join("clan_chat_2025-10.txt");
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            format!(
                "Clan Chat Statistics for October 2025\n{SEPARATOR}\n\n\
                 Zed: 451 messages, awarding 100xp\n\n{SEPARATOR}\n"
            )
        );
        assert!(!path.with_extension("txt.new").exists());
    }

    #[tokio::test]
    async fn file_ledger_read_error_is_soft() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the record file should be makes the read fail
        std::fs::create_dir_all(dir.path().join("clan_chat_2025-10.txt")).unwrap();
        let mut store = FileLedger::new(dir.path());

        let outcome = merge_period(&mut store, &october(), &tally_of("Zed", 1)).await;
        assert!(matches!(outcome, LedgerOutcome::Failed { .. }));
    }
}
