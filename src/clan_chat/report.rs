//! Render statistics as Discord messages.

use super::{ledger::entry_line, reward::score, tally::PlayerTally};
use crate::log_internal;

/// Discord rejects messages over 2000 characters; leave headroom.
pub const DEFAULT_CHUNK_BUDGET: usize = 1980;

/// One player's line in a report
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoredEntry {
    pub name: String,
    pub count: u64,
    pub points: u64,
}

impl ScoredEntry {
    /// Entries for a run's tally, scored from the run's counts, sorted by descending count then
    /// name.
    pub fn from_tally(tally: &PlayerTally) -> Vec<Self> {
        let mut entries: Vec<Self> = tally
            .players()
            .map(|(name, count)| Self {
                name: name.to_owned(),
                count,
                points: score(count),
            })
            .collect();
        sort(&mut entries);
        entries
    }
}

pub fn sort(entries: &mut [ScoredEntry]) {
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
}

/// A header block followed by one line per entry
#[derive(Debug, Default)]
pub struct Report {
    header: Vec<String>,
    entries: Vec<ScoredEntry>,
}

impl Report {
    pub fn new(entries: Vec<ScoredEntry>) -> Self {
        Self {
            header: Vec::new(),
            entries,
        }
    }

    pub fn header_line(mut self, line: impl Into<String>) -> Self {
        self.header.push(line.into());
        self
    }

    fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.header.iter().cloned().chain(
            self.entries
                .iter()
                .map(|entry| entry_line(&entry.name, entry.count, entry.points)),
        )
    }

    /// The whole report as one string, each line newline-terminated
    #[cfg(test)]
    pub fn render(&self) -> String {
        self.lines().map(|line| line + "\n").collect()
    }

    /// Split into messages of at most `budget` characters, breaking only between lines.
    /// Concatenated in order, the chunks reproduce the whole report.
    pub fn chunks(&self, budget: usize) -> Vec<String> {
        chunk_lines(self.lines(), budget)
    }
}

/// Greedily pack newline-terminated lines into chunks of at most `budget` characters.
///
/// A single line longer than the budget cannot be placed whole; it is truncated to fit in a chunk
/// of its own.
pub fn chunk_lines<I>(lines: I, budget: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in lines {
        let mut line = line + "\n";
        let mut len = line.chars().count();

        if len > budget {
            log_internal!("Truncating report line of {} characters", len);
            line = line.chars().take(budget.saturating_sub(1)).collect::<String>() + "\n";
            len = line.chars().count();
        }

        if current_len + len > budget && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        current.push_str(&line);
        current_len += len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
