use super::classify::{self, Category};
use crate::log_internal;
use anyhow::Result;
use std::{collections::HashMap, time::Duration};

/// Supplier of raw message text, oldest first
#[serenity::async_trait]
pub trait MessageSource: Send {
    /// Next batch of message contents.  None once the range is exhausted.
    async fn next_batch(&mut self) -> Result<Option<Vec<String>>>;
}

/// How often the aggregator backs off so the host's transport can recover
#[derive(Clone, Copy, Debug)]
pub struct Pacing {
    /// Messages processed between pauses.  Zero disables pausing.
    pub pause_every: usize,
    pub pause: Duration,
}

/// Per-player event counts for a single run
#[derive(Debug, Default)]
pub struct PlayerTally {
    players: HashMap<String, u64>,
    categories: HashMap<Category, u64>,
    total: u64,
    unattributed: u64,
    /// Messages with text content
    messages: u64,
    /// Non-blank lines across those messages
    lines: u64,
}

impl PlayerTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one line.  Returns whether it was attributed to a player.
    pub fn record_line(&mut self, line: &str) -> bool {
        if line.trim().is_empty() {
            return false;
        }
        self.lines += 1;

        match classify::attribute(line) {
            Some(attribution) => {
                *self.players.entry(attribution.player).or_default() += 1;
                *self.categories.entry(attribution.category).or_default() += 1;
                self.total += 1;
                true
            }
            None => {
                self.unattributed += 1;
                false
            }
        }
    }

    /// Classify every line of a (possibly multi-line) message
    pub fn record_message(&mut self, content: &str) {
        if content.trim().is_empty() {
            return;
        }
        self.messages += 1;

        for line in content.lines() {
            self.record_line(line);
        }
    }

    /// Drain a message source into a fresh tally, pausing between batches of messages per
    /// `pacing`.
    pub async fn collect<S: MessageSource + ?Sized>(
        source: &mut S,
        pacing: &Pacing,
    ) -> Result<Self> {
        let mut tally = Self::new();
        let mut processed: usize = 0;

        while let Some(batch) = source.next_batch().await? {
            for content in batch {
                tally.record_message(&content);
                processed += 1;

                if pacing.pause_every != 0 && processed % pacing.pause_every == 0 {
                    log_internal!("Processed {} messages...", processed);
                    if pacing.pause.is_zero() {
                        tokio::task::yield_now().await;
                    } else {
                        tokio::time::sleep(pacing.pause).await;
                    }
                }
            }
        }

        log_internal!(
            "Processed {} messages ({} with content, {} lines): {} attributed events across {} \
             players, {} unattributed lines",
            processed,
            tally.messages,
            tally.lines,
            tally.total,
            tally.players.len(),
            tally.unattributed,
        );

        Ok(tally)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> impl Iterator<Item = (&str, u64)> {
        self.players.iter().map(|(name, count)| (name.as_str(), *count))
    }

    /// Messages which had any text content
    pub fn messages(&self) -> u64 {
        self.messages
    }

    /// Non-blank lines checked, attributed or not
    pub fn lines(&self) -> u64 {
        self.lines
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Attributed events, always the sum of every player's count
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Non-zero category counts in category order
    pub fn categories(&self) -> Vec<(Category, u64)> {
        let mut categories: Vec<(Category, u64)> =
            self.categories.iter().map(|(c, n)| (*c, *n)).collect();
        categories.sort();
        categories
    }
}

#[cfg(test)]
impl PlayerTally {
    pub fn get(&self, player: &str) -> u64 {
        self.players.get(player).copied().unwrap_or(0)
    }

    pub fn unattributed(&self) -> u64 {
        self.unattributed
    }
}
