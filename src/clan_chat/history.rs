use super::{date_range::DateRange, tally::MessageSource};
use crate::context::CacheHttp;
use anyhow::Result;
use serenity::all::{ChannelId, GetMessages, MessageId};

/// Discord snowflakes count milliseconds from the start of 2015
const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

/// Pages through a channel's messages within a date range, oldest first
pub struct ChannelHistory<'a> {
    cache_http: &'a CacheHttp,
    channel_id: ChannelId,
    /// Only messages newer than this are fetched next
    after: MessageId,
    end_unix: i64,
    page_size: u8,
    done: bool,
}

impl<'a> ChannelHistory<'a> {
    pub fn new(
        cache_http: &'a CacheHttp,
        channel_id: ChannelId,
        range: &DateRange,
        page_size: u8,
    ) -> Self {
        Self {
            cache_http,
            channel_id,
            after: snowflake_before(range.start_time().timestamp_millis()),
            end_unix: range.end_time().timestamp(),
            page_size: page_size.clamp(1, 100),
            done: false,
        }
    }
}

/// Largest snowflake strictly older than `unix_ms`
fn snowflake_before(unix_ms: i64) -> MessageId {
    let since_epoch = u64::try_from(unix_ms - DISCORD_EPOCH_MS).unwrap_or(0);
    MessageId::new((since_epoch << 22).saturating_sub(1).max(1))
}

#[serenity::async_trait]
impl MessageSource for ChannelHistory<'_> {
    async fn next_batch(&mut self) -> Result<Option<Vec<String>>> {
        if self.done {
            return Ok(None);
        }

        let mut messages = self
            .channel_id
            .messages(
                self.cache_http,
                GetMessages::new().after(self.after).limit(self.page_size),
            )
            .await?;

        // Discord does not promise an order; walk forward in time
        messages.sort_by_key(|msg| msg.id);

        if messages.len() < usize::from(self.page_size) {
            self.done = true;
        }
        let Some(last) = messages.last() else {
            return Ok(None);
        };
        self.after = last.id;

        let mut contents = Vec::with_capacity(messages.len());
        for msg in messages {
            if msg.timestamp.unix_timestamp() > self.end_unix {
                self.done = true;
                break;
            }
            if !msg.content.is_empty() {
                contents.push(msg.content);
            }
        }

        Ok(Some(contents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflake_boundaries() {
        // First millisecond of 2015-01-02
        let id = snowflake_before(DISCORD_EPOCH_MS + 86_400_000);
        assert_eq!(id.get(), (86_400_000u64 << 22) - 1);
        assert!(id.created_at().unix_timestamp() < (DISCORD_EPOCH_MS + 86_400_000) / 1000);

        // Dates before Discord existed clamp to the oldest possible id
        assert_eq!(snowflake_before(0).get(), 1);
    }
}
