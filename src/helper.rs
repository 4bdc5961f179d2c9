//! Miscellaneous convenience methods

use crate::context::Context;
use anyhow::Result;
use serenity::all::{ChannelId, GuildId};
use std::collections::HashMap;

#[serenity::async_trait]
pub trait UserHelper {
    async fn nick_in_guild(&self, ctx: &Context<'_>, guild_id: Option<GuildId>) -> String;
}

#[serenity::async_trait]
impl UserHelper for serenity::all::User {
    async fn nick_in_guild(&self, ctx: &Context<'_>, guild_id: Option<GuildId>) -> String {
        let nick_in_guild = match guild_id {
            Some(guild_id) => self.nick_in(ctx.cache_http, guild_id).await,
            None => None,
        };

        // May not be in a guild, e.g. DM.  Fall back to global username.
        match nick_in_guild {
            Some(nick_in_guild) => nick_in_guild,
            None => self.name.clone(),
        }
    }
}

#[serenity::async_trait]
pub trait MessageHelper {
    async fn human_format_content(&self, ctx: &Context<'_>) -> String;
    async fn is_from_owner(&self, ctx: &Context<'_>) -> bool;
    async fn reply_in_chunks(&self, ctx: &Context<'_>, chunks: Vec<String>) -> Result<()>;
}

#[serenity::async_trait]
impl MessageHelper for serenity::all::Message {
    /// Replace user and channel mentions, e.g. `<@123>`, with per-server names.
    async fn human_format_content(&self, ctx: &Context<'_>) -> String {
        let mut mention_map: HashMap<String, String> = HashMap::new();

        for user in &self.mentions {
            let name = user.nick_in_guild(ctx, self.guild_id).await;
            mention_map.insert(format!("<@!{}>", user.id), name.clone());
            mention_map.insert(format!("<@{}>", user.id), name);
        }

        for channel in &self.mention_channels {
            mention_map.insert(format!("<#{}>", channel.id), format!("#{}", channel.name));
        }

        let mut content = self.content.clone();
        for (mention, name) in mention_map {
            content = content.replace(&mention, &name);
        }
        content
    }

    async fn is_from_owner(&self, ctx: &Context<'_>) -> bool {
        let owners = &ctx.cfg.read().await.general.bot_owners;
        let author_global_name = &self.author.name;

        owners.contains(author_global_name)
    }

    /// Send chunks in order, the first as a reply
    async fn reply_in_chunks(&self, ctx: &Context<'_>, chunks: Vec<String>) -> Result<()> {
        let mut chunks = chunks.into_iter();

        if let Some(first) = chunks.next() {
            self.reply(ctx.cache_http, first).await?;
        }
        for chunk in chunks {
            self.channel_id.say(ctx.cache_http, chunk).await?;
        }

        Ok(())
    }
}

/// Channel named by a command argument, either a mention (`<#123>`) or a bare id
pub fn parse_channel_arg(arg: &str) -> Option<ChannelId> {
    let id = arg
        .strip_prefix("<#")
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(arg);

    match id.parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(id) => Some(ChannelId::new(id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_args() {
        assert_eq!(parse_channel_arg("<#1234>"), Some(ChannelId::new(1234)));
        assert_eq!(parse_channel_arg("1234"), Some(ChannelId::new(1234)));
        assert_eq!(parse_channel_arg("<#0>"), None);
        assert_eq!(parse_channel_arg("general"), None);
        assert_eq!(parse_channel_arg("<@1234>"), None);
    }
}
