use crate::{context::Context, event::*};
use anyhow::Result;

mod clan_ledger;
mod compile_clan_chat;
mod debug;
mod help;
mod ignore_bots;
mod reload;

#[serenity::async_trait]
pub trait Plugin: Sync + Send {
    /// Plugin name.  Doubles as the command name for command plugins.
    fn name(&self) -> &'static str;
    /// Help message line.  None if no help message
    async fn usage(&self, ctx: &Context<'_>) -> Option<String>;
    /// Potentially handle event.  Returns:
    /// - Ok(EventHandled::Yes) if the event has been handled and no other plugin should attempt to
    /// handle it
    /// - Ok(EventHandled::No) if another plugin should attempt to handle the event
    /// - Err if an error occurred
    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled>;
}

/// Ordered list of available plugins
pub fn plugins() -> Vec<Box<dyn Plugin>> {
    use crate::plugin::*;

    vec![
        // Core bot operations
        Box::new(debug::Debug),
        Box::new(ignore_bots::IgnoreBots),
        Box::new(help::Help),
        Box::new(reload::Reload),
        // Clan chat statistics
        Box::new(compile_clan_chat::CompileClanChat),
        Box::new(clan_ledger::ClanLedger),
    ]
}
