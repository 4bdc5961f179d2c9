use crate::{
    clan_chat::ledger::FileLedger, config::Config, context::Context, event::Event,
};
use serenity::all::{Message, Ready};
use tokio::sync::{Mutex, RwLock};

/// Discord event handler
pub struct Handler {
    cfg: RwLock<Config>,
    ledger: Mutex<FileLedger>,
}

impl<'a> Handler {
    pub fn new(cfg: Config, ledger: FileLedger) -> Self {
        Self {
            cfg: RwLock::new(cfg),
            ledger: Mutex::new(ledger),
        }
    }

    fn ctx(&'a self, discord_ctx: &'a serenity::all::Context) -> Context<'a> {
        Context {
            cfg: &self.cfg,
            ledger: &self.ledger,
            cache: &discord_ctx.cache,
            http: &discord_ctx.http,
            cache_http: discord_ctx,
        }
    }
}

#[serenity::async_trait]
impl serenity::all::EventHandler for Handler {
    async fn ready(&self, discord_ctx: serenity::all::Context, ready: Ready) {
        Event::Ready(ready).handle(self.ctx(&discord_ctx)).await;
    }

    async fn message(&self, discord_ctx: serenity::all::Context, msg: Message) {
        Event::Message(msg).handle(self.ctx(&discord_ctx)).await;
    }
}
