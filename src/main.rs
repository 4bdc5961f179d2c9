mod clan_chat;
mod config;
mod context;
mod event;
mod handler;
mod helper;
mod logging;
mod plugin;

use serenity::{all::GatewayIntents, Client};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = crate::config::Config::load().await?;
    let token = cfg.general.discord_token.clone();
    let ledger = crate::clan_chat::ledger::FileLedger::new(cfg.clan_chat.ledger_dir()?);
    log_internal!("Ledger directory: {}", ledger.dir().to_string_lossy());
    let handler = handler::Handler::new(cfg, ledger);

    // Things we want discord to tell us about.
    let intents = GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    Client::builder(&token, intents)
        .event_handler(handler)
        .await?
        .start()
        .await
        .map_err(Into::into)
}
