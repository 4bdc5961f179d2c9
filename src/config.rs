use crate::clan_chat::{report::DEFAULT_CHUNK_BUDGET, tally::Pacing};
use anyhow::{anyhow, Result};
use std::{ops::RangeInclusive, path::PathBuf, time::Duration};
use tokio::io::AsyncReadExt;

const CONFIG_PATH_REL_HOME: &str = ".config/clanbot/config.toml";
const LEDGER_DIR_REL_HOME: &str = ".config/clanbot/ledger";
/// A chunk must fit at least one character and its newline, and Discord caps messages at 2000
const CHUNK_BUDGET_RANGE: RangeInclusive<usize> = 2..=2000;

/// Bot configuration
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub general: General,
    #[serde(default)]
    pub clan_chat: ClanChat,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct General {
    pub discord_token: String,
    pub bot_owners: Vec<String>,
    pub command_prefix: String,
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ClanChat {
    /// Where per-month ledger files live.  Defaults to a directory next to the config.
    pub ledger_dir: Option<PathBuf>,
    /// Maximum characters per reply message
    pub chunk_budget: usize,
    /// Messages to process between pauses.  Zero disables pausing.
    pub pause_every: usize,
    pub pause_millis: u64,
    /// Messages requested per history page, at most 100
    pub history_page_size: u8,
}

impl Default for ClanChat {
    fn default() -> Self {
        Self {
            ledger_dir: None,
            chunk_budget: DEFAULT_CHUNK_BUDGET,
            pause_every: 100,
            pause_millis: 1000,
            history_page_size: 100,
        }
    }
}

impl ClanChat {
    pub fn ledger_dir(&self) -> Result<PathBuf> {
        match &self.ledger_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::home_dir()
                .map(|p| p.join(LEDGER_DIR_REL_HOME))
                .ok_or(anyhow!("Could not find home directory")),
        }
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            pause_every: self.pause_every,
            pause: Duration::from_millis(self.pause_millis),
        }
    }
}

impl Config {
    fn config_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|p| p.join(CONFIG_PATH_REL_HOME))
            .ok_or(anyhow!("Could not find home directory"))
    }

    pub async fn load() -> Result<Self> {
        let path = Self::config_path()?;

        let mut file = tokio::fs::File::open(&path).await.map_err(|e| {
            anyhow!(
                "Could not open configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).await.map_err(|e| {
            anyhow!(
                "Could not read configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        Self::parse(&contents).map_err(|e| {
            anyhow!(
                "Could not parse configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })
    }

    fn parse(contents: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(contents)?;

        if !CHUNK_BUDGET_RANGE.contains(&cfg.clan_chat.chunk_budget) {
            return Err(anyhow!(
                "clan_chat.chunk_budget must be between {} and {}, got {}",
                CHUNK_BUDGET_RANGE.start(),
                CHUNK_BUDGET_RANGE.end(),
                cfg.clan_chat.chunk_budget
            ));
        }

        Ok(cfg)
    }

    pub async fn reload(&mut self) -> Result<()> {
        let new = Self::load().await?;
        *self = new;
        Ok(())
    }
}
