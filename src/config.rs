use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serenity::all::ChannelId;

use crate::countdown::{BoardConfig, BoardKind, DurationPolicy};

const GENERAL_CHANNELS: &str = "1215353680539418686,1112675424229670995,1215353688579772417,1170411419850788936";
const WORLD_BOSS_CHANNELS: &str = "1215353681059381326,1112675424229670995,1170411419850788936";
const MIN_POLL_MS: u64 = 100;
const BATTLE_API_BASE: &str = "https://gameinfo.albiononline.com/api/gameinfo/battles";

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub prefix: String,
    pub database_url: String,
    pub general: BoardConfig,
    pub world_boss: BoardConfig,
    pub sheets: SheetsConfig,
    pub guilds: GuildConfig,
    pub roles: RoleConfig,
}

#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_key: String,
    /// Path of the service-account JSON key.
    pub credentials_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct GuildConfig {
    /// Lower-cased guild names counted by CSV reconciliation.
    pub loot_guilds: Vec<String>,
    pub battle_guild: String,
    pub battle_api_base: String,
}

#[derive(Debug, Clone)]
pub struct RoleConfig {
    pub members: Vec<String>,
    pub officers: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let poll_raw = std::env::var("COUNTDOWN_POLL_MS").unwrap_or_else(|_| "1000".to_string());
        let poll_interval = parse_poll_interval(&poll_raw).context("COUNTDOWN_POLL_MS must be a number of milliseconds")?;
        let wb_hours: i64 = std::env::var("WORLD_BOSS_HOURS")
            .unwrap_or_else(|_| "48".to_string())
            .parse()
            .context("WORLD_BOSS_HOURS must be a whole number")?;

        Ok(Self {
            discord_token: std::env::var("DISCORD_TOKEN").context("DISCORD_TOKEN must be set")?,
            prefix: std::env::var("COMMAND_PREFIX").unwrap_or_else(|_| "#".to_string()),
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            general: BoardConfig {
                kind: BoardKind::General,
                allowed_channels: channel_list("GENERAL_CHANNEL_IDS", GENERAL_CHANNELS)?,
                store_path: std::env::var("GENERAL_STORE_PATH")
                    .unwrap_or_else(|_| "active_countdowns.json".to_string())
                    .into(),
                duration: DurationPolicy::Relative,
                members_only: true,
                poll_interval,
            },
            world_boss: BoardConfig {
                kind: BoardKind::WorldBoss,
                allowed_channels: channel_list("WORLD_BOSS_CHANNEL_IDS", WORLD_BOSS_CHANNELS)?,
                store_path: std::env::var("WORLD_BOSS_STORE_PATH")
                    .unwrap_or_else(|_| "wb_countdown.json".to_string())
                    .into(),
                duration: DurationPolicy::FixedWindow { hours: wb_hours },
                members_only: false,
                poll_interval,
            },
            sheets: SheetsConfig {
                spreadsheet_key: std::env::var("SPREADSHEET_KEY").unwrap_or_default(),
                credentials_path: std::env::var("GOOGLE_CREDENTIALS")
                    .unwrap_or_else(|_| "service_account.json".to_string())
                    .into(),
            },
            guilds: GuildConfig {
                loot_guilds: name_list(
                    &std::env::var("LOOT_GUILDS").unwrap_or_else(|_| "smurfing monkeys,surfing penguins".to_string()),
                )
                .into_iter()
                .map(|g| g.to_lowercase())
                .collect(),
                battle_guild: std::env::var("BATTLE_GUILD").unwrap_or_else(|_| "smurfing monkeys".to_string()),
                battle_api_base: std::env::var("BATTLE_API_BASE").unwrap_or_else(|_| BATTLE_API_BASE.to_string()),
            },
            roles: RoleConfig {
                members: name_list(&std::env::var("MEMBER_ROLES").unwrap_or_else(|_| "member,trial,EU Release".to_string())),
                officers: name_list(&std::env::var("OFFICER_ROLES").unwrap_or_else(|_| "Officer,Council".to_string())),
            },
        })
    }
}

fn channel_list(var: &str, default: &str) -> Result<HashSet<ChannelId>> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    parse_channel_ids(&raw).with_context(|| format!("{var} must be a comma separated list of channel ids"))
}

pub fn parse_channel_ids(raw: &str) -> Result<HashSet<ChannelId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let id: u64 = s.parse().with_context(|| format!("bad channel id `{s}`"))?;
            anyhow::ensure!(id != 0, "channel id can't be 0");
            Ok(ChannelId::new(id))
        })
        .collect()
}

pub fn parse_poll_interval(raw: &str) -> Result<Duration> {
    let ms: u64 = raw.trim().parse()?;
    anyhow::ensure!(ms >= MIN_POLL_MS, "poll interval must be at least {MIN_POLL_MS} ms, got {ms}");
    Ok(Duration::from_millis(ms))
}

fn name_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
