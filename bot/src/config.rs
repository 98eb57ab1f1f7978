use std::path::PathBuf;
use std::str::FromStr;

use passage_core::MemberId;
use passage_core::channel::DEFAULT_TICKET_PREFIX;
use passage_core::record::DEFAULT_SCAN_WINDOW;
use passage_core::session::SESSION_TIMEOUT_SECS;
use serenity::all::{ChannelId, GuildId};
use thiserror::Error;

const DEFAULT_GUILD_ID: u64 = 1393982298654900345;
const DEFAULT_OWNER_ID: u64 = 342021125800198144;
const DEFAULT_DEMANDS_CHANNEL_ID: u64 = 1393984437078720603;
const DEFAULT_TICKET_CATEGORY_ID: u64 = 1426346995466895480;
const DEFAULT_FEEDBACK_CHANNEL_ID: u64 = 1394291299066056745;
const DEFAULT_SCREEN_CHANNEL_ID: u64 = 1427079620246638732;
const DEFAULT_DASHBOARD_CHANNEL_ID: u64 = 1426347294525096119;
const DEFAULT_PASSEURS_PATH: &str = "passeurs.json";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Runtime configuration, read from the environment (and `.env` in dev).
#[derive(Clone)]
pub struct BotConfig {
    pub token: String,
    pub guild_id: u64,
    pub owner_id: MemberId,
    pub demands_channel_id: u64,
    pub ticket_category_id: u64,
    pub feedback_channel_id: u64,
    pub screen_channel_id: u64,
    pub dashboard_channel_id: u64,
    /// `None` when alerting is disabled (`ALERT_CHANNEL_ID=0`).
    pub alert_channel_id: Option<u64>,
    pub passeurs_path: PathBuf,
    pub ticket_prefix: String,
    pub session_timeout_secs: i64,
    pub history_window: usize,
    pub recap_fallback: bool,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("DISCORD_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let snowflake = |key: &'static str, default: u64| -> Result<u64, ConfigError> {
            let id = parse_or(&lookup, key, default)?;
            if id == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    value: "0".to_string(),
                });
            }
            Ok(id)
        };

        let alert_channel_id = parse_or::<u64, _>(&lookup, "ALERT_CHANNEL_ID", 0)?;
        let history_window: usize =
            parse_or(&lookup, "PASSAGE_HISTORY_WINDOW", DEFAULT_SCAN_WINDOW)?;
        let session_timeout_secs: i64 =
            parse_or(&lookup, "PASSAGE_SESSION_TIMEOUT_SECS", SESSION_TIMEOUT_SECS)?;
        if session_timeout_secs <= 0 {
            return Err(ConfigError::Invalid {
                key: "PASSAGE_SESSION_TIMEOUT_SECS",
                value: session_timeout_secs.to_string(),
            });
        }

        Ok(Self {
            token,
            guild_id: snowflake("PASSAGE_GUILD_ID", DEFAULT_GUILD_ID)?,
            owner_id: MemberId(snowflake("PASSAGE_OWNER_ID", DEFAULT_OWNER_ID)?),
            demands_channel_id: snowflake("PASSAGE_DEMANDS_CHANNEL_ID", DEFAULT_DEMANDS_CHANNEL_ID)?,
            ticket_category_id: snowflake("PASSAGE_TICKET_CATEGORY_ID", DEFAULT_TICKET_CATEGORY_ID)?,
            feedback_channel_id: snowflake(
                "PASSAGE_FEEDBACK_CHANNEL_ID",
                DEFAULT_FEEDBACK_CHANNEL_ID,
            )?,
            screen_channel_id: snowflake("PASSAGE_SCREEN_CHANNEL_ID", DEFAULT_SCREEN_CHANNEL_ID)?,
            dashboard_channel_id: snowflake(
                "PASSAGE_DASHBOARD_CHANNEL_ID",
                DEFAULT_DASHBOARD_CHANNEL_ID,
            )?,
            alert_channel_id: (alert_channel_id != 0).then_some(alert_channel_id),
            passeurs_path: lookup("PASSEURS_JSON_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PASSEURS_PATH)),
            ticket_prefix: lookup("PASSAGE_TICKET_PREFIX")
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TICKET_PREFIX.to_string()),
            session_timeout_secs,
            history_window: history_window.clamp(1, 100),
            recap_fallback: parse_or(&lookup, "PASSAGE_RECAP_FALLBACK", true)?,
        })
    }

    pub fn guild(&self) -> GuildId {
        GuildId::new(self.guild_id)
    }

    pub fn demands_channel(&self) -> ChannelId {
        ChannelId::new(self.demands_channel_id)
    }

    pub fn ticket_category(&self) -> ChannelId {
        ChannelId::new(self.ticket_category_id)
    }

    pub fn feedback_channel(&self) -> ChannelId {
        ChannelId::new(self.feedback_channel_id)
    }

    pub fn screen_channel(&self) -> ChannelId {
        ChannelId::new(self.screen_channel_id)
    }

    pub fn dashboard_channel(&self) -> ChannelId {
        ChannelId::new(self.dashboard_channel_id)
    }

    pub fn alert_channel(&self) -> Option<ChannelId> {
        self.alert_channel_id.map(ChannelId::new)
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
