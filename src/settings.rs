use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serenity::model::id::{GuildId, UserId};
use tokio::sync::RwLock;
use tracing::info;

pub const VOLUME: &str = "Volume";
pub const DEFAULT_VOLUME: &str = "DefaultVolume";
pub const REQUIRED_STOP_ROLE: &str = "RequiredStopRole";
pub const XP: &str = "XP";

const FALLBACK_VOLUME: f64 = 0.6;

#[derive(Default, Serialize, Deserialize)]
struct SettingsData {
    #[serde(default)]
    guilds: HashMap<u64, HashMap<String, Value>>,
    // guild id -> user id -> key -> value
    #[serde(default)]
    users: HashMap<u64, HashMap<u64, HashMap<String, Value>>>,
}

/// Per-guild and per-user stat store backed by a JSON file. Loaded once at
/// startup, rewritten on every mutation. Values are small and writes are
/// rare, so the file IO stays synchronous.
pub struct Settings {
    path: PathBuf,
    data: RwLock<SettingsData>,
}

impl Settings {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let data = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(data) => data,
                Err(why) => {
                    info!("Could not parse {}, starting fresh: {why}", path.display());
                    SettingsData::default()
                }
            },
            Err(_) => SettingsData::default(),
        };

        Self {
            path,
            data: RwLock::new(data),
        }
    }

    pub async fn get_guild_stat(&self, guild: GuildId, key: &str) -> Option<Value> {
        let data = self.data.read().await;
        data.guilds.get(&guild.0)?.get(key).cloned()
    }

    pub async fn set_guild_stat(&self, guild: GuildId, key: &str, value: Value) {
        let mut data = self.data.write().await;
        data.guilds
            .entry(guild.0)
            .or_default()
            .insert(key.to_string(), value);
        self.persist(&data);
    }

    pub async fn delete_guild_stat(&self, guild: GuildId, key: &str) {
        let mut data = self.data.write().await;
        if let Some(stats) = data.guilds.get_mut(&guild.0) {
            stats.remove(key);
        }
        self.persist(&data);
    }

    pub async fn get_user_stat(&self, guild: GuildId, user: UserId, key: &str) -> Option<Value> {
        let data = self.data.read().await;
        data.users.get(&guild.0)?.get(&user.0)?.get(key).cloned()
    }

    pub async fn set_user_stat(&self, guild: GuildId, user: UserId, key: &str, value: Value) {
        let mut data = self.data.write().await;
        data.users
            .entry(guild.0)
            .or_default()
            .entry(user.0)
            .or_default()
            .insert(key.to_string(), value);
        self.persist(&data);
    }

    pub async fn guild_f64(&self, guild: GuildId, key: &str) -> Option<f64> {
        self.get_guild_stat(guild, key).await?.as_f64()
    }

    pub async fn guild_string(&self, guild: GuildId, key: &str) -> Option<String> {
        self.get_guild_stat(guild, key)
            .await?
            .as_str()
            .map(str::to_string)
    }

    /// The voter's weight. Missing or non-numeric XP weighs 0.
    pub async fn user_xp(&self, guild: GuildId, user: UserId) -> u64 {
        self.get_user_stat(guild, user, XP)
            .await
            .and_then(|value| value.as_u64())
            .unwrap_or(0)
    }

    /// Playback volume for the guild: the last explicitly set volume, else
    /// the configured default, else 60%.
    pub async fn volume_for(&self, guild: GuildId) -> f32 {
        let volume = match self.guild_f64(guild, VOLUME).await {
            Some(volume) => volume,
            None => self
                .guild_f64(guild, DEFAULT_VOLUME)
                .await
                .unwrap_or(FALLBACK_VOLUME),
        };

        volume.clamp(0.0, 1.0) as f32
    }

    fn persist(&self, data: &SettingsData) {
        let contents = match serde_json::to_string_pretty(data) {
            Ok(contents) => contents,
            Err(why) => {
                info!("Could not serialize settings: {why}");
                return;
            }
        };

        if let Err(why) = fs::write(&self.path, contents) {
            info!("Could not write {}: {why}", self.path.display());
        }
    }
}
