//! Application configuration structs
//!
//! Loads configuration from a JSON file, then applies environment overrides
//! of the form `RELAY__<SECTION>__<KEY>` (for example `RELAY__DISCORD__TOKEN`).

use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "TwitchSettings::disabled")]
    pub twitch: TwitchSettings,
    #[serde(default = "DiscordSettings::disabled")]
    pub discord: DiscordSettings,
    #[serde(default)]
    pub console: ConsoleSettings,
    #[serde(default)]
    pub log: LogSettings,
}

/// Line-protocol (Twitch chat) connection settings
#[derive(Clone, Deserialize)]
pub struct TwitchSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_twitch_host")]
    pub host: String,
    #[serde(default = "default_twitch_port")]
    pub port: u16,
    #[serde(default)]
    pub nick: String,
    #[serde(default)]
    pub pass: String,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default = "default_enabled")]
    pub tls: bool,
}

/// Discord gateway and REST settings
#[derive(Clone, Deserialize)]
pub struct DiscordSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_intents")]
    pub intents: u64,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

/// Operator console settings
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_console_host")]
    pub host: String,
    #[serde(default = "default_console_port")]
    pub port: u16,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// Filter directive, e.g. "info" or "relay_gateway=debug,info"
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

// Default value functions
fn default_enabled() -> bool {
    true
}

fn default_twitch_host() -> String {
    "irc.chat.twitch.tv".to_string()
}

fn default_twitch_port() -> u16 {
    6697
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_intents() -> u64 {
    // GUILD_MESSAGES | DIRECT_MESSAGES
    (1 << 9) | (1 << 12)
}

fn default_reconnect_delay_ms() -> u64 {
    5000
}

fn default_console_host() -> String {
    "127.0.0.1".to_string()
}

fn default_console_port() -> u16 {
    7000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TwitchSettings {
    fn disabled() -> Self {
        Self {
            enabled: false,
            host: default_twitch_host(),
            port: default_twitch_port(),
            nick: String::new(),
            pass: String::new(),
            channels: Vec::new(),
            tls: true,
        }
    }
}

impl DiscordSettings {
    fn disabled() -> Self {
        Self {
            enabled: false,
            token: String::new(),
            api_base: default_api_base(),
            intents: default_intents(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_console_host(),
            port: default_console_port(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl ConsoleSettings {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Credentials never reach the logs
impl fmt::Debug for TwitchSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitchSettings")
            .field("enabled", &self.enabled)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("nick", &self.nick)
            .field("pass", &"********")
            .field("channels", &self.channels)
            .field("tls", &self.tls)
            .finish()
    }
}

impl fmt::Debug for DiscordSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordSettings")
            .field("enabled", &self.enabled)
            .field("token", &"********")
            .field("api_base", &self.api_base)
            .field("intents", &self.intents)
            .field("reconnect_delay_ms", &self.reconnect_delay_ms)
            .finish()
    }
}

impl RelayConfig {
    /// Load configuration from a JSON file plus `RELAY__` environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = ::config::Config::builder()
            .add_source(::config::File::from(path).format(::config::FileFormat::Json))
            .add_source(
                ::config::Environment::with_prefix("RELAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON document, without environment overrides
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = ::config::Config::builder()
            .add_source(::config::File::from_str(json, ::config::FileFormat::Json))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check that every enabled section has what it needs to start
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.twitch.enabled {
            if self.twitch.host.is_empty() {
                return Err(ConfigError::MissingValue("twitch.host"));
            }
            if self.twitch.nick.is_empty() {
                return Err(ConfigError::MissingValue("twitch.nick"));
            }
            if self.twitch.port == 0 {
                return Err(ConfigError::InvalidValue("twitch.port", "0".to_string()));
            }
        }

        if self.discord.enabled {
            if self.discord.token.is_empty() {
                return Err(ConfigError::MissingValue("discord.token"));
            }
            if !self.discord.api_base.starts_with("http://")
                && !self.discord.api_base.starts_with("https://")
            {
                return Err(ConfigError::InvalidValue(
                    "discord.api_base",
                    self.discord.api_base.clone(),
                ));
            }
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Source(#[from] ::config::ConfigError),

    #[error("Missing required value: {0}")]
    MissingValue(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
