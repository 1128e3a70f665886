use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::errors::ConfigError;

/// Ambient configuration layer. The two CLI positionals (port, password)
/// always take precedence over whatever this document says; everything
/// here only fills in knobs the distilled protocol left unspecified.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub network: NetworkConfig,
    pub limits: LimitsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            network: NetworkConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub motd: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            name: "irc.local".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            motd: String::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NetworkConfig {
    pub bind_address: String,
    pub max_connections: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            bind_address: "0.0.0.0".to_string(),
            max_connections: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_channels_per_user: usize,
    pub max_message_length: usize,

    // Anti-flood / resource knobs.
    pub max_connections_per_ip: usize,

    /// Seconds an unregistered client is allowed to stay connected before
    /// it's disconnected. 0 disables the check entirely (infinite-timeout
    /// poll, matching the base protocol's literal behavior).
    pub unregistered_timeout: u64,

    pub max_channel_name_length: Option<usize>,
    pub max_topic_length: Option<usize>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            max_channels_per_user: 0,
            max_message_length: 512,
            max_connections_per_ip: 0,
            unregistered_timeout: 0,
            max_channel_name_length: None,
            max_topic_length: None,
        }
    }
}

impl Config {
    /// Loads and parses the TOML configuration file. Absence of the file
    /// at a path the caller explicitly asked for is a hard error; absence
    /// of `--config` entirely is handled by the caller choosing not to
    /// call this and using `Config::default()` instead.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_ref.display().to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path_ref.display().to_string(),
            source: Box::new(source),
        })?;
        Ok(config)
    }

    /// Channel name length cap, falling back to the RFC 2812 default.
    pub fn max_channel_name_length(&self) -> usize {
        self.limits.max_channel_name_length.unwrap_or(200)
    }

    /// Topic length cap, falling back to the RFC 2812 default.
    pub fn max_topic_length(&self) -> usize {
        self.limits.max_topic_length.unwrap_or(390)
    }
}
