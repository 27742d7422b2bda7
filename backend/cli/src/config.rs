use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use cmdbot_commands::EngineOptions;
use cmdbot_core::UserId;

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "cmdbot.toml";

/// cmdbot runtime configuration.
///
/// Sources are layered: built-in defaults, then the TOML file, then
/// `CMDBOT_*` environment variables, then command-line flags.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Command prefix. Empty means unprefixed.
    pub prefix: String,
    pub mention_as_prefix: bool,
    pub case_insensitive: bool,
    pub typo_checking: bool,
    pub min_similarity: f64,
    pub owner_id: Option<u64>,
    /// Command manifest path; the bundled manifest is used when unset.
    pub manifest: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub log_level: String,

    // Console identity
    pub bot_id: u64,
    pub author_id: u64,
    pub author_name: String,
    /// Simulated guild; `None` makes every line a direct message.
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    /// Permissions granted to the console author inside the guild.
    pub permissions: Vec<String>,
    /// Print outgoing actions as JSON lines.
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            mention_as_prefix: true,
            case_insensitive: false,
            typo_checking: true,
            min_similarity: cmdbot_commands::typo::MIN_SIMILARITY,
            owner_id: None,
            manifest: None,
            log_dir: None,
            log_level: "info".to_string(),
            bot_id: 1000,
            author_id: 1,
            author_name: "console".to_string(),
            guild_id: None,
            channel_id: 1,
            permissions: Vec::new(),
            json: false,
        }
    }
}

/// Resolve the cmdbot config directory.
/// Priority: `CMDBOT_CONFIG_DIR` env > `~/.cmdbot/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CMDBOT_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".cmdbot"),
        None => PathBuf::from(".cmdbot"),
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid value for {name}: {raw:?}"))
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("Invalid value for {name}: {raw:?}"),
    }
}

impl Config {
    /// Load the layered configuration, minus command-line flags.
    ///
    /// An explicit `path` must exist; the default one is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = config_dir().join(CONFIG_FILE_NAME);
                if default.exists() {
                    Self::from_file(&default)?
                } else {
                    debug!(path = %default.display(), "Config file does not exist; using defaults");
                    Self::default()
                }
            }
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Failed to parse config TOML at: {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Override fields from `CMDBOT_*` variables (and `RUST_LOG`).
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = var("CMDBOT_PREFIX") {
            self.prefix = v;
        }
        if let Some(v) = var("CMDBOT_MENTION_PREFIX") {
            self.mention_as_prefix = parse_flag("CMDBOT_MENTION_PREFIX", &v)?;
        }
        if let Some(v) = var("CMDBOT_CASE_INSENSITIVE") {
            self.case_insensitive = parse_flag("CMDBOT_CASE_INSENSITIVE", &v)?;
        }
        if let Some(v) = var("CMDBOT_TYPO_CHECK") {
            self.typo_checking = parse_flag("CMDBOT_TYPO_CHECK", &v)?;
        }
        if let Some(v) = var("CMDBOT_OWNER_ID") {
            self.owner_id = Some(parse_env("CMDBOT_OWNER_ID", &v)?);
        }
        if let Some(v) = var("CMDBOT_MANIFEST") {
            self.manifest = Some(PathBuf::from(v));
        }
        if let Some(v) = var("CMDBOT_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = var("RUST_LOG") {
            self.log_level = v;
        }
        if let Some(v) = var("CMDBOT_AUTHOR_ID") {
            self.author_id = parse_env("CMDBOT_AUTHOR_ID", &v)?;
        }
        if let Some(v) = var("CMDBOT_GUILD_ID") {
            self.guild_id = Some(parse_env("CMDBOT_GUILD_ID", &v)?);
        }
        Ok(())
    }

    pub fn engine_options(&self) -> EngineOptions {
        let prefix = Some(self.prefix.trim().to_string()).filter(|p| !p.is_empty());
        EngineOptions {
            prefix,
            mention_as_prefix: self.mention_as_prefix,
            case_insensitive: self.case_insensitive,
            owner_id: self.owner_id.map(UserId),
            typo_checking: self.typo_checking,
            min_similarity: self.min_similarity,
            ..EngineOptions::default()
        }
    }
}
