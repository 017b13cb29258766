use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const DISCORD_TOKEN: &str = "DISCORD_TOKEN";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const COMMAND_PREFIX: &str = "GAMELINK_COMMAND_PREFIX";
    pub const SEARCH_LIMIT: &str = "GAMELINK_SEARCH_LIMIT";
    /// Log file mirroring stdout; set to an empty value to disable
    pub const LOG_FILE: &str = "GAMELINK_LOG_FILE";
    // Steam
    pub const STEAM_API_KEY: &str = "STEAM_API_KEY";
    pub const STEAM_API_URL: &str = "STEAM_API_URL";
    pub const STEAM_STORE_URL: &str = "STEAM_STORE_URL";
    pub const STEAM_STORE_COUNTRY: &str = "STEAM_STORE_COUNTRY";
    pub const STEAM_STORE_LANGUAGE: &str = "STEAM_STORE_LANGUAGE";
    pub const STEAM_HTTP_TIMEOUT_SECS: &str = "STEAM_HTTP_TIMEOUT_SECS";
}

/// Default values
pub mod defaults {
    pub const DATABASE_URL: &str = "./.db/gamelink.db";
    pub const COMMAND_PREFIX: &str = "!";
    pub const SEARCH_LIMIT: usize = 5;
    pub const LOG_FILE: &str = "bot.log";
    pub const STEAM_API_URL: &str = "https://api.steampowered.com";
    pub const STEAM_STORE_URL: &str = "https://store.steampowered.com";
    pub const STEAM_STORE_COUNTRY: &str = "US";
    pub const STEAM_STORE_LANGUAGE: &str = "english";
    pub const STEAM_HTTP_TIMEOUT_SECS: u64 = 10;
}

/// Settings for the Steam Web API / Store client
#[derive(Clone, Debug)]
pub struct SteamConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub store_base_url: String,
    /// Store region (`cc`)
    pub country: String,
    /// Store language (`l`)
    pub language: String,
    pub timeout_secs: u64,
}

impl SteamConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var(env_vars::STEAM_API_KEY).unwrap_or_default(),
            api_base_url: env::var(env_vars::STEAM_API_URL)
                .unwrap_or_else(|_| defaults::STEAM_API_URL.to_string()),
            store_base_url: env::var(env_vars::STEAM_STORE_URL)
                .unwrap_or_else(|_| defaults::STEAM_STORE_URL.to_string()),
            country: env::var(env_vars::STEAM_STORE_COUNTRY)
                .unwrap_or_else(|_| defaults::STEAM_STORE_COUNTRY.to_string()),
            language: env::var(env_vars::STEAM_STORE_LANGUAGE)
                .unwrap_or_else(|_| defaults::STEAM_STORE_LANGUAGE.to_string()),
            timeout_secs: parse_or(env_vars::STEAM_HTTP_TIMEOUT_SECS, defaults::STEAM_HTTP_TIMEOUT_SECS),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub discord_token: Option<String>,
    pub database_url: String,
    pub command_prefix: String,
    /// Max results kept from a store search
    pub search_limit: usize,
    pub steam: SteamConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let command_prefix = env::var(env_vars::COMMAND_PREFIX)
            .ok()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| defaults::COMMAND_PREFIX.to_string());

        Self {
            discord_token: env::var(env_vars::DISCORD_TOKEN)
                .ok()
                .filter(|t| !t.trim().is_empty()),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            command_prefix,
            search_limit: parse_or(env_vars::SEARCH_LIMIT, defaults::SEARCH_LIMIT).max(1),
            steam: SteamConfig::from_env(),
        }
    }
}

/// Log file path, read on its own so logging can start before `Config`.
pub fn log_file_from_env() -> Option<String> {
    log_file_setting(env::var(env_vars::LOG_FILE).ok())
}

fn log_file_setting(raw: Option<String>) -> Option<String> {
    match raw {
        None => Some(defaults::LOG_FILE.to_string()),
        Some(path) => Some(path.trim().to_string()).filter(|p| !p.is_empty()),
    }
}

fn parse_or<T: std::str::FromStr>(var: &str, default: T) -> T {
    match env::var(var) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("{} has an invalid value '{}', using the default", var, raw);
            default
        }),
        Err(_) => default,
    }
}
