//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of the human format
    pub log_json: bool,

    /// Author name shown on system messages
    pub server_name: String,
    /// Area names; clients spawn in the first one
    pub areas: Vec<String>,
    /// Clients presenting this key at connect time are moderators
    pub moderator_key: Option<String>,
    /// Fixed seed for reproducible minigame draws
    pub rng_seed: Option<u64>,

    pub hot_potato: HotPotatoConfig,
}

/// Minigame timings and thresholds
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HotPotatoConfig {
    pub opt_in_window: Duration,
    pub game_window: Duration,
    pub cooldown: Duration,
    pub min_participants: usize,
    pub punishment_duration: Duration,
}

impl Default for HotPotatoConfig {
    fn default() -> Self {
        Self {
            opt_in_window: Duration::from_secs(60),
            game_window: Duration::from_secs(5 * 60),
            cooldown: Duration::from_secs(5 * 60),
            min_participants: 2,
            punishment_duration: Duration::from_secs(10 * 60),
        }
    }
}

impl HotPotatoConfig {
    /// Reject settings the minigame cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_participants < 1 {
            return Err(ConfigError::TooFewParticipants);
        }
        Ok(())
    }
}

const DEFAULT_AREAS: &str = "Lobby,Courtroom 1,Courtroom 2,Basement";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        let defaults = HotPotatoConfig::default();
        let hot_potato = HotPotatoConfig {
            opt_in_window: secs_var("HOT_POTATO_OPT_IN_SECS", defaults.opt_in_window)?,
            game_window: secs_var("HOT_POTATO_GAME_SECS", defaults.game_window)?,
            cooldown: secs_var("HOT_POTATO_COOLDOWN_SECS", defaults.cooldown)?,
            min_participants: parsed_var("HOT_POTATO_MIN_PARTICIPANTS", defaults.min_participants)?,
            punishment_duration: secs_var("HOT_POTATO_PUNISHMENT_SECS", defaults.punishment_duration)?,
        };
        hot_potato.validate()?;

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_json: matches!(env::var("LOG_FORMAT").as_deref(), Ok("json")),

            server_name: env::var("SERVER_NAME").unwrap_or_else(|_| "Potato Server".to_string()),
            areas: parse_areas(&env::var("AREAS").unwrap_or_else(|_| DEFAULT_AREAS.to_string()))?,
            moderator_key: env::var("MODERATOR_KEY").ok().filter(|k| !k.is_empty()),
            rng_seed: env::var("RNG_SEED")
                .ok()
                .map(|v| v.parse().map_err(|_| ConfigError::InvalidNumber("RNG_SEED")))
                .transpose()?,

            hot_potato,
        })
    }
}

/// Split a comma-separated area list, dropping blanks
pub fn parse_areas(raw: &str) -> Result<Vec<String>, ConfigError> {
    let areas: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if areas.is_empty() {
        return Err(ConfigError::NoAreas);
    }
    Ok(areas)
}

fn parsed_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidNumber(name)),
        Err(_) => Ok(default),
    }
}

fn secs_var(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    parsed_var(name, default.as_secs()).map(Duration::from_secs)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Environment variable {0} must be a non-negative integer")]
    InvalidNumber(&'static str),

    #[error("AREAS must name at least one area")]
    NoAreas,

    #[error("HOT_POTATO_MIN_PARTICIPANTS must be at least 1")]
    TooFewParticipants,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hot_potato_defaults_match_rules() {
        let cfg = HotPotatoConfig::default();
        assert_eq!(cfg.opt_in_window, Duration::from_secs(60));
        assert_eq!(cfg.game_window, Duration::from_secs(300));
        assert_eq!(cfg.cooldown, Duration::from_secs(300));
        assert_eq!(cfg.min_participants, 2);
        assert_eq!(cfg.punishment_duration, Duration::from_secs(600));
    }

    #[test]
    fn zero_min_participants_is_rejected() {
        let cfg = HotPotatoConfig {
            min_participants: 0,
            ..HotPotatoConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::TooFewParticipants)));

        let cfg = HotPotatoConfig {
            min_participants: 1,
            ..HotPotatoConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn areas_are_trimmed_and_blanks_dropped() {
        let areas = parse_areas(" Lobby , ,Basement,").expect("valid list");
        assert_eq!(areas, vec!["Lobby".to_string(), "Basement".to_string()]);
    }

    #[test]
    fn empty_area_list_is_rejected() {
        assert!(matches!(parse_areas(" , "), Err(ConfigError::NoAreas)));
    }
}
