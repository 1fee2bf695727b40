use std::{env, fmt::Display, net::SocketAddr, ops::RangeInclusive, str::FromStr, time::Duration};

use thiserror::Error;

use common::constants::{
    DEFAULT_GRACE_SECONDS, DEFAULT_ROUND_SECONDS, DRAWER_REWARD, GUESSER_REWARD,
    MAX_GRACE_SECONDS, MAX_PLAYERS, MAX_ROUND_SECONDS, MIN_PARTICIPANTS, NETCODE_MAX_CLIENTS,
};

use crate::words::WordList;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid IP or port: {0}")]
    InvalidAddress(String),
    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} must be between {min} and {max}, got {value}")]
    OutOfRange {
        key: &'static str,
        value: String,
        min: String,
        max: String,
    },
    #[error("WORDS must contain at least one non-blank word")]
    EmptyWordList,
}

/// Rules of a session. Shared by every room the server hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    pub round_secs: u32,
    pub grace_delay: Duration,
    pub guesser_reward: u32,
    pub drawer_reward: u32,
    pub min_participants: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            round_secs: DEFAULT_ROUND_SECONDS,
            grace_delay: Duration::from_secs(DEFAULT_GRACE_SECONDS),
            guesser_reward: GUESSER_REWARD,
            drawer_reward: DRAWER_REWARD,
            min_participants: MIN_PARTICIPANTS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: SocketAddr,
    pub max_clients: usize,
    pub game: GameSettings,
    pub words: WordList,
}

impl ServerConfig {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let ip = lookup("IP").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("PORT").unwrap_or_else(|| "5000".to_string());
        let address_string = format!("{}:{}", ip, port);
        let address = address_string
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(address_string))?;

        let defaults = GameSettings::default();
        let round_secs = number(
            &lookup,
            "ROUND_SECONDS",
            defaults.round_secs,
            1..=MAX_ROUND_SECONDS,
        )?;
        let grace_secs = number(
            &lookup,
            "GRACE_SECONDS",
            defaults.grace_delay.as_secs(),
            0..=MAX_GRACE_SECONDS,
        )?;
        let max_clients = number(&lookup, "MAX_PLAYERS", MAX_PLAYERS, 1..=NETCODE_MAX_CLIENTS)?;

        let words = match lookup("WORDS") {
            Some(list) => WordList::new(list.split(',')).ok_or(ConfigError::EmptyWordList)?,
            None => WordList::default(),
        };

        Ok(Self {
            address,
            max_clients,
            game: GameSettings {
                round_secs,
                grace_delay: Duration::from_secs(grace_secs),
                ..defaults
            },
            words,
        })
    }
}

fn number<T: FromStr + PartialOrd + Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError> {
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    let parsed: T = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            key,
            value: value.clone(),
        })?;

    if !range.contains(&parsed) {
        return Err(ConfigError::OutOfRange {
            key,
            value: parsed.to_string(),
            min: range.start().to_string(),
            max: range.end().to_string(),
        });
    }
    Ok(parsed)
}
