//! Client configuration loaded from the environment

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::types::DEFAULT_GAME_TYPE;

const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_TOKEN_FILE: &str = ".banana-brain/token";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Unknown wrong-answer policy '{0}', expected 'terminate' or 'reset-streak'")]
    UnknownPolicy(String),
}

/// What a wrong answer does to the round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IncorrectAnswerPolicy {
    /// Wrong answer ends the round immediately
    #[default]
    Terminate,
    /// Wrong answer resets the streak; play continues with a new puzzle
    ResetStreak,
}

impl FromStr for IncorrectAnswerPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "terminate" => Ok(Self::Terminate),
            "reset-streak" | "reset_streak" => Ok(Self::ResetStreak),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Knobs for the round controller
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub on_incorrect: IncorrectAnswerPolicy,
    /// Pause between a correct answer and the next puzzle fetch
    pub next_puzzle_delay: Duration,
    /// Period of the countdown ticker. `None` leaves ticking to the caller.
    pub tick_interval: Option<Duration>,
    pub game_type: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            on_incorrect: IncorrectAnswerPolicy::Terminate,
            next_puzzle_delay: Duration::from_millis(500),
            tick_interval: Some(Duration::from_secs(1)),
            game_type: DEFAULT_GAME_TYPE.to_string(),
        }
    }
}

impl GameConfig {
    /// Config for driving the controller by hand (no ticker, no delays)
    pub fn manual() -> Self {
        Self {
            next_puzzle_delay: Duration::ZERO,
            tick_interval: None,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub token_file: PathBuf,
    pub game: GameConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            game: GameConfig::default(),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parsed_env<T: FromStr>(key: &str) -> Option<T> {
    let raw = non_empty_env(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
            None
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let on_incorrect = match non_empty_env("BANANA_ON_INCORRECT") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{}; using 'terminate'", e);
                IncorrectAnswerPolicy::Terminate
            }),
            None => IncorrectAnswerPolicy::Terminate,
        };

        Self {
            api_base_url: non_empty_env("BANANA_API_URL").unwrap_or(defaults.api_base_url),
            request_timeout: parsed_env("BANANA_HTTP_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            token_file: non_empty_env("BANANA_TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.token_file),
            game: GameConfig {
                on_incorrect,
                next_puzzle_delay: parsed_env("BANANA_NEXT_PUZZLE_DELAY_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.game.next_puzzle_delay),
                tick_interval: defaults.game.tick_interval,
                game_type: non_empty_env("BANANA_GAME_TYPE").unwrap_or(defaults.game.game_type),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "BANANA_API_URL",
        "BANANA_HTTP_TIMEOUT",
        "BANANA_TOKEN_FILE",
        "BANANA_ON_INCORRECT",
        "BANANA_NEXT_PUZZLE_DELAY_MS",
        "BANANA_GAME_TYPE",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:5000/api");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.game.on_incorrect, IncorrectAnswerPolicy::Terminate);
        assert_eq!(config.game.tick_interval, Some(Duration::from_secs(1)));
        assert_eq!(config.game.game_type, "mixed");
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "terminate".parse::<IncorrectAnswerPolicy>(),
            Ok(IncorrectAnswerPolicy::Terminate)
        );
        assert_eq!(
            " Reset-Streak ".parse::<IncorrectAnswerPolicy>(),
            Ok(IncorrectAnswerPolicy::ResetStreak)
        );
        assert_eq!(
            "forgive".parse::<IncorrectAnswerPolicy>(),
            Err(ConfigError::UnknownPolicy("forgive".to_string()))
        );
    }

    #[test]
    #[serial]
    fn test_from_env_reads_overrides() {
        clear_env();
        std::env::set_var("BANANA_API_URL", "https://brain.example/api");
        std::env::set_var("BANANA_HTTP_TIMEOUT", "3");
        std::env::set_var("BANANA_ON_INCORRECT", "reset-streak");
        std::env::set_var("BANANA_NEXT_PUZZLE_DELAY_MS", "0");
        std::env::set_var("BANANA_TOKEN_FILE", "/tmp/banana-token");

        let config = ClientConfig::from_env();
        assert_eq!(config.api_base_url, "https://brain.example/api");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.game.on_incorrect, IncorrectAnswerPolicy::ResetStreak);
        assert_eq!(config.game.next_puzzle_delay, Duration::ZERO);
        assert_eq!(config.token_file, PathBuf::from("/tmp/banana-token"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_falls_back_on_blank_or_invalid() {
        clear_env();
        std::env::set_var("BANANA_API_URL", "   ");
        std::env::set_var("BANANA_HTTP_TIMEOUT", "soon");
        std::env::set_var("BANANA_ON_INCORRECT", "forgive");

        let config = ClientConfig::from_env();
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.game.on_incorrect, IncorrectAnswerPolicy::Terminate);

        clear_env();
    }
}
