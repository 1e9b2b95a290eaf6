use quiz_persistence::DEFAULT_DATABASE_URL;
use quiz_types::{GameConfig, ScoringPolicy};
use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub game: GameConfig,
    pub leaderboard_size: usize,
    pub recent_games_limit: usize,
    pub session_idle_timeout_seconds: u64,
    pub admin_user_ids: Vec<String>,
    pub seed_default_questions: bool,
    pub auth_dev_mode: bool,
    pub jwt_secret: Option<String>,
}

/// Read `key`, falling back to `default` when unset or unparsable
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {} value '{}', using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

fn scoring_policy_from_env() -> ScoringPolicy {
    match env::var("SCORING_POLICY") {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "fixed" => ScoringPolicy::Fixed,
            "time-decayed" | "time_decayed" => ScoringPolicy::time_decayed(),
            other => {
                warn!("Unknown SCORING_POLICY '{}', using fixed scoring", other);
                ScoringPolicy::Fixed
            }
        },
        Err(_) => ScoringPolicy::Fixed,
    }
}

fn admin_ids_from_env() -> Vec<String> {
    env::var("ADMIN_USER_IDS")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn new() -> Self {
        let defaults = GameConfig::default();

        let mut game = GameConfig {
            max_wrong_guesses: env_or("MAX_WRONG_GUESSES", defaults.max_wrong_guesses),
            per_letter_reward: env_or("PER_LETTER_REWARD", defaults.per_letter_reward),
            completion_bonus: env_or("COMPLETION_BONUS", defaults.completion_bonus),
            time_limit_seconds: env_or("TIME_LIMIT_SECONDS", defaults.time_limit_seconds),
            scoring_policy: scoring_policy_from_env(),
        };
        if game.max_wrong_guesses == 0 {
            warn!("MAX_WRONG_GUESSES must be at least 1, using default");
            game.max_wrong_guesses = defaults.max_wrong_guesses;
        }

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_or("PORT", 8080),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            game,
            leaderboard_size: env_or("LEADERBOARD_SIZE", 10),
            recent_games_limit: env_or("RECENT_GAMES_LIMIT", 5),
            session_idle_timeout_seconds: env_or("SESSION_IDLE_TIMEOUT_SECONDS", 600),
            admin_user_ids: admin_ids_from_env(),
            seed_default_questions: env_or("SEED_DEFAULT_QUESTIONS", true),
            auth_dev_mode: env_or("AUTH_DEV_MODE", false),
            jwt_secret: env::var("AUTH_JWT_SECRET")
                .ok()
                .filter(|secret| !secret.trim().is_empty()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
