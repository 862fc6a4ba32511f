//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::onboarding::model::settings_keys;

/// Onboarding controller configuration.
#[derive(Debug, Clone)]
pub struct OnboardingConfig {
    /// Delay between marking a step complete and the automatic advance.
    pub advance_delay: Duration,
    /// If true, any manual transition cancels a pending auto-advance.
    pub cancel_advance_on_navigation: bool,
    /// Name of the entry-location query parameter carrying a step number.
    pub step_param: String,
    /// Store key for the answers record.
    pub answers_key: String,
    /// Store key for the completed-steps record.
    pub completed_key: String,
    /// Where the primary completion action hands off to.
    pub exit_destination: String,
    /// Where "Back to Home" hands off to.
    pub home_destination: String,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            advance_delay: Duration::from_millis(1000),
            cancel_advance_on_navigation: false,
            step_param: "step".to_string(),
            answers_key: settings_keys::ANSWERS.to_string(),
            completed_key: settings_keys::COMPLETED_STEPS.to_string(),
            exit_destination: "/dashboard".to_string(),
            home_destination: "/".to_string(),
        }
    }
}

/// Server binary configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: PathBuf,
    /// Settings-table scope for the persisted records.
    pub user_id: String,
    /// Optional entry location applied on startup, e.g. `/onboarding?step=4`.
    pub entry_url: Option<String>,
    pub onboarding: OnboardingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            db_path: PathBuf::from("./data/onboarding.db"),
            user_id: settings_keys::DEFAULT_USER.to_string(),
            entry_url: None,
            onboarding: OnboardingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup. Unset variables keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = parse_var::<u16>(&lookup, "ONBOARDING_PORT")? {
            config.port = port;
        }
        if let Some(path) = lookup("ONBOARDING_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(user) = lookup("ONBOARDING_USER") {
            if user.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "ONBOARDING_USER".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            config.user_id = user;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "ONBOARDING_ADVANCE_DELAY_MS")? {
            config.onboarding.advance_delay = Duration::from_millis(ms);
        }
        if let Some(cancel) = parse_var::<bool>(&lookup, "ONBOARDING_CANCEL_ON_NAVIGATION")? {
            config.onboarding.cancel_advance_on_navigation = cancel;
        }
        config.entry_url = lookup("ONBOARDING_ENTRY_URL").filter(|s| !s.trim().is_empty());

        Ok(config)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            }),
    }
}
