use crate::notifier::DEFAULT_ENDPOINT;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, time::Duration};
use thiserror::Error;

/// The environment variable that overrides [`Config::endpoint`].
pub const ENDPOINT_ENV_VAR: &str = "PROGRESS_OVERLAY_ENDPOINT";

/// Errors that can occur while loading a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file couldn't be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file isn't valid JSON for a config.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The config parsed, but holds an unusable value.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for the overlay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The base URL host notifications are posted under.
    pub endpoint: String,

    /// How long a completed bar stays on screen before it's hidden.
    pub complete_hold_ms: u64,

    /// How long a cancelled bar stays on screen before it's hidden.
    pub cancel_hold_ms: u64,

    /// The animation frame period.
    pub frame_interval_ms: u64,

    /// The label shown while a cancelled bar is on screen.
    pub cancelled_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            complete_hold_ms: 1100,
            cancel_hold_ms: 900,
            frame_interval_ms: 16,
            cancelled_label: "Cancelled".to_string(),
        }
    }
}

impl Config {
    /// Parses a JSON config. Missing fields take their default values.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config from `path`, or the defaults if no path is given, then applies
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        if let Ok(endpoint) = env::var(ENDPOINT_ENV_VAR) {
            config.endpoint = endpoint;
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks that the config is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        surf::Url::parse(&self.endpoint)
            .map_err(|e| ConfigError::Invalid(format!("endpoint {:?}: {}", self.endpoint, e)))?;
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "frame_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// [`complete_hold_ms`](Self::complete_hold_ms) as a duration.
    pub fn complete_hold(&self) -> Duration {
        Duration::from_millis(self.complete_hold_ms)
    }

    /// [`cancel_hold_ms`](Self::cancel_hold_ms) as a duration.
    pub fn cancel_hold(&self) -> Duration {
        Duration::from_millis(self.cancel_hold_ms)
    }

    /// [`frame_interval_ms`](Self::frame_interval_ms) as a duration.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.complete_hold(), Duration::from_millis(1100));
        assert_eq!(config.cancel_hold(), Duration::from_millis(900));
        assert_eq!(config.endpoint, "https://progressbar");
        assert_eq!(config.cancelled_label, "Cancelled");
        config.validate().unwrap();
    }

    #[test]
    fn test_from_json_str() {
        let config = Config::from_json_str(indoc! {r#"
            {
                "endpoint": "http://127.0.0.1:8080/callbacks",
                "cancel_hold_ms": 400
            }
        "#})
        .unwrap();
        assert_eq!(
            config,
            Config {
                endpoint: "http://127.0.0.1:8080/callbacks".to_string(),
                cancel_hold_ms: 400,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(
            Config::from_json_str("{\"frame_interval_ms\": 0}"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_json_str("{\"endpoint\": \"not a url\"}"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_json_str("{\"cancel_hold_ms\": \"soon\"}"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load() {
        let path = env::temp_dir().join(format!("progress-overlay-{}.json", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        write!(file, "{{\"complete_hold_ms\": 250}}").unwrap();
        drop(file);

        let result = Config::load(Some(&path));
        fs::remove_file(&path).unwrap();
        assert_eq!(result.unwrap().complete_hold_ms, 250);

        assert!(matches!(
            Config::load(Some(Path::new("/nonexistent/progress-overlay.json"))),
            Err(ConfigError::Io(_))
        ));
    }
}
