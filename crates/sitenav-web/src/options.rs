#![forbid(unsafe_code)]

//! Options accepted by `start()`.
//!
//! The JS object is the [`InteractionConfig`] JSON shape plus an optional
//! `log_level` (`"off"`, `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`).

use serde::Deserialize;
use sitenav_core::{ConfigError, InteractionConfig};
use tracing::level_filters::LevelFilter;

/// Default console verbosity.
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::WARN;

/// Error raised while decoding host options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    Config(ConfigError),
    UnknownLogLevel(String),
}

impl core::fmt::Display for OptionsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::UnknownLogLevel(level) => write!(f, "unknown log_level {level:?}"),
        }
    }
}

impl std::error::Error for OptionsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::UnknownLogLevel(_) => None,
        }
    }
}

impl From<ConfigError> for OptionsError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOptions {
    #[serde(flatten)]
    interaction: InteractionConfig,
    log_level: Option<String>,
}

/// Decoded and validated host options.
#[derive(Debug, Clone, PartialEq)]
pub struct WebOptions {
    pub interaction: InteractionConfig,
    pub log_level: LevelFilter,
}

impl Default for WebOptions {
    fn default() -> Self {
        Self {
            interaction: InteractionConfig::default(),
            log_level: DEFAULT_LOG_LEVEL,
        }
    }
}

impl WebOptions {
    pub fn from_json_str(json: &str) -> Result<Self, OptionsError> {
        let raw: RawOptions =
            serde_json::from_str(json).map_err(|err| OptionsError::Config(err.into()))?;
        raw.interaction.validate()?;
        let log_level = match raw.log_level.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_LOG_LEVEL,
            Some(level) => level
                .parse::<LevelFilter>()
                .map_err(|_| OptionsError::UnknownLogLevel(level.to_string()))?,
        };
        Ok(Self {
            interaction: raw.interaction,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_yields_defaults() {
        assert_eq!(WebOptions::from_json_str("{}").unwrap(), WebOptions::default());
    }

    #[test]
    fn log_level_and_config_share_one_object() {
        let options = WebOptions::from_json_str(
            r#"{"log_level":"debug","thresholds":{"mobile_breakpoint_px":1024}}"#,
        )
        .unwrap();
        assert_eq!(options.log_level, LevelFilter::DEBUG);
        assert_eq!(options.interaction.thresholds.mobile_breakpoint_px, 1024.0);
        assert_eq!(options.interaction.thresholds.scroll_threshold_px, 100.0);
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let err = WebOptions::from_json_str(r#"{"log_level":"loud"}"#).unwrap_err();
        assert_eq!(err, OptionsError::UnknownLogLevel("loud".to_string()));
        assert_eq!(err.to_string(), "unknown log_level \"loud\"");
    }

    #[test]
    fn invalid_config_surfaces_config_error() {
        let err =
            WebOptions::from_json_str(r#"{"thresholds":{"scroll_threshold_px":-5}}"#).unwrap_err();
        assert!(matches!(
            err,
            OptionsError::Config(ConfigError::InvalidDistance { .. })
        ));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let err = WebOptions::from_json_str("[1, 2").unwrap_err();
        assert!(matches!(err, OptionsError::Config(ConfigError::Decode(_))));
    }
}
