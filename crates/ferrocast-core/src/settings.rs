//! Run settings, read from an optional JSON file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::CachePolicy;
use crate::loader::default_start_date;
use crate::model::ModelConfig;
use crate::sweep::{default_flexibility_sweep, validate_sweep, SweepConfig};
use crate::{CalendarDate, ValidationError};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// First day of history requested from the source.
    pub start_date: CalendarDate,
    /// Cache lifetime in seconds; absent keeps entries for the process
    /// lifetime, `0` disables caching.
    pub cache_ttl_secs: Option<u64>,
    /// Configuration of the main forecast.
    pub model: ModelConfig,
    pub sweep: Vec<SweepConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            cache_ttl_secs: None,
            model: ModelConfig::default().with_uncertainty_width(0.95),
            sweep: default_flexibility_sweep(),
        }
    }
}

impl Settings {
    /// Defaults when `path` is `None`, otherwise the file's contents with
    /// missing fields defaulted.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::parse(&raw, path)?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn from_json(raw: &str) -> Result<Self, SettingsError> {
        Self::parse(raw, Path::new("<inline>"))
    }

    fn parse(raw: &str, path: &Path) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.model.validate()?;
        validate_sweep(&self.sweep)
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy::from_ttl_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_path_yields_defaults() {
        let settings = Settings::load(None).expect("defaults");
        assert_eq!(settings.start_date.to_string(), "2015-01-01");
        assert_eq!(settings.model.uncertainty_width, 0.95);
        assert_eq!(settings.sweep.len(), 2);
        assert_eq!(settings.cache_policy(), CachePolicy::KeepForever);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"start_date": "2020-06-01", "cache_ttl_secs": 0, "model": {{"seed": 7}}}}"#
        )
        .expect("write");

        let settings = Settings::load(Some(file.path())).expect("loads");
        assert_eq!(settings.start_date.to_string(), "2020-06-01");
        assert_eq!(settings.cache_policy(), CachePolicy::Disabled);
        assert_eq!(settings.model.seed, 7);
        assert_eq!(settings.model.trend_flexibility, 0.05);
    }

    #[test]
    fn rejects_duplicate_sweep_labels() {
        let raw = r#"{"sweep": [
            {"label": "a", "config": {}},
            {"label": "a", "config": {"trend_flexibility": 0.5}}
        ]}"#;
        assert!(matches!(
            Settings::from_json(raw),
            Err(SettingsError::Invalid(ValidationError::DuplicateSweepLabel { .. }))
        ));
    }
}
