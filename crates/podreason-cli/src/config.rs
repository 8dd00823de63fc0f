use anyhow::{Context, Result};
use podreason_core::DiagnosisConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::Level;

/// Environment variable naming the configuration file when `--config` is absent
pub const CONFIG_ENV: &str = "PODREASON_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodreasonConfig {
    /// Maximum level written to stderr (`trace`, `debug`, `info`, `warn`, `error`)
    pub log_level: String,
    pub diagnosis: DiagnosisConfig,
}

impl Default for PodreasonConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            diagnosis: DiagnosisConfig::default(),
        }
    }
}

impl PodreasonConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn resolve_config(cli_config: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(config_path) = cli_config {
            Self::load_from_file(config_path)?
        } else if let Ok(env_config) = std::env::var(CONFIG_ENV) {
            Self::load_from_file(env_config)?
        } else {
            Self::default()
        };

        // Environment deadline overrides the file
        config.diagnosis = config.diagnosis.with_env_overrides();
        Ok(config)
    }

    /// Unknown levels fall back to `info`
    pub fn max_level(&self) -> Level {
        Level::from_str(self.log_level.trim()).unwrap_or(Level::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
log_level = "debug"

[diagnosis]
deadline_ms = 5000

[diagnosis.owners]
image = "registry-oncall"
"#
        )
        .unwrap();

        let config = PodreasonConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.max_level(), Level::DEBUG);
        assert_eq!(config.diagnosis.deadline(), Duration::from_secs(5));
        assert_eq!(config.diagnosis.owner_for("image"), "registry-oncall");
        assert_eq!(config.diagnosis.owner_for("volume"), "storage");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[diagnosis.actions]\nfinalizer = \"page the operator team\"").unwrap();

        let config = PodreasonConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.diagnosis.deadline(), Duration::from_secs(20));
        assert_eq!(config.diagnosis.action_for("finalizer"), "page the operator team");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[diagnosis]\ndeadline_ms = \"soon\"").unwrap();
        assert!(PodreasonConfig::load_from_file(file.path()).is_err());
        assert!(PodreasonConfig::load_from_file("/nonexistent/podreason.toml").is_err());
    }

    #[test]
    fn test_unknown_log_level() {
        let config = PodreasonConfig { log_level: "chatty".into(), ..Default::default() };
        assert_eq!(config.max_level(), Level::INFO);
    }
}
