//! DispatcherConfig - dispatcher と event loop の設定
//!
//! TOML から読み込みます。全フィールドに default があるので、空ファイルでも有効です。
//!
//! ```toml
//! error_title = "Task error"
//! loop_thread_name = "handoff-owner"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_ERROR_TITLE: &str = "Task error";
pub const DEFAULT_LOOP_THREAD_NAME: &str = "handoff-owner";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatcherConfig {
    /// Title passed to the error reporter for every absorbed failure.
    pub error_title: String,

    /// Thread name used by `EventLoop::spawn` callers.
    pub loop_thread_name: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            error_title: DEFAULT_ERROR_TITLE.to_string(),
            loop_thread_name: DEFAULT_LOOP_THREAD_NAME.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl DispatcherConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Fail-fast checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.error_title.trim().is_empty() {
            return Err(ConfigError::Invalid("error_title must not be empty".into()));
        }
        if self.loop_thread_name.is_empty() || self.loop_thread_name.contains('\0') {
            return Err(ConfigError::Invalid(
                "loop_thread_name must be non-empty and contain no NUL bytes".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = DispatcherConfig::from_toml_str("").unwrap();
        assert_eq!(config, DispatcherConfig::default());
        assert_eq!(config.error_title, "Task error");
    }

    #[test]
    fn fields_can_be_overridden() {
        let config = DispatcherConfig::from_toml_str(
            r#"
            error_title = "Background job failed"
            loop_thread_name = "ui"
            "#,
        )
        .unwrap();
        assert_eq!(config.error_title, "Background job failed");
        assert_eq!(config.loop_thread_name, "ui");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = DispatcherConfig::from_toml_str("retries = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn blank_title_is_invalid() {
        let err = DispatcherConfig::from_toml_str("error_title = \"  \"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "loop_thread_name = \"from-file\"").unwrap();

        let config = DispatcherConfig::load(file.path()).unwrap();
        assert_eq!(config.loop_thread_name, "from-file");
        assert_eq!(config.error_title, DEFAULT_ERROR_TITLE);
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = DispatcherConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
