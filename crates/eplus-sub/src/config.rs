//! Runner configuration loaded from TOML

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SubError};
use crate::path::expand;

/// Environment variable overriding [`Config::executable`]
pub const EXEC_ENV: &str = "EPLUS_EXEC";

/// Default simulation binary
pub const EPLUS_EXEC: &str = "energyplus";

/// Default output prefix; results land in `<prefix>out.csv`
pub const DEFAULT_OUTPUT_PREFIX: &str = "eplus";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Simulation binary name or path
    pub executable: String,
    /// Value of the `-p` flag
    pub output_prefix: String,
    /// Parent directory of per-run simulation directories
    pub tmp_dir_prefix: PathBuf,
    /// Parent directory of generated input files
    pub workspace_dir: PathBuf,
    /// Fail runs whose process exits non-zero
    pub check_exit_status: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            executable: EPLUS_EXEC.to_string(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            tmp_dir_prefix: PathBuf::from("/tmp"),
            workspace_dir: PathBuf::from("~"),
            check_exit_status: true,
        }
    }
}

impl Config {
    /// `<config_dir>/eplus-sub/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("eplus-sub").join("config.toml"))
    }

    /// Load from `path`, or from [`Config::default_path`] when `None`.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    /// `EPLUS_EXEC` is applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_path(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_path(&default)?,
                _ => {
                    debug!("No config file, using defaults");
                    Self::default()
                }
            },
        };

        let config = config.with_executable_override(std::env::var(EXEC_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = expand(path);
        let content = std::fs::read_to_string(&path).map_err(|e| SubError::io(&path, e))?;
        debug!(path = %path.display(), "Loaded config");
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| SubError::Parse(format!("config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_executable_override(mut self, executable: Option<String>) -> Self {
        if let Some(exe) = executable.filter(|e| !e.trim().is_empty()) {
            self.executable = exe;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.executable.trim().is_empty() {
            return Err(SubError::Config("executable cannot be empty".into()));
        }
        if self.output_prefix.trim().is_empty() {
            return Err(SubError::Config("output_prefix cannot be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.executable, "energyplus");
        assert!(config.check_exit_status);
    }

    #[test]
    fn test_partial_file() {
        let config = Config::from_toml_str(
            r#"
            executable = "/usr/local/EnergyPlus-9-4-0/energyplus"
            check_exit_status = false
            "#,
        )
        .unwrap();

        assert_eq!(config.executable, "/usr/local/EnergyPlus-9-4-0/energyplus");
        assert!(!config.check_exit_status);
        assert_eq!(config.output_prefix, "eplus");
    }

    #[test]
    fn test_rejects_empty_values() {
        assert!(matches!(
            Config::from_toml_str(r#"executable = """#),
            Err(SubError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str(r#"output_prefix = " ""#),
            Err(SubError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str("executable = 3"),
            Err(SubError::Parse(_))
        ));
    }

    #[test]
    fn test_executable_override() {
        let config = Config::default().with_executable_override(Some("/opt/ep/energyplus".into()));
        assert_eq!(config.executable, "/opt/ep/energyplus");

        let config = Config::default().with_executable_override(Some("  ".into()));
        assert_eq!(config.executable, "energyplus");
    }

    #[test]
    fn test_explicit_missing_file_errors() {
        let err = Config::load(Some(Path::new("/nonexistent/eplus-sub.toml"))).unwrap_err();
        assert!(matches!(err, SubError::Io { .. }));
    }
}
