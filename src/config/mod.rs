pub mod schema;

pub use schema::{Config, ProviderConfig, ReliabilityConfig, VideoConfig};

use crate::error::ConfigError;
use std::path::PathBuf;

const CONFIG_ENV: &str = "SCENESMITH_CONFIG";

/// Platform config directory for this app.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "haru0416", "scenesmith")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Resolved path of the config file: `$SCENESMITH_CONFIG` (tilde-expanded)
/// when set, otherwise `<config dir>/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(from_env) = std::env::var(CONFIG_ENV) {
        let expanded = shellexpand::tilde(&from_env);
        return Some(PathBuf::from(expanded.as_ref()));
    }
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Default location of the persona store file.
pub fn personas_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("personas.toml"))
}

impl Config {
    /// Load from the resolved config path. A missing file yields defaults; a
    /// malformed or invalid file is an error.
    pub fn load() -> Result<Self, ConfigError> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn load_from_reads_and_validates() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[video]\npoll_interval_secs = 2").unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.video.poll_interval_secs, 2);
    }

    #[test]
    fn load_from_rejects_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[video]\npoll_interval_secs = 0").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn load_from_rejects_malformed_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not toml [").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }
}
