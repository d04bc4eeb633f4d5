//! Settings file loading and saving

use super::schema::Settings;
use crate::error::{Error, ErrorCode, Result, ResultExt};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Files searched, in order, when no path is given
pub const CONFIG_FILE_CANDIDATES: &[&str] = &[".ofeed-connector.toml", "ofeed-connector.toml"];

/// Settings together with the file they came from
#[derive(Debug, Clone)]
pub struct Config {
    /// Effective settings, environment overrides applied
    pub settings: Settings,
    /// File the settings were read from, if any
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load settings from a file path or use defaults
    ///
    /// An explicit path must exist. Without one, the working directory
    /// candidates and then the user config directory are searched; if
    /// nothing is found the defaults are used.
    ///
    /// # Errors
    ///
    /// Fails if an explicit path is missing, the file cannot be read or parsed,
    /// or an environment override holds an invalid value.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.exists() => return Err(Error::config_not_found(p)),
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(),
        };

        Self::from_path(config_path)
    }

    /// Like [`Config::load`], but a missing explicit path yields defaults
    /// and is remembered as the save target
    ///
    /// # Errors
    ///
    /// Fails if an existing file cannot be read or parsed.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(),
        };

        Self::from_path(config_path)
    }

    fn from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut settings = match config_path {
            Some(ref p) if p.exists() => load_config_file(p)?,
            _ => Settings::default(),
        };

        apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;

        debug!(path = ?config_path, "Settings loaded");

        Ok(Self {
            settings,
            path: config_path,
        })
    }

    /// Load with defaults only (no file, no environment)
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            settings: Settings::default(),
            path: None,
        }
    }

    /// Path that [`Config::save`] writes to
    #[must_use]
    pub fn target_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_config_path)
    }

    /// Write the settings as TOML, creating parent directories
    ///
    /// Returns the path written.
    ///
    /// # Errors
    ///
    /// Fails if the settings cannot be serialized or the file cannot be written.
    pub fn save(&mut self) -> Result<PathBuf> {
        let path = self.target_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(&self.settings)?;
        std::fs::write(&path, content)
            .map_err(Error::from)
            .context(format!("Writing {}", path.display()))
            .with_suggestion("Pass a writable location with --config")?;

        debug!(path = %path.display(), "Settings saved");
        self.path = Some(path.clone());
        Ok(path)
    }
}

/// Per-user settings file, `<config dir>/ofeed-connector/config.toml`
#[must_use]
pub fn default_config_path() -> PathBuf {
    dirs::config_dir().map_or_else(
        || PathBuf::from(CONFIG_FILE_CANDIDATES[0]),
        |dir| dir.join("ofeed-connector").join("config.toml"),
    )
}

/// Find a settings file in standard locations
fn find_config_file() -> Option<PathBuf> {
    CONFIG_FILE_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .chain(std::iter::once(default_config_path()))
        .find(|candidate| candidate.exists())
}

/// Load and parse a TOML settings file
fn load_config_file(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::new(
            ErrorCode::ConfigError,
            format!("Failed to read config file {}: {e}", path.display()),
        )
        .with_source(e)
    })?;

    toml::from_str(&content)
        .map_err(Error::from)
        .context(format!("Parsing {}", path.display()))
}

/// Apply environment overrides on top of file settings
///
/// Recognised variables: `OFEED_SERVER`, `OFEED_EVENT_ID`, `OFEED_EVENT_PASSWORD`,
/// `SIDROID_PORT`, `OFEED_UPLOAD_INTERVAL_SECS`.
pub(crate) fn apply_env_overrides<F>(settings: &mut Settings, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(server) = lookup("OFEED_SERVER") {
        settings.ofeed.server = server;
    }
    if let Some(id) = lookup("OFEED_EVENT_ID") {
        settings.ofeed.event_id = id;
    }
    if let Some(password) = lookup("OFEED_EVENT_PASSWORD") {
        settings.ofeed.event_password = password;
    }
    if let Some(port) = lookup("SIDROID_PORT") {
        settings.sidroid.port = parse_number("SIDROID_PORT", &port)?;
    }
    if let Some(interval) = lookup("OFEED_UPLOAD_INTERVAL_SECS") {
        settings.upload.interval_secs = parse_number("OFEED_UPLOAD_INTERVAL_SECS", &interval)?;
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(var: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        Error::new(
            ErrorCode::InvalidConfigValue,
            format!("{var} must be a number, got '{value}'"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_defaults() {
        let config = Config::defaults();
        assert!(config.path.is_none());
        assert_eq!(config.settings.sidroid.port, 8080);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigNotFound);
    }

    #[test]
    fn test_load_or_default_remembers_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.toml");
        let config = Config::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.target_path(), path);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let mut config = Config::load_or_default(Some(&path)).unwrap();
        config.settings.ofeed.event_id = "1234".to_string();
        config.settings.upload.interval_secs = 45;
        let written = config.save().unwrap();
        assert_eq!(written, path);

        let content = std::fs::read_to_string(&path).unwrap();
        let reloaded: Settings = toml::from_str(&content).unwrap();
        assert_eq!(reloaded.ofeed.event_id, "1234");
        assert_eq!(reloaded.upload.interval_secs, 45);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[sidroid\nport = ").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("OFEED_EVENT_ID", "99"),
            ("OFEED_EVENT_PASSWORD", "pw"),
            ("SIDROID_PORT", "9090"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, |k| env.get(k).map(ToString::to_string)).unwrap();

        assert_eq!(settings.ofeed.event_id, "99");
        assert_eq!(settings.ofeed.event_password, "pw");
        assert_eq!(settings.sidroid.port, 9090);
        assert_eq!(settings.upload.interval_secs, 30);
    }

    #[test]
    fn test_env_override_rejects_bad_number() {
        let mut settings = Settings::default();
        let err = apply_env_overrides(&mut settings, |k| {
            (k == "SIDROID_PORT").then(|| "eighty".to_string())
        })
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfigValue);
    }
}
