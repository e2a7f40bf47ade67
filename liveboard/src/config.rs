//! Persisted configuration: a `key=value` file holding the API token and
//! the theme name. Read once at startup, rewritten when the user changes
//! theme. Malformed content is fatal at startup with a message naming the
//! offending line or key.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

const KEY_API_TOKEN: &str = "api_token";
const KEY_THEME: &str = "theme";
const DEFAULT_THEME: &str = "default";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("config line {line} is not `key=value`")]
    Malformed { line: usize },

    #[error("unknown config key `{key}` on line {line}")]
    UnknownKey { key: String, line: usize },

    #[error("missing required config key `{key}`")]
    MissingKey { key: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_token: String,
    pub theme: String,
}

/// Default config location: `~/.liveboard/config`.
pub fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".liveboard")
        .join("config")
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self, ConfigError> {
        let mut api_token = None;
        let mut theme = None;

        for (index, raw) in contents.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let (key, value) = trimmed
                .split_once('=')
                .ok_or(ConfigError::Malformed { line })?;
            let key = key.trim();
            let value = value.trim().to_owned();
            match key {
                KEY_API_TOKEN => api_token = Some(value),
                KEY_THEME => theme = Some(value),
                _ => {
                    return Err(ConfigError::UnknownKey {
                        key: key.to_owned(),
                        line,
                    })
                }
            }
        }

        Ok(Self {
            api_token: api_token.ok_or(ConfigError::MissingKey { key: KEY_API_TOKEN })?,
            theme: theme.unwrap_or_else(|| DEFAULT_THEME.to_owned()),
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_owned(),
            source,
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let mut out = String::new();
        let _ = writeln!(out, "{KEY_API_TOKEN}={}", self.api_token);
        let _ = writeln!(out, "{KEY_THEME}={}", self.theme);
        fs::write(path, out).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_and_theme() {
        let config = Config::parse("api_token=abc\ntheme=wood\n").unwrap();
        assert_eq!(config.api_token, "abc");
        assert_eq!(config.theme, "wood");
    }

    #[test]
    fn theme_defaults_and_comments_are_skipped() {
        let config = Config::parse("# credentials\napi_token = abc\n\n").unwrap();
        assert_eq!(config.theme, "default");
        assert_eq!(config.api_token, "abc");
    }

    #[test]
    fn missing_token_names_the_key() {
        let err = Config::parse("theme=wood\n").unwrap_err();
        assert!(err.to_string().contains("api_token"));
    }

    #[test]
    fn unknown_key_names_key_and_line() {
        let err = Config::parse("api_token=abc\ncolour=red\n").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("colour"));
        assert!(message.contains("line 2"));
    }

    #[test]
    fn malformed_line_is_rejected() {
        let err = Config::parse("api_token abc\n").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { line: 1 }));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        let config = Config {
            api_token: "tok".into(),
            theme: "wood".into(),
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }
}
