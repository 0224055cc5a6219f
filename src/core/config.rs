use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Minimal prompt used when the configured system-prompt asset is missing.
pub const FALLBACK_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Errors that can occur when loading configuration from disk.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the configuration file as valid TOML.
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read config at {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "Failed to parse config at {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

/// Host-tunable knobs for the session core.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Model identifier forwarded with every completion request.
    pub model: Option<String>,
    /// Path to a text asset holding the system prompt.
    pub system_prompt_path: Option<PathBuf>,
    /// Avatar reference attached to assistant display turns.
    pub assistant_avatar: Option<String>,
    /// Intro message seeded into both transcripts of a fresh session.
    pub intro_message: Option<String>,
    /// Root directory for persisted sessions; platform data dir when unset.
    pub sessions_dir: Option<PathBuf>,
    /// Bound, in seconds, on waiting for the next streamed fragment.
    pub stream_stall_timeout_secs: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Config, ConfigError> {
        Self::load_from_path(&Self::config_path())
    }

    pub fn load_from_path(config_path: &Path) -> Result<Config, ConfigError> {
        if !config_path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })
    }

    pub fn config_path() -> PathBuf {
        match ProjectDirs::from("org", "permacommons", "causerie") {
            Some(dirs) => dirs.config_dir().join("config.toml"),
            None => PathBuf::from("causerie.toml"),
        }
    }

    /// Root directory for the session store: the configured override, or the
    /// platform data directory.
    pub fn sessions_root(&self) -> PathBuf {
        self.sessions_dir
            .clone()
            .unwrap_or_else(crate::storage::store::SessionStore::default_root)
    }

    /// Resolve the system prompt, falling back to a fixed minimal prompt
    /// (with a warning for the host) when the asset cannot be read.
    pub fn system_prompt(&self) -> (String, Option<String>) {
        let Some(path) = &self.system_prompt_path else {
            return (FALLBACK_SYSTEM_PROMPT.to_string(), None);
        };
        match fs::read_to_string(path) {
            Ok(prompt) => (prompt, None),
            Err(err) => {
                let warning = format!(
                    "Prompt file missing; using a minimal fallback prompt. ({}: {err})",
                    path.display()
                );
                warn!(path = %path.display(), %err, "system prompt asset unreadable");
                (FALLBACK_SYSTEM_PROMPT.to_string(), Some(warning))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from_path(&dir.path().join("absent.toml")).unwrap();
        assert!(config.model.is_none());
        assert!(config.sessions_dir.is_none());
    }

    #[test]
    fn parses_partial_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "model = \"gpt-4.1-nano\"\nstream_stall_timeout_secs = 30\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.model.as_deref(), Some("gpt-4.1-nano"));
        assert_eq!(config.stream_stall_timeout_secs, Some(30));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "model = [broken").unwrap();

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn sessions_root_prefers_the_configured_directory() {
        let config = Config {
            sessions_dir: Some(PathBuf::from("/tmp/chats")),
            ..Default::default()
        };
        assert_eq!(config.sessions_root(), PathBuf::from("/tmp/chats"));
    }

    #[test]
    fn system_prompt_reads_the_asset() {
        let dir = tempdir().unwrap();
        let prompt_path = dir.path().join("prompt.txt");
        fs::write(&prompt_path, "You are a questionnaire guide.").unwrap();

        let config = Config {
            system_prompt_path: Some(prompt_path),
            ..Default::default()
        };
        let (prompt, warning) = config.system_prompt();
        assert_eq!(prompt, "You are a questionnaire guide.");
        assert!(warning.is_none());
    }

    #[test]
    fn missing_prompt_asset_falls_back_with_warning() {
        let config = Config {
            system_prompt_path: Some(PathBuf::from("/nonexistent/prompt.txt")),
            ..Default::default()
        };
        let (prompt, warning) = config.system_prompt();
        assert_eq!(prompt, FALLBACK_SYSTEM_PROMPT);
        assert!(warning.unwrap().contains("fallback"));
    }
}
