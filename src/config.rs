//! Credential lookup.
//!
//! Credentials are plain `KEY=value` pairs, normally read from a dotenv file.
//! The rest of the crate only relies on [`Config::get`], which fails when a key
//! is absent.

use crate::{Result, ScrobbleError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Key holding the Last.fm API key.
pub const LASTFM_KEY: &str = "LASTFM_KEY";
/// Key holding the Last.fm user whose history is collected.
pub const LASTFM_USER: &str = "LASTFM_USER";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    credentials: HashMap<String, String>,
}

impl Config {
    /// Load credentials from a dotenv file.
    ///
    /// The file is only read; the process environment is left untouched.
    pub fn from_dotenv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let entries = dotenvy::from_path_iter(path)
            .map_err(|e| ScrobbleError::Config(format!("{}: {e}", path.display())))?;

        let mut credentials = HashMap::new();
        for entry in entries {
            let (key, value) =
                entry.map_err(|e| ScrobbleError::Config(format!("{}: {e}", path.display())))?;
            credentials.insert(key, value);
        }

        log::debug!(
            "Loaded {} credentials from {}",
            credentials.len(),
            path.display()
        );
        Ok(Self { credentials })
    }

    /// Snapshot the process environment.
    pub fn from_env() -> Self {
        Self {
            credentials: std::env::vars().collect(),
        }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            credentials: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Default credentials file: `<config_dir>/scrobble-ingest/credentials.env`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("scrobble-ingest").join("credentials.env"))
    }

    /// Look up a credential by key name.
    pub fn get(&self, key: &str) -> Result<String> {
        self.credentials
            .get(key)
            .cloned()
            .ok_or_else(|| ScrobbleError::Config(format!("missing credential `{key}`")))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.credentials.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_read_credentials_from_dotenv() {
        let path = std::env::temp_dir().join(format!(
            "scrobble-ingest-config-{}.env",
            std::process::id()
        ));
        fs::write(&path, "FAKE_LASTFMKEY=fake_key\n# comment\nOTHER=\"quoted value\"\n").unwrap();

        let config = Config::from_dotenv(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.get("FAKE_LASTFMKEY").unwrap(), "fake_key");
        assert_eq!(config.get("OTHER").unwrap(), "quoted value");
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let config = Config::from_pairs([(LASTFM_KEY, "abc")]);

        assert!(config.contains(LASTFM_KEY));
        match config.get(LASTFM_USER) {
            Err(ScrobbleError::Config(msg)) => assert!(msg.contains("LASTFM_USER")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Config::from_dotenv("/definitely/not/here/credentials.env");
        assert!(matches!(result, Err(ScrobbleError::Config(_))));
    }
}
