use crate::retrieval::{RetrievalOptions, DEFAULT_REQUEST_TIMEOUT};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5000";
pub const DEFAULT_CORPUS_FILE: &str = "NASB.json";

const SERVICE_URL_ENV: &str = "STUDYBIBLE_SERVICE_URL";
const CORPUS_ENV: &str = "STUDYBIBLE_CORPUS";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub service_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub cancel_superseded: Option<bool>,
    pub corpus_path: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config {:?}: {}", path, e))?;
        Ok(config)
    }

    /// Environment first, then the config file, then the default.
    pub fn service_url(&self) -> String {
        pick(std::env::var(SERVICE_URL_ENV).ok(), self.service_url.clone())
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        match self.request_timeout_secs {
            Some(0) | None => DEFAULT_REQUEST_TIMEOUT,
            Some(secs) => Duration::from_secs(secs),
        }
    }

    pub fn retrieval_options(&self) -> RetrievalOptions {
        RetrievalOptions {
            timeout: self.request_timeout(),
            cancel_superseded: self.cancel_superseded.unwrap_or(true),
        }
    }

    /// Where to read the corpus from: environment, config file, then
    /// `NASB.json` in the working directory, then the data directory.
    pub fn corpus_path(&self) -> PathBuf {
        let configured = pick(
            std::env::var(CORPUS_ENV).ok().map(PathBuf::from),
            self.corpus_path.clone(),
        );
        if let Some(path) = configured {
            return path;
        }

        let local = PathBuf::from(DEFAULT_CORPUS_FILE);
        if local.exists() {
            return local;
        }

        dirs::data_dir()
            .map(|p| p.join("studybible").join(DEFAULT_CORPUS_FILE))
            .filter(|p| p.exists())
            .unwrap_or(local)
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("studybible").join("config.json"))
    }
}

fn pick<T>(env: Option<T>, configured: Option<T>) -> Option<T> {
    env.or(configured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
        assert!(config.retrieval_options().cancel_superseded);
    }

    #[test]
    fn test_load_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config {
            service_url: Some("http://search.local:8080".into()),
            request_timeout_secs: Some(3),
            cancel_superseded: Some(false),
            corpus_path: Some(PathBuf::from("/srv/bible.json")),
        };
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        let options = loaded.retrieval_options();
        assert_eq!(options.timeout, Duration::from_secs(3));
        assert!(!options.cancel_superseded);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "request_timeout_secs": 0 }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.service_url, None);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_environment_wins_over_config() {
        assert_eq!(pick(Some("env"), Some("file")), Some("env"));
        assert_eq!(pick(None, Some("file")), Some("file"));
        assert_eq!(pick::<&str>(None, None), None);
    }
}
