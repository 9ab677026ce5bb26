//! Configuration loader and validator for the article synchronizer.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::prompt::FieldProvider;

pub const ENV_SERVICE_URL: &str = "ARTICLE_SERVICE_URL";
pub const ENV_AUTH_KEY: &str = "ARTICLE_SERVER_AUTHKEY";
pub const ENV_LOCATION: &str = "ARTICLE_LOCATION";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub service: Service,
    pub articles: Articles,
}

/// Remote endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Service {
    pub url: String,
    pub auth_key: String,
    pub username: String,
    pub password: String,
}

impl Default for Service {
    fn default() -> Self {
        Self {
            url: "http://localhost:9000".into(),
            auth_key: String::new(),
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Local article tree settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Articles {
    pub location: String,
    pub recursive: bool,
    pub excluded: Vec<String>,
}

impl Default for Articles {
    fn default() -> Self {
        Self {
            location: "~/articles/".into(),
            recursive: false,
            excluded: [".git", ".svn", ".hg", ".DS_Store", ".idea", ".vscode"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub username: Option<String>,
    pub password: Option<String>,
    pub service_url: Option<String>,
    pub recursive: bool,
}

/// Fully resolved, immutable settings handed to the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub service_url: String,
    pub auth_key: String,
    pub username: String,
    pub password: String,
    pub article_location: PathBuf,
    pub recursive: bool,
    pub excluded: Vec<String>,
}

impl Settings {
    /// Resolve a `dataSource` value to a concrete path on disk.
    pub fn resolve_path(&self, data_source: &str) -> PathBuf {
        // Joining an absolute path replaces the base.
        self.article_location.join(data_source)
    }
}

impl Config {
    /// Overlay the environment variables the tool has always honoured.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty(ENV_SERVICE_URL) {
            self.service.url = url;
        }
        if let Some(key) = non_empty(ENV_AUTH_KEY) {
            self.service.auth_key = key;
        }
        if let Some(location) = non_empty(ENV_LOCATION) {
            self.articles.location = location;
        }
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(username) = &overrides.username {
            self.service.username = username.clone();
        }
        if let Some(password) = &overrides.password {
            self.service.password = password.clone();
        }
        if let Some(url) = &overrides.service_url {
            self.service.url = url.clone();
        }
        if overrides.recursive {
            self.articles.recursive = true;
        }
    }

    /// Collect any missing credentials once and freeze the result.
    pub fn resolve(self, fields: &dyn FieldProvider) -> crate::Result<Settings> {
        let Config { service, articles } = self;

        let username = if service.username.trim().is_empty() {
            fields.ask_string("Username", "", true)?
        } else {
            service.username
        };
        let password = if service.password.is_empty() {
            fields.ask_secret("Password", true)?
        } else {
            service.password
        };
        let service_url = if service.url.trim().is_empty() {
            fields.ask_string("Service Url", "", true)?
        } else {
            service.url
        };

        let settings = Settings {
            service_url: service_url.trim_end_matches('/').to_string(),
            auth_key: service.auth_key,
            username,
            password,
            article_location: expand_home(&articles.location),
            recursive: articles.recursive,
            excluded: articles.excluded,
        };
        validate(&settings)?;
        Ok(settings)
    }
}

/// Load configuration from a YAML file.
/// - If `path` is None, uses `config.yaml` in the current working directory.
/// - A missing file yields the defaults.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = serde_yaml::from_str(&content)?;
    Ok(cfg)
}

fn validate(settings: &Settings) -> Result<(), ConfigError> {
    if settings.auth_key.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "service.auth_key must be set (or ARTICLE_SERVER_AUTHKEY)",
        ));
    }
    if settings.service_url.trim().is_empty() {
        return Err(ConfigError::Invalid("service.url must be non-empty"));
    }
    if settings.username.trim().is_empty() {
        return Err(ConfigError::Invalid("service.username must be non-empty"));
    }
    Ok(())
}

fn expand_home(location: &str) -> PathBuf {
    if location == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    }
    match location.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(location),
    }
}

/// Example configuration file content.
pub fn example() -> &'static str {
    r#"service:
  url: "http://localhost:9000"
  auth_key: "YOUR_AUTH_KEY"
  username: "author"
  password: ""

articles:
  location: "~/articles/"
  recursive: false
  excluded:
    - ".git"
    - ".DS_Store"
"#
}
