//! Error kinds surfaced by the synchronizer and its collaborators.
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("file is empty: {}", .0.display())]
    EmptyFile(PathBuf),
    #[error("frontmatter parse error: {0}")]
    Parse(String),
    #[error("frontmatter serialization error: {0}")]
    Serialize(String),
    #[error("remote resource not found: {0}")]
    NotFound(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("required field missing: {0}")]
    MissingField(String),
    #[error("create response carried no id")]
    MissingId,
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("prompt error: {0}")]
    Prompt(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Transport(format!("invalid JSON payload: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
