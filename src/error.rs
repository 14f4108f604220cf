// src/error.rs
use thiserror::Error;

use crate::table::row_model::RowId;

#[derive(Error, Debug)]
pub enum PropertyTableError {
    #[error("Unknown row: {0}")]
    UnknownRow(RowId),

    #[error("Property '{key}' already exists")]
    DuplicateProperty { key: String, hidden: bool },

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Unexpected response: {0}")]
    ResponseError(String),

    #[error("Backend returned {status}: {message}")]
    BackendError { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, PropertyTableError>;
