use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mailbox error: {0}")]
    Email(#[from] crate::email::EmailError),

    #[error("Cloud resolver error: {0}")]
    Cloud(#[from] crate::cloud::CloudError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),

    #[error("Another sync is already running (lock file '{0}' exists)")]
    AlreadyRunning(PathBuf),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to store file under unsafe name '{0}'")]
    InvalidName(String),
}

pub type Result<T> = std::result::Result<T, IntakeError>;
