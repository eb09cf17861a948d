//! Error types for the configuration registry

use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration registry errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config type already registered: {type_name}")]
    DuplicateTypeRegistration { type_name: String },

    #[error("Duplicate config id {id} while building table for {type_name}")]
    DuplicateIdInBatch { type_name: String, id: i32 },

    #[error("Config type not registered: {type_name}")]
    ConfigTypeNotRegistered { type_name: String },

    #[error("No config with id {id} for type {type_name}")]
    ConfigIdNotFound { type_name: String, id: i32 },

    #[error(
        "The config table for {type_name} is not a singleton table. \
         Use `get` with an id or `get_all` instead"
    )]
    NotSingletonConfig { type_name: String },

    #[error(
        "Config type {type_tag} cannot be represented in the envelope. \
         Register a codec binding for it or declare it excluded"
    )]
    UnserializableType { type_tag: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Backend request failed: {0}")]
    Backend(String),
}
