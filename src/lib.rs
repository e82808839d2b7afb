use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdminError>;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(#[from] api::ApiError),

    #[error("Upload error: {0}")]
    Upload(#[from] ingest::UploadError),

    #[error("Mapping validation error: {0}")]
    MappingValidation(String),

    #[error("Import failed: {0}")]
    ImportFatal(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod api;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod import;
pub mod ingest;
pub mod mapping;
pub mod values;
