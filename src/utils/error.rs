// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // e.g., 404 Not Found, 403 Forbidden

    #[error("Table serialization failed: {0}")]
    Serialize(String),

    #[cfg(feature = "headless")]
    #[error("Headless render failed: {0}")]
    Render(String),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[cfg(feature = "headless")]
    #[error("Fetch task aborted: {0}")]
    Join(String),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Inference request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Inference service returned HTTP {status}: {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Inference service refused the request: {0}")]
    Refusal(String),

    #[error("Inference service returned no content")]
    EmptyResponse,

    #[error("Response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Response does not match the record schema: {0}")]
    SchemaViolation(String),

    #[error("Response has an empty bankRootDomain")]
    MissingDomain,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Page retrieval failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
